// tests/ingest_pipeline.rs
// End-to-end pipeline behaviour over mock providers (no network).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use job_aggregator::ingest::error::SourceError;
use job_aggregator::ingest::normalize::{BatchCollector, RawJob};
use job_aggregator::ingest::types::SourceBatch;
use job_aggregator::ingest::{self, Aggregator};
use job_aggregator::{CanonicalJob, Category, SourceConfig, SourceOutcome, SourceProvider};

fn cfg() -> SourceConfig {
    SourceConfig::new("https://mock.invalid", Duration::from_millis(500))
}

fn at(minute: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap())
}

fn raw(id: &str, title: &str, company: &str, published: Option<DateTime<Utc>>) -> RawJob {
    RawJob {
        native_id: Some(id.to_string()),
        title: Some(title.to_string()),
        company: Some(company.to_string()),
        location: None,
        url: Some(format!("https://jobs.example.com/{id}")),
        description: None,
        published,
    }
}

/// Returns the same raw entries on every call, normalized like a real adapter.
struct StaticProvider {
    name: &'static str,
    config: SourceConfig,
    entries: Vec<RawJob>,
    delay: Option<Duration>,
}

impl StaticProvider {
    fn new(name: &'static str, entries: Vec<RawJob>) -> Self {
        Self {
            name,
            config: cfg(),
            entries,
            delay: None,
        }
    }
}

#[async_trait]
impl SourceProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }
    fn config(&self) -> &SourceConfig {
        &self.config
    }
    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let mut c = BatchCollector::new(self.name, fetched_at);
        for e in &self.entries {
            c.push(e.clone());
        }
        Ok(c.finish())
    }
}

struct FailingProvider {
    config: SourceConfig,
}

#[async_trait]
impl SourceProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "Broken"
    }
    fn config(&self) -> &SourceConfig {
        &self.config
    }
    async fn fetch_latest(&self, _fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        Err(SourceError::Status(503))
    }
}

struct PanickingProvider {
    config: SourceConfig,
}

#[async_trait]
impl SourceProvider for PanickingProvider {
    fn name(&self) -> &'static str {
        "Panicky"
    }
    fn config(&self) -> &SourceConfig {
        &self.config
    }
    async fn fetch_latest(&self, _fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        panic!("upstream shape changed");
    }
}

/// Burns wall time in a synchronous step, like decoding a huge body.
struct BlockingProvider {
    name: &'static str,
    config: SourceConfig,
    block: Duration,
}

#[async_trait]
impl SourceProvider for BlockingProvider {
    fn name(&self) -> &'static str {
        self.name
    }
    fn config(&self) -> &SourceConfig {
        &self.config
    }
    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        std::thread::sleep(self.block);
        let mut c = BatchCollector::new(self.name, fetched_at);
        c.push(raw(self.name, &format!("{} Engineer", self.name), "Acme", at(1)));
        Ok(c.finish())
    }
}

fn healthy() -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(StaticProvider::new(
            "Remotive",
            vec![
                raw("1", "Backend Engineer", "Acme", at(10)),
                raw("2", "Data Science Intern", "Globex", at(20)),
            ],
        )),
        Arc::new(StaticProvider::new(
            "Adzuna",
            vec![
                raw("a", "backend engineer", "ACME", at(5)),
                raw("b", "Senior Backend Engineer", "Acme", at(30)),
            ],
        )),
    ]
}

fn outcome_of<'a>(res: &'a job_aggregator::AggregationResult, source: &str) -> &'a SourceOutcome {
    &res
        .outcomes
        .iter()
        .find(|r| r.source == source)
        .unwrap_or_else(|| panic!("no outcome for {source}"))
        .outcome
}

#[tokio::test]
async fn two_runs_are_identical() {
    let agg = Aggregator::new(healthy(), 50);
    let a = agg.run_once().await;
    let b = agg.run_once().await;
    assert_eq!(
        serde_json::to_string(&a.jobs).unwrap(),
        serde_json::to_string(&b.jobs).unwrap()
    );
}

#[tokio::test]
async fn registration_order_does_not_change_output() {
    let mut reversed = healthy();
    reversed.reverse();
    let a = ingest::run_once(&healthy(), 50).await;
    let b = ingest::run_once(&reversed, 50).await;
    assert_eq!(a.jobs, b.jobs);
    assert_eq!(
        a.outcomes.iter().map(|r| r.source.as_str()).collect::<Vec<_>>(),
        vec!["Adzuna", "Remotive"]
    );
}

#[tokio::test]
async fn case_only_duplicates_collapse_and_distinct_titles_survive() {
    let res = Aggregator::new(healthy(), 50).run_once().await;
    let titles: Vec<_> = res.jobs.iter().map(|j| j.title.to_lowercase()).collect();
    assert_eq!(
        titles.iter().filter(|t| *t == "backend engineer").count(),
        1
    );
    assert!(titles.contains(&"senior backend engineer".to_string()));
    assert_eq!(res.jobs.len(), 3);

    // Both copies say "Remote"; the first in source-name order (Adzuna) is kept.
    let kept = res
        .jobs
        .iter()
        .find(|j| j.title.eq_ignore_ascii_case("backend engineer"))
        .unwrap();
    assert_eq!(kept.id, "Adzuna:a");
}

#[tokio::test]
async fn intern_precedence_and_sorting() {
    let res = Aggregator::new(healthy(), 50).run_once().await;
    let ids: Vec<_> = res.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["Adzuna:b", "Remotive:2", "Adzuna:a"]);

    let intern = res.jobs.iter().find(|j| j.id == "Remotive:2").unwrap();
    assert_eq!(intern.category, Category::Internship);
    assert_eq!(res.jobs[0].category, Category::SoftwareEngineering);
}

#[tokio::test]
async fn failing_source_does_not_disturb_others() {
    let baseline = ingest::run_once(&healthy(), 50).await;

    let mut providers = healthy();
    providers.push(Arc::new(FailingProvider { config: cfg() }));
    providers.push(Arc::new(PanickingProvider { config: cfg() }));
    let res = ingest::run_once(&providers, 50).await;

    assert_eq!(res.jobs, baseline.jobs);
    assert_eq!(
        outcome_of(&res, "Broken"),
        &SourceOutcome::Failed {
            reason: "upstream returned HTTP 503".into()
        }
    );
    assert!(matches!(outcome_of(&res, "Panicky"), SourceOutcome::Failed { .. }));
    assert_eq!(
        outcome_of(&res, "Remotive"),
        &SourceOutcome::Succeeded {
            count: 2,
            dropped: 0
        }
    );
}

#[tokio::test]
async fn slow_source_times_out_without_blocking_the_rest() {
    let mut slow = StaticProvider::new("Slow", vec![raw("s", "Slow Job", "Snail", at(59))]);
    slow.config.timeout = Duration::from_millis(50);
    slow.delay = Some(Duration::from_secs(5));

    let mut providers = healthy();
    providers.push(Arc::new(slow));

    let started = std::time::Instant::now();
    let res = ingest::run_once(&providers, 50).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(res.jobs.len(), 3);
    match outcome_of(&res, "Slow") {
        SourceOutcome::Failed { reason } => assert!(reason.contains("timed out"), "{reason}"),
        other => panic!("expected timeout failure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_but_in_budget_source_is_waited_for() {
    let mut slow = StaticProvider::new("Slow", vec![raw("s", "Slow Job", "Snail", at(59))]);
    slow.delay = Some(Duration::from_millis(100));

    let mut providers = healthy();
    providers.push(Arc::new(slow));
    let res = ingest::run_once(&providers, 50).await;

    assert_eq!(res.jobs[0].id, "Slow:s");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn synchronous_work_in_one_source_does_not_stall_another() {
    let blocking = |name: &'static str| -> Arc<dyn SourceProvider> {
        Arc::new(BlockingProvider {
            name,
            config: SourceConfig::new("https://mock.invalid", Duration::from_secs(5)),
            block: Duration::from_millis(400),
        })
    };
    let providers = vec![blocking("Heavy"), blocking("Bulky")];

    let started = std::time::Instant::now();
    let res = ingest::run_once(&providers, 50).await;
    let elapsed = started.elapsed();

    assert_eq!(res.jobs.len(), 2);
    // Run back to back they would need at least 800ms.
    assert!(elapsed < Duration::from_millis(750), "took {elapsed:?}");
    assert!(res
        .outcomes
        .iter()
        .all(|r| matches!(r.outcome, SourceOutcome::Succeeded { count: 1, .. })));
}

#[tokio::test]
async fn record_without_date_gets_fetch_time_and_sorts_first() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(StaticProvider::new(
        "Remotive",
        vec![
            raw("old", "Old Role", "A", at(0)),
            raw("undated", "Undated Role", "B", None),
        ],
    ))];
    let before = Utc::now();
    let res = ingest::run_once(&providers, 50).await;

    assert_eq!(res.jobs[0].id, "Remotive:undated");
    assert!(res.jobs[0].published >= before);
    assert_eq!(res.jobs[1].id, "Remotive:old");
}

#[tokio::test]
async fn cap_keeps_the_most_recent() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mk = |name: &'static str, offset: i64| -> Arc<dyn SourceProvider> {
        let entries = (0..100)
            .map(|i| {
                let n = offset + i * 2;
                raw(
                    &n.to_string(),
                    &format!("Role {n}"),
                    "Acme",
                    Some(base + chrono::Duration::minutes(n)),
                )
            })
            .collect();
        Arc::new(StaticProvider::new(name, entries))
    };
    let providers = vec![mk("Adzuna", 0), mk("Remotive", 1)];

    let res = ingest::run_once(&providers, 50).await;
    assert_eq!(res.jobs.len(), 50);

    let newest: Vec<DateTime<Utc>> = (150..200)
        .rev()
        .map(|n| base + chrono::Duration::minutes(n))
        .collect();
    let got: Vec<DateTime<Utc>> = res.jobs.iter().map(|j| j.published).collect();
    assert_eq!(got, newest);
}

#[tokio::test]
async fn everything_disabled_is_empty_not_error() {
    let mut a = StaticProvider::new("Adzuna", vec![raw("1", "Dev", "A", at(1))]);
    a.config = cfg().disable("missing ADZUNA_APP_ID");
    let mut b = StaticProvider::new("TheMuse", vec![raw("2", "Dev", "B", at(2))]);
    b.config = cfg().disable("disabled in settings");

    let res = ingest::run_once(&[Arc::new(a) as Arc<dyn SourceProvider>, Arc::new(b)], 50).await;
    assert!(res.jobs.is_empty());
    assert_eq!(
        outcome_of(&res, "Adzuna"),
        &SourceOutcome::Skipped {
            reason: "missing ADZUNA_APP_ID".into()
        }
    );
    assert_eq!(outcome_of(&res, "TheMuse").to_string(), "skipped");
}

#[tokio::test]
async fn no_providers_at_all() {
    let res = ingest::run_once(&[], 50).await;
    assert!(res.jobs.is_empty());
    assert!(res.outcomes.is_empty());
}

#[tokio::test]
async fn entry_without_url_is_dropped_and_counted() {
    let mut no_url = raw("x", "Ghost", "Nobody", at(3));
    no_url.url = None;
    let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(StaticProvider::new(
        "Remotive",
        vec![no_url, raw("ok", "Rust Developer", "Ferrous", at(4))],
    ))];

    let res = ingest::run_once(&providers, 50).await;
    assert_eq!(res.jobs.len(), 1);
    assert_eq!(res.jobs[0].id, "Remotive:ok");
    assert_eq!(
        outcome_of(&res, "Remotive"),
        &SourceOutcome::Succeeded {
            count: 1,
            dropped: 1
        }
    );
}

#[tokio::test]
async fn keyless_real_sources_are_skipped_not_failed() {
    // Only Remotive and USAJobs need no key; point them at a closed port so the
    // test stays offline. Everything else must report a skip.
    let toml = r#"
source_timeout_secs = 2
[sources.remotive]
base_url = "http://127.0.0.1:9/jobs"
[sources.usajobs]
enabled = false
"#;
    let settings = job_aggregator::AggregatorSettings::parse(toml).unwrap();
    let agg = Aggregator::from_settings(&settings, |_| None);
    let res = agg.run_once().await;

    assert!(res.jobs.is_empty());
    for r in &res.outcomes {
        match r.source.as_str() {
            "Remotive" => assert!(matches!(r.outcome, SourceOutcome::Failed { .. })),
            _ => assert!(
                matches!(r.outcome, SourceOutcome::Skipped { .. }),
                "{} -> {}",
                r.source,
                r.outcome
            ),
        }
    }
}

#[test]
fn categories_are_a_closed_set() {
    let job = |title: &str| CanonicalJob {
        id: "x:1".into(),
        title: title.into(),
        company: "A".into(),
        location: "Remote".into(),
        url: "https://example.com".into(),
        category: Category::Other,
        source: "x".into(),
        published: Utc::now(),
        description: None,
    };
    let (out, _) = ingest::process_batch(
        vec![
            job("Data Science Intern"),
            job("Machine Learning Engineer"),
            job("Data Analyst"),
            job("Backend Developer"),
            job("Chef"),
        ],
        50,
    );
    let mut cats: Vec<_> = out.iter().map(|j| j.category.slug()).collect();
    cats.sort();
    assert_eq!(
        cats,
        vec!["ai-ml", "data-science", "internship", "other", "software-engineering"]
    );
}
