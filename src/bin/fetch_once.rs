//! Runs one aggregation from the command line and prints the jobs as JSON.
//! Per-source outcomes go to stderr.

use job_aggregator::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let (_settings, aggregator) = job_aggregator::bootstrap()?;
    let result = aggregator.run_once().await;

    for r in &result.outcomes {
        eprintln!("{:<10} {} ({} ms)", r.source, r.outcome, r.elapsed_ms);
    }
    eprintln!("{} jobs", result.jobs.len());

    println!("{}", serde_json::to_string_pretty(&result.jobs)?);
    Ok(())
}
