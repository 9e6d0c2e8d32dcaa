use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod corpus;
mod suite;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present; the suites skip
    // backends whose credentials stay unset.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,vector_store=info"))
        .expect("default env filter is valid");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    println!("{}", "vector store check suites".bold());

    let reports = [suite::run_pinecone().await, suite::run_weaviate().await];

    for report in &reports {
        report.print();
    }

    let failed = reports.iter().filter(|r| r.failed()).count();
    let skipped = reports.iter().filter(|r| r.skipped.is_some()).count();
    let passed = reports.len() - failed - skipped;

    println!(
        "\n{} passed, {} failed, {} skipped",
        passed.to_string().green(),
        failed.to_string().red(),
        skipped.to_string().yellow()
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
