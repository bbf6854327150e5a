use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use batch_admin::api::ApiClient;
use batch_admin::config;
use batch_admin::store::BatchStore;
use batch_admin::table::BatchTable;

#[derive(Parser, Debug)]
#[command(about = "Fetch the batch list once, validate it and print it")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let client = ApiClient::new(cfg.endpoints()?, cfg.api_timeout())?;

    let mut store = BatchStore::new();
    store.refresh(&client).await?;

    let table = BatchTable::new(store.entries(), false);
    println!("Collection: {}", client.endpoints().collection);
    println!("Batches: {}", table.rows().len());
    for row in table.rows() {
        println!(
            "  [{}] {} | {} | {} | {} | next: {}",
            row.key,
            row.job_name,
            row.cron_expression,
            row.target_url,
            row.badge.label(),
            row.next_run.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
