//! Demo for observable containers.
//!
//! Usage:
//!   cargo run --bin observable-demo -- --key some
//!
//! Registers a global observer and a key observer on an empty record,
//! performs a few writes and deletes, and logs every delivered change.

use clap::Parser;
use log::{error, info};
use observable_proxy::{
    ChangeKind, ObservableConfig, Observable, Result, SnapshotPolicy, observe,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "observable-demo", about = "Log changes of an observable record")]
struct Args {
    /// Key watched by the key observer.
    #[arg(long, default_value = "some")]
    key: String,

    /// When listeners are checked: `schedule` or `delivery`.
    #[arg(long, env = "OBSERVABLE_SNAPSHOT_POLICY", value_parser = SnapshotPolicy::parse_strict)]
    policy: Option<SnapshotPolicy>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_logger();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = ObservableConfig::from_env();
    if let Some(policy) = args.policy {
        config.snapshot_policy = policy;
    }
    info!("Snapshot policy: {}", config.snapshot_policy);

    let observable = Observable::with_config(json!({}), config)?;

    // Observe all key changes
    let dispose_global = observe(&observable, None, |key, new_value, old_value| {
        info!(
            "All key observer, key '{}' {} from {:?} to {:?}",
            key,
            ChangeKind::classify(new_value, old_value),
            old_value,
            new_value
        );
    })?;

    // Observe changes of a single key
    let watched = args.key.clone();
    let dispose_some = observe(
        &observable,
        Some(args.key.clone().into()),
        move |_, new_value, old_value| {
            info!(
                "'{}' key observer, value changed from {:?} to {:?}",
                watched, old_value, new_value
            );
        },
    )?;

    observable.set(args.key.as_str(), 1)?;
    observable.set("other", "x")?;
    observable.set(args.key.as_str(), 1)?; // unchanged, not reported
    observable.set(args.key.as_str(), 2)?;
    observable.delete("other")?;
    observable.delete("missing")?; // absent, not reported
    observable.flush().await;

    // Only the key observer remains
    dispose_global.unsubscribe();
    observable.delete(args.key.as_str())?;
    observable.flush().await;

    dispose_some.unsubscribe();
    observable.set(args.key.as_str(), 3)?;
    observable.flush().await;

    info!("Final state: {}", observable.to_value());
    Ok(())
}
