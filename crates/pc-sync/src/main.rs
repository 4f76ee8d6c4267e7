use pc_protocol::Session;
use pc_sync::{replay, SyncConfig, SyncError};
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "usage: pc-replay <session.json> [report.json]";

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args_os().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| SyncError::Usage(USAGE.to_string()))?;
    let output = args.next().map(PathBuf::from);

    let text = tokio::fs::read_to_string(&input).await?;
    let session: Session = serde_json::from_str(&text)?;
    info!(
        path = %input.display(),
        points = session.points.len(),
        boxes = session.boxes.len(),
        steps = session.steps.len(),
        "replaying session"
    );

    let report = replay(session, SyncConfig::default()).await?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
