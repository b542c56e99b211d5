use super::{load_config, orchestrator};
use anyhow::Result;
use colored::Colorize;
use orka_cloud::AuthToken;
use orka_core::{ClusterIdentifier, NormalizedStatus};
use std::process::ExitCode;

pub async fn handle(identifier: &str, token: &str) -> Result<ExitCode> {
    let identifier: ClusterIdentifier = identifier.parse()?;
    let token = AuthToken::new(token);

    let orchestrator = orchestrator(load_config()?)?;
    let status = orchestrator.status(&identifier, &token).await?;

    let label = status.to_string();
    let label = match status {
        NormalizedStatus::Active => label.green(),
        NormalizedStatus::Pending => label.yellow(),
        NormalizedStatus::Destroyed => label.red(),
        NormalizedStatus::Unknown => label.dimmed(),
    };
    println!("{}: {}", identifier.to_string().cyan(), label.bold());
    Ok(ExitCode::SUCCESS)
}
