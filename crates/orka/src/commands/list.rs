use super::{load_config, orchestrator};
use anyhow::Result;
use colored::Colorize;
use orka_cloud::AuthToken;
use orka_core::{ClusterRecord, ClusterStatus};
use std::process::ExitCode;

pub async fn handle(token: &str, status: Option<ClusterStatus>, verbose: bool) -> Result<ExitCode> {
    if status == Some(ClusterStatus::Destroyed) {
        println!(
            "{}",
            "Destroyed clusters leave no servers behind and cannot be listed".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let token = AuthToken::new(token);
    let orchestrator = orchestrator(load_config()?)?;

    let records: Vec<ClusterRecord> = orchestrator
        .list_clusters(&token)
        .await?
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.cluster_status == s))
        .collect();

    if records.is_empty() {
        println!("{}", "User has no cluster information available".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    for (i, record) in records.iter().enumerate() {
        println!("{}", format!("Cluster {}", i + 1).bold());
        for (key, value) in record.rows(verbose) {
            let value = if key == "cluster_status" {
                colorize_status(record.cluster_status, &value)
            } else {
                value
            };
            println!("{:>5}{}: {}", "", key, value);
        }
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn colorize_status(status: ClusterStatus, value: &str) -> String {
    match status {
        ClusterStatus::Active => value.green().to_string(),
        ClusterStatus::Pending => value.yellow().to_string(),
        ClusterStatus::Destroyed => value.red().to_string(),
    }
}
