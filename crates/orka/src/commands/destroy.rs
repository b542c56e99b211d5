use super::{load_config, orchestrator};
use crate::EXIT_CLEANUP_INCOMPLETE;
use anyhow::Result;
use colored::Colorize;
use orka_cloud::AuthToken;
use orka_core::ClusterIdentifier;
use std::process::ExitCode;

pub async fn handle(master_ip_or_name: &str, token: &str) -> Result<ExitCode> {
    let identifier: ClusterIdentifier = master_ip_or_name.parse()?;
    let token = AuthToken::new(token);

    println!("{} {}", "Destroying cluster".red().bold(), identifier.to_string().cyan());

    let orchestrator = orchestrator(load_config()?)?;
    let report = orchestrator.teardown(&identifier, &token).await?;

    if report.is_empty() {
        println!("{}", "No resources found for this cluster, nothing to do".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    for resource in &report.deleted {
        println!("  {} {}", "deleted".green(), resource.label());
    }
    for resource in &report.already_absent {
        println!("  {} {}", "already gone".dimmed(), resource.label());
    }

    if report.is_complete() {
        println!();
        println!("{}", "Cluster destroyed".green().bold());
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!();
    eprintln!("{}", "The following resources could not be removed:".yellow().bold());
    for straggler in &report.failed {
        eprintln!("  {} {}", straggler.resource.label().yellow(), straggler.error);
    }
    Ok(ExitCode::from(EXIT_CLEANUP_INCOMPLETE))
}
