use super::{load_config, orchestrator};
use crate::{CreateArgs, EXIT_CLEANUP_INCOMPLETE, EXIT_FAILED};
use anyhow::Result;
use colored::Colorize;
use orka_cloud::AuthToken;
use orka_core::{ClusterSpec, ImageRef, NodeResources, ProvisionError, ProvisionFailure};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

pub async fn handle(args: CreateArgs) -> Result<ExitCode> {
    let mut config = load_config()?;
    if let Some(url) = args.auth_url.clone() {
        config.auth_url = url;
    }

    let hadoop_image = args
        .use_hadoop_image
        .as_ref()
        .map(|name| name.clone().unwrap_or_else(|| config.hadoop_image.clone()));
    let image = ImageRef::resolve(
        args.image.as_deref(),
        hadoop_image.as_deref(),
        &config.default_image,
    );

    let spec = ClusterSpec::new(
        args.name,
        args.cluster_size,
        NodeResources::new(args.cpu_master, args.ram_master, args.disk_master),
        NodeResources::new(args.cpu_slave, args.ram_slave, args.disk_slave),
        args.disk_template,
        image,
        args.project_name,
    )?;
    let token = AuthToken::new(args.token);

    println!(
        "{} {} ({} nodes, image '{}')",
        "Creating cluster".green().bold(),
        spec.cluster_name().cyan(),
        spec.cluster_size(),
        spec.image().name
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, removing resources created so far");
            on_signal.cancel();
        }
    });

    let orchestrator = orchestrator(config)?;
    match orchestrator.provision_with_cancel(&spec, &token, &cancel).await {
        Ok(cluster) => {
            println!();
            println!("{}", "Hadoop cluster is up and running".green().bold());
            for (key, value) in cluster.record.rows(true) {
                println!("  {}: {}", key.bold(), value);
            }
            println!();
            println!("  {} ssh root@{}", "Connect with:".dimmed(), cluster.master_ip);
            Ok(ExitCode::SUCCESS)
        }
        Err(ProvisionError::Failed(failure)) => Ok(report_failure(&failure)),
        Err(e) => Err(e.into()),
    }
}

fn report_failure(failure: &ProvisionFailure) -> ExitCode {
    eprintln!("{} {}", "Error:".red().bold(), failure);

    let compensation = &failure.compensation;
    for resource in &compensation.deleted {
        eprintln!("  {} {}", "removed".dimmed(), resource.label());
    }
    if failure.fully_cleaned() {
        return ExitCode::from(EXIT_FAILED);
    }

    eprintln!();
    eprintln!("{}", "The following resources need manual cleanup:".yellow().bold());
    for straggler in &compensation.failed {
        eprintln!("  {} {}", straggler.resource.label().yellow(), straggler.error);
    }
    ExitCode::from(EXIT_CLEANUP_INCOMPLETE)
}
