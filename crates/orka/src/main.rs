mod commands;
mod logging;

use clap::{Parser, Subcommand};
use colored::Colorize;
use orka_cloud::DiskTemplate;
use orka_core::ClusterStatus;
use std::process::ExitCode;

/// A provisioning attempt failed; every created resource was removed
pub const EXIT_FAILED: u8 = 1;
/// Resources were left behind and need manual cleanup
pub const EXIT_CLEANUP_INCOMPLETE: u8 = 3;

#[derive(Parser)]
#[command(name = "orka")]
#[command(about = "Create or destroy a Hadoop-YARN cluster in ~okeanos", long_about = None)]
#[command(version)]
struct Cli {
    /// Logging level
    #[arg(long, global = true, value_enum, default_value_t = logging::LogLevel::Summary)]
    logging: logging::LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a Hadoop-YARN cluster on ~okeanos
    Create(CreateArgs),
    /// Destroy a Hadoop-YARN cluster on ~okeanos
    Destroy {
        /// Public IP of the master, full cluster tag or cluster name
        master_ip_or_name: String,
        /// Synnefo authentication token
        token: String,
    },
    /// List user clusters
    List {
        /// Synnefo authentication token
        token: String,
        /// Filter by status (ACTIVE, PENDING, DESTROYED). Clusters are
        /// discovered from live servers, so DESTROYED never matches one
        #[arg(long, value_parser = parse_status)]
        status: Option<ClusterStatus>,
        /// List extra cluster details
        #[arg(long)]
        verbose: bool,
    },
    /// Show the status of one cluster
    Status {
        /// Public IP of the master, full cluster tag or cluster name
        identifier: String,
        /// Synnefo authentication token
        token: String,
    },
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Name of the cluster, prefixed by a timestamp
    pub name: String,
    /// Total number of cluster nodes
    #[arg(value_parser = two_or_bigger)]
    pub cluster_size: u32,
    /// Number of CPU cores for the master node
    #[arg(value_parser = positive)]
    pub cpu_master: u32,
    /// Size of RAM (MB) for the master node
    #[arg(value_parser = positive)]
    pub ram_master: u32,
    /// Disk size (GB) for the master node
    #[arg(value_parser = five_or_bigger)]
    pub disk_master: u32,
    /// Number of CPU cores for the slave node(s)
    #[arg(value_parser = positive)]
    pub cpu_slave: u32,
    /// Size of RAM (MB) for the slave node(s)
    #[arg(value_parser = positive)]
    pub ram_slave: u32,
    /// Disk size (GB) for the slave node(s)
    #[arg(value_parser = five_or_bigger)]
    pub disk_slave: u32,
    /// Disk template (drbd, ext_vlmc)
    pub disk_template: DiskTemplate,
    /// Synnefo authentication token
    pub token: String,
    /// ~okeanos project to request resources from
    pub project_name: String,
    /// OS image for the cluster (default from config, "Debian Base")
    #[arg(long)]
    pub image: Option<String>,
    /// Use a pre-built Hadoop image (overrides --image)
    #[arg(long, value_name = "HADOOP_IMAGE_NAME", num_args = 0..=1)]
    pub use_hadoop_image: Option<Option<String>>,
    /// Synnefo authentication URL
    #[arg(long, env = "ORKA_AUTH_URL")]
    pub auth_url: Option<String>,
}

fn parse_u32(val: &str) -> Result<u32, String> {
    val.trim()
        .parse::<u32>()
        .map_err(|_| format!("{} is not a valid number", val))
}

fn positive(val: &str) -> Result<u32, String> {
    match parse_u32(val)? {
        0 => Err(format!("{} must be a positive number", val)),
        n => Ok(n),
    }
}

fn two_or_bigger(val: &str) -> Result<u32, String> {
    match parse_u32(val)? {
        n if n < 2 => Err(format!("{} must be at least 2", val)),
        n => Ok(n),
    }
}

fn five_or_bigger(val: &str) -> Result<u32, String> {
    match parse_u32(val)? {
        n if n < 5 => Err(format!("{} must be at least 5", val)),
        n => Ok(n),
    }
}

fn parse_status(val: &str) -> Result<ClusterStatus, String> {
    val.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.logging) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Create(args) => commands::create::handle(args).await,
        Commands::Destroy {
            master_ip_or_name,
            token,
        } => commands::destroy::handle(&master_ip_or_name, &token).await,
        Commands::List {
            token,
            status,
            verbose,
        } => commands::list::handle(&token, status, verbose).await,
        Commands::Status { identifier, token } => {
            commands::status::handle(&identifier, &token).await
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}
