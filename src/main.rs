// src/main.rs

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod orchestrator;
mod request;
mod steps;
mod sys;

use crate::config::ProvisionerConfig;
use crate::orchestrator::{Capabilities, Orchestrator, ProvisionOutcome};
use crate::request::RequestArgs;

/// Turns a bare Debian/Ubuntu host into an nginx-masqueraded Hysteria 2 endpoint.
///
/// Missing domain or email are asked for interactively; a missing password is generated.
#[derive(Parser, Debug)]
#[command(name = "hy2-provision")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Domain whose A record points at this host
    #[arg(short, long)]
    domain: Option<String>,

    /// Contact email for the Let's Encrypt account
    #[arg(short, long)]
    email: Option<String>,

    /// Tunnel password (generated when omitted)
    #[arg(short, long)]
    password: Option<String>,

    /// Leave ufw untouched
    #[arg(long = "no-ufw")]
    no_ufw: bool,

    /// Skip UDP buffer tuning via sysctl
    #[arg(long = "no-sysctl")]
    no_sysctl: bool,
}

impl From<Cli> for RequestArgs {
    fn from(cli: Cli) -> Self {
        Self {
            domain: cli.domain,
            email: cli.email,
            password: cli.password,
            skip_firewall: cli.no_ufw,
            skip_sysctl_tuning: cli.no_sysctl,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Unknown flags and --help exit here, before any logging or host access.
    let cli = Cli::parse();

    // ==============================================================================
    // 1. Configuration & Logging
    // ==============================================================================
    init_tracing();

    let config = match ProvisionerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("✗ Configuration failed: {}", e).red().bold());
            return ExitCode::FAILURE;
        }
    };

    // ==============================================================================
    // 2. Provisioning Run
    // ==============================================================================
    let orchestrator = Orchestrator::new(config, Capabilities::linux());

    match orchestrator.run(cli.into()).await {
        Ok(outcome) => {
            tracing::debug!(stages = ?outcome.history, "Run finished");
            print_summary(&outcome);
            ExitCode::SUCCESS
        }
        Err(aborted) => {
            tracing::debug!(reached = %aborted.reached, "Run aborted");
            eprintln!("{}", format!("✗ {}", aborted).red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("HY2P_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_summary(outcome: &ProvisionOutcome) {
    let report = &outcome.report;

    println!();
    println!("{}", "Provisioning complete".green().bold());
    println!("  Domain:   {}", outcome.request.domain);
    println!("  Web root: {}", outcome.site.webroot.display());
    println!("  Vhost:    {}", outcome.site.vhost_path.display());
    if let Some(backup) = &outcome.site.backup_path {
        println!("  Previous vhost saved to {}", backup.display());
    }
    for service in &report.services {
        let state = if service.active {
            "active".green()
        } else {
            "inactive".red()
        };
        println!("  {:<24} {}", service.name, state);
    }
    if !report.all_active() {
        println!(
            "{}",
            "  Some services are not running; check `journalctl -u <service>`.".yellow()
        );
    }

    println!();
    println!("{}", "Client configuration:".bold());
    print!("{}", report.client_config);
    println!();
    println!("{} {}", "Share link:".bold(), report.share_uri);
}
