// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use abctl::credentials::{self, CredentialsArgs};
use abctl::docker::DockerCli;
use abctl::local_errors::LocalError;
use abctl::provider::Provider;
use abctl::reporter::ConsoleReporter;
use abctl::status;
use abctl::telemetry::NoopClient;
use abctl::update;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info};

/// Version stamped at release time; local builds report "dev".
const VERSION: &str = match option_env!("ABCTL_VERSION") {
    Some(version) => version,
    None => "dev",
};

#[derive(Parser, Debug)]
#[command(name = "abctl", version = VERSION, about = "Airbyte's command line tool")]
struct Cli {
    /// Opt out of telemetry data collection
    #[arg(long, global = true)]
    dnt: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the local Airbyte installation
    #[command(subcommand)]
    Local(LocalCommands),

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
enum LocalCommands {
    /// Display, and optionally update, the authentication credentials
    Credentials(CredentialsArgs),

    /// Check the status of the local installation
    Status,
}

#[tokio::main]
async fn main() {
    // Respects RUST_LOG if set, otherwise defaults to INFO level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    if cli.dnt {
        info!("telemetry disabled (--dnt)");
    }

    // Check for a newer release in the background. The short timeout keeps a
    // slow GitHub from ever delaying the command itself.
    let update_check = tokio::spawn(async {
        let client = reqwest::Client::new();
        tokio::time::timeout(Duration::from_secs(2), update::check(&client, VERSION)).await
    });

    // Flows must abort promptly on ctrl-c rather than hang on in-flight
    // network calls.
    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted")),
    };

    match update_check.await {
        Ok(Ok(Ok(Some(version)))) => {
            println!();
            println!("A new release of abctl is available: {VERSION} -> {version}");
            println!("Updating to the latest version is highly recommended");
        }
        Ok(Ok(Err(update::UpdateError::DevVersion))) => {
            debug!("release checking is disabled for dev builds");
        }
        _ => {}
    }

    if let Err(err) = result {
        eprintln!("{err:#}");
        if let Some(local) = LocalError::classify(&err) {
            eprintln!();
            eprintln!("{}", local.help());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Local(local) => {
            let provider = Provider::kind();
            let probe = DockerCli;
            let telemetry = NoopClient;
            let reporter = ConsoleReporter;
            match local {
                LocalCommands::Credentials(args) => {
                    credentials::run(&args, &provider, &probe, &telemetry, &reporter).await
                }
                LocalCommands::Status => {
                    status::run(&provider, &probe, &telemetry, &reporter).await
                }
            }
        }
        Commands::Version => {
            println!("abctl version {VERSION}");
            Ok(())
        }
    }
}
