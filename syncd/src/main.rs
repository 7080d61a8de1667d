use clap::Parser;
use libsync::config::Config;
use libsync::registry::{HttpRegistryClient, RegistryApi};
use libsync::status::StatusStore;
use libsync::sync::run_forever;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mod cli;
mod http;
mod version;

use cli::{Cli, Commands, ConfigCommands};

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter(Some(module_path!()), level)
        .filter(Some("libsync"), level)
        .init();
}

fn load_config(path: &str) -> Config {
    match Config::load(Path::new(path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config from '{path}': {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = load_config(&cli.config);
                match serde_json::to_string_pretty(&config) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("failed to render config: {e}"),
                }
            }
        },
        Commands::Serve => serve(&cli).await,
    }
}

async fn serve(cli: &Cli) {
    let config = load_config(&cli.config);
    let status = Arc::new(StatusStore::new());

    let mut replication_tasks = Vec::new();
    for replication in &config.replications {
        let source = build_client(&replication.source.url, replication.source.credentials());
        let target = build_client(&replication.target.url, replication.target.credentials());
        let name = replication.name.clone();
        let filter = replication.filter.clone();
        let interval = Duration::from_secs(replication.interval_seconds);
        let status = status.clone();

        log::info!("scheduling replication '{name}' every {interval:?}");
        replication_tasks.push(tokio::spawn(run_forever(
            name, source, target, filter, interval, status,
        )));
    }

    tokio::time::sleep(Duration::from_secs(cli.delay)).await;

    let server = tokio::spawn(http::serve(status.clone(), cli.dev));

    tokio::select! {
        _ = wait_for_shutdown() => {
            log::info!("shutdown signal received, letting in-flight transfers finish");
        }
        result = server => {
            match result {
                Ok(Err(e)) => log::error!("status server exited: {e}"),
                Err(e) => log::error!("status server task failed: {e}"),
                Ok(Ok(())) => {}
            }
        }
    }

    for task in replication_tasks {
        task.abort();
    }
}

fn build_client(url: &str, credentials: libsync::Credentials) -> Arc<dyn RegistryApi> {
    match HttpRegistryClient::new(url, Some(credentials)) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("invalid registry endpoint '{url}': {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
