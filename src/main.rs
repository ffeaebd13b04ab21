use std::process::ExitCode;

use tracing::{error, info};

use queue_httpd::config::{Config, ConfigError};
use queue_httpd::server::Server;
use queue_httpd::{logging, VERSION};

fn main() -> ExitCode {
    let config = match Config::from_env().and_then(|c| c.with_args(std::env::args().skip(1))) {
        Ok(config) => config,
        Err(ConfigError::Usage(usage)) => {
            eprintln!("{}", usage);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.logging);
    info!(version = VERSION, "starting queue_httpd");
    config.log_summary();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Only the shutdown wait lives here; the acceptor has its own runtime.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::bind(&config.server, &config.pool)?;
    let summary = server.run(termination_request()).await?;

    info!(
        accepted = summary.dispatch.accepted,
        served = summary.pool.served,
        handler_panics = summary.pool.handler_panics,
        "shutdown complete"
    );
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn termination_request() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received Ctrl+C"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
                return;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C"),
        Err(e) => error!(error = %e, "failed to listen for Ctrl+C, shutting down"),
    }
}
