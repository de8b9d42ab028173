use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ticket_watch::{
    config::Config,
    context::AppContext,
    database::{Database, repositories::StationSeaOrmRepository},
    models::Station,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "ticket-watch")]
#[command(version)]
#[command(about = "Polls 12306 for ticket availability and mails a digest when seats appear")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler and the HTTP API (default)
    Serve,
    /// Add or rename a station in the lookup table
    AddStation {
        /// Display name, e.g. 北京
        name: String,
        /// Telecode, e.g. BJP
        code: String,
    },
    /// Print every registered watch job
    ListJobs,
    /// Stop watching: remove a job by id
    RemoveJob { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("ticket_watch={},tower_http=trace", cli.log_level)
    } else {
        format!("ticket_watch={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, database).await,
        Command::AddStation { name, code } => {
            let repo = StationSeaOrmRepository::new(database.connection());
            repo.upsert(&Station::new(name.trim(), code.trim().to_uppercase()))
                .await?;
            println!("{} -> {}", name.trim(), code.trim().to_uppercase());
            Ok(())
        }
        Command::ListJobs => {
            let context = AppContext::from_database(config, database)?;
            for job in context.jobs.list().await? {
                println!(
                    "{}  {}  {} -> {}  next {}  to {}",
                    job.id,
                    job.date_param(),
                    job.from_code,
                    job.to_code,
                    job.next_run_time.format("%Y-%m-%d %H:%M:%S UTC"),
                    job.recipients.join(",")
                );
            }
            Ok(())
        }
        Command::RemoveJob { id } => {
            let context = AppContext::from_database(config, database)?;
            context.jobs.remove(id).await?;
            println!("removed {id}");
            Ok(())
        }
    }
}

async fn serve(config: Config, database: Database) -> Result<()> {
    info!("Starting ticket-watch v{}", env!("CARGO_PKG_VERSION"));

    let web_config = config.web.clone();
    let context = AppContext::from_database(config, database)?;
    let cancellation_token = CancellationToken::new();

    let scheduler = context.scheduler.clone();
    let scheduler_token = cancellation_token.clone();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(scheduler_token).await {
            error!("Job scheduler error: {}", e);
        }
    });

    let server = WebServer::new(&web_config, &context)?;
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let server_token = cancellation_token.clone();
    let server_handle =
        tokio::spawn(async move { server.serve_with_cancellation(ready_tx, server_token).await });

    match ready_rx.await {
        Ok(Ok(())) => info!("Ready: http://{}:{}", web_config.host, web_config.port),
        Ok(Err(e)) => {
            cancellation_token.cancel();
            let _ = scheduler_handle.await;
            return Err(e);
        }
        Err(_) => {
            cancellation_token.cancel();
            let _ = scheduler_handle.await;
            anyhow::bail!("Web server exited before it was ready");
        }
    }

    shutdown_signal().await;
    info!("Shutdown requested");
    cancellation_token.cancel();

    if let Ok(Err(e)) = server_handle.await {
        error!("Web server error: {}", e);
    }
    let _ = scheduler_handle.await;
    info!("ticket-watch stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully");
    }
}
