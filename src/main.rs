use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;

use tokio::runtime::Builder;
use tracing::{debug, info};

use clerk_guard::cli::{Cli, Commands, ObserverKind};
use clerk_guard::client::ClerkClient;
use clerk_guard::config::ClientOptions;
use clerk_guard::http::HttpBackend;
use clerk_guard::observer::{ConsoleObserver, NullObserver, Observer, TracingObserver};
use clerk_guard::retry::RetryableStatuses;

fn main() -> Result<()> {
    // Calls spend nearly all their time waiting on the network or in backoff,
    // so a few more workers than cores, capped at 16.
    let num_cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let worker_threads = std::cmp::min(num_cpus + 2, 16);

    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let options = ClientOptions::from_env()
        .context("Failed to read client options")?
        .with_timeout_ms(cli.timeout_ms);
    debug!("Using {:?}", options);

    let observer: Arc<dyn Observer> = match cli.observer {
        ObserverKind::None => Arc::new(NullObserver),
        ObserverKind::Console => Arc::new(ConsoleObserver),
        ObserverKind::Tracing => Arc::new(TracingObserver),
    };

    let clerk = ClerkClient::with_backend(
        Arc::new(HttpBackend::new(&options)?),
        observer,
        cli.retry_policy(),
        RetryableStatuses::default(),
    );

    match &cli.command {
        Commands::GetUser { user_id } => {
            let user = clerk.users.get_user(user_id).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::GetOrganization { organization_id } => {
            let organization = clerk
                .organizations
                .get_organization(clerk_guard::types::GetOrganizationParams {
                    organization_id: organization_id.clone(),
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&organization)?);
        }
        Commands::Probe {
            user_id,
            rounds,
            concurrency,
        } => {
            for round in 0..*rounds {
                info!("Probe round {}/{}", round + 1, rounds);

                let calls = (0..*concurrency).map(|_| clerk.users.get_user(user_id));
                for outcome in join_all(calls).await {
                    match outcome {
                        Ok(user) => println!("{}", serde_json::to_string(&user)?),
                        Err(err) => eprintln!("{}", err),
                    }
                }
            }
        }
    }

    Ok(())
}
