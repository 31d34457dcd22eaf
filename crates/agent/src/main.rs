//! `examhall-agent` -- exam-room device daemon.
//!
//! Runs on each recognition device, sends heartbeats to the admin backend,
//! polls for queued tasks and downloads scheduled exam files.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default       | Description                         |
//! |------------------------|----------|---------------|-------------------------------------|
//! | `BACKEND_URL`          | yes      | --            | Backend origin, e.g. `http://host:3000` |
//! | `DEVICE_IP`            | yes      | --            | IP this device is registered under  |
//! | `POLL_INTERVAL_SECS`   | no       | `30`          | Seconds between poll cycles         |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`          | Per-request timeout                 |
//! | `DOWNLOAD_DIR`         | no       | `./downloads` | Where exam files are written        |

use examhall_agent::client::BackendClient;
use examhall_agent::config::AgentConfig;
use examhall_agent::worker::Worker;
use tokio_util::sync::CancellationToken;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "examhall_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid agent configuration");
        std::process::exit(1);
    });

    tracing::info!(
        backend_url = %config.backend_url,
        device_ip = %config.device_ip,
        download_dir = %config.download_dir.display(),
        "Starting examhall-agent",
    );

    let client = BackendClient::new(&config.backend_url, &config.device_ip, config.request_timeout)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received SIGINT (Ctrl-C), stopping");
                on_signal.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl-C handler"),
        }
    });

    Worker::new(client, config.download_dir)
        .run(config.poll_interval, cancel)
        .await;
}
