//! `mirror` subcommand.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use wsdom_client_mirror::{CaptureOptions, MirrorClient, MirrorUpdate};
use wsdom_config::Config;

/// Mirror the session at `url`, printing the body as it changes.
pub(crate) async fn mirror(url: &str, config: &Config, print_every_batch: bool) -> Result<()> {
    let options = CaptureOptions {
        captured: config.events.captured.clone(),
        debounced: config.events.debounced.clone(),
        debounce: Duration::from_millis(config.events.debounce_ms),
    };
    let (client, mut updates) = MirrorClient::connect(url, options)
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;
    info!("Mirroring {}", url);

    let mut last_body = None;
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(MirrorUpdate::Applied { applied, total }) => {
                    if applied < total {
                        warn!("Skipped {} of {} mutations", total - applied, total);
                    }
                    let body = client.body_html();
                    if print_every_batch || last_body.as_ref() != Some(&body) {
                        println!("{}", body);
                    }
                    last_body = Some(body);
                }
                Some(MirrorUpdate::Error { error, error_info }) => {
                    warn!("Server error: {} ({})", error, error_info);
                }
                Some(MirrorUpdate::Log { .. } | MirrorUpdate::Ignored) => {}
                None => {
                    info!("Server closed the connection");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
