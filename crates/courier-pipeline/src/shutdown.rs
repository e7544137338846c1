// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven cancellation of a run.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// arrives. The handler task stops once the token is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let task_token = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            received = wait_for_signal() => {
                if received {
                    task_token.cancel();
                }
            }
            _ = task_token.cancelled() => {}
        }
        debug!("signal handler finished");
    });

    token
}

/// Resolves to `true` once a shutdown signal is received, or `false` when no
/// handler could be installed.
async fn wait_for_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => ctrl_c_received(result),
                    _ = sigterm.recv() => {
                        info!("received SIGTERM, cancelling run");
                        true
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c_received(tokio::signal::ctrl_c().await)
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c_received(tokio::signal::ctrl_c().await)
    }
}

fn ctrl_c_received(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!("received SIGINT (Ctrl+C), cancelling run");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            false
        }
    }
}
