//! Signal-driven graceful exit.
//!
//! SIGTERM and SIGQUIT trigger [`GracefulExit::exit`]; SIGHUP is logged and
//! otherwise ignored.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use weir_core::PoolSet;

/// Stops new work and drains background tasks once.
#[derive(Debug, Clone)]
pub struct GracefulExit {
    pools: Arc<PoolSet>,
    token: CancellationToken,
}

impl GracefulExit {
    /// Create an exit hook covering `pools`.
    pub fn new(pools: Arc<PoolSet>) -> Self {
        Self {
            pools,
            token: CancellationToken::new(),
        }
    }

    /// A token cancelled when the process starts exiting.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancel every warm-up ramp and release [`GracefulExit::wait`].
    ///
    /// Later calls are no-ops.
    pub fn exit(&self) {
        if self.token.is_cancelled() {
            return;
        }
        let stopped = self.pools.shutdown();
        info!(stopped_ramps = stopped, "graceful exit");
        self.token.cancel();
    }

    /// Resolve once [`GracefulExit::exit`] has run.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Listen for process signals and route them to `exit`.
#[cfg(unix)]
pub fn spawn_signal_listener(exit: GracefulExit) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = terminate.recv() => {
                    info!("exit on signal: SIGTERM");
                    exit.exit();
                }
                Some(()) = quit.recv() => {
                    info!("exit on signal: SIGQUIT");
                    exit.exit();
                }
                Some(()) = hangup.recv() => {
                    info!("get signal: SIGHUP");
                }
                else => return,
            }
        }
    }))
}

/// Listen for Ctrl-C and route it to `exit`.
#[cfg(not(unix))]
pub fn spawn_signal_listener(exit: GracefulExit) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("exit on signal: ctrl-c");
            exit.exit();
        }
    }))
}
