//! Keepalive ping timer.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::controller::ConnectionController;

/// `interval_at` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic ping task. Aborted when stopped or dropped.
#[derive(Debug)]
pub struct KeepaliveTimer {
    handle: JoinHandle<()>,
}

impl KeepaliveTimer {
    /// Start pinging through `controller` every `period`, first ping one
    /// full period from now.
    pub fn start(controller: Weak<ConnectionController>, period: Duration) -> Self {
        Self {
            handle: tokio::spawn(run_keepalive(controller, period)),
        }
    }

    /// Whether the ping loop is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop pinging.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for KeepaliveTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_keepalive(controller: Weak<ConnectionController>, period: Duration) {
    let period = period.max(MIN_PERIOD);
    let mut interval = time::interval_at(Instant::now() + period, period);

    loop {
        interval.tick().await;

        let Some(controller) = controller.upgrade() else {
            break;
        };

        if !controller.send_ping() {
            tracing::debug!("Keepalive ping not sent, stopping keepalive loop");
            break;
        }
    }
}
