use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::sync::{watch, Mutex};

use crate::{
    command::Command,
    queue::{CommandReceiver, Dequeued},
    strip::SharedStrip,
};

/// How long the worker waits on an empty queue before checking the stop
/// flag again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The only task allowed to touch the strip. Pulls one command at a time off
/// the queue and applies it under the strip lock.
pub struct Worker {
    queue: Arc<Mutex<CommandReceiver>>,
    strip: SharedStrip,
    stop: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(
        queue: Arc<Mutex<CommandReceiver>>,
        strip: SharedStrip,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self { queue, strip, stop }
    }

    /// Run until the stop flag is raised or the queue closes. Anything still
    /// queued at that point is left unprocessed.
    pub async fn run(self) {
        // Held for the lifetime of the loop so a second worker can never
        // consume from the same queue.
        let mut queue = self.queue.lock().await;
        info!("LED command worker started");

        loop {
            if *self.stop.borrow() {
                break;
            }

            match queue.dequeue_with_timeout(POLL_INTERVAL).await {
                Dequeued::Command(command) => self.execute(command).await,
                Dequeued::Empty => continue,
                Dequeued::Closed => {
                    warn!("Command queue closed");
                    break;
                }
            }
        }

        info!("LED command worker stopped");
    }

    async fn execute(&self, command: Command) {
        let mut strip = self.strip.lock().await;
        debug!("Executing {}", command);

        match panic::catch_unwind(AssertUnwindSafe(|| command.apply(&mut strip))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Error executing LED command ({}): {:#}", command, e),
            Err(_) => error!("LED command ({}) panicked", command),
        }
    }
}
