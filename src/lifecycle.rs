use std::{
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use anyhow::Error;
use common::{ConfigReport, StatusReport};
use displaydoc::Display;
use log::{debug, error, info, warn};
use tokio::{
    signal,
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::{
    command::Command,
    config::Config,
    device::{self, LedDevice},
    queue::{command_queue, CommandReceiver, CommandSender, QueueError},
    strip::{SharedStrip, Strip},
    worker::Worker,
};

/// Upper bound on how long shutdown waits for the worker to exit.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum LifecycleError {
    /// LED driver has already been shut down
    ShutDown,
}

impl std::error::Error for LifecycleError {}

/// Process-wide context: the strip, the queue feeding it and the worker
/// draining that queue. Built once at startup and shared by reference with
/// the HTTP gateway and the signal handler.
pub struct Driver {
    config: Config,
    sender: CommandSender,
    receiver: Arc<Mutex<CommandReceiver>>,
    strip: SharedStrip,
    stop: watch::Sender<bool>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl Driver {
    pub fn new(config: Config, device: Box<dyn LedDevice>) -> Self {
        let (sender, receiver) = command_queue(config.queue_capacity);
        let strip = Strip::new(config.led_count, config.brightness, device).shared();
        let (stop, _) = watch::channel(false);

        Self {
            config,
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            strip,
            stop,
            worker: StdMutex::new(None),
        }
    }

    /// Build a driver around the device for this platform.
    pub fn open(config: Config) -> Result<Self, Error> {
        let device = device::open(&config)?;
        Ok(Self::new(config, device))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn strip(&self) -> &SharedStrip {
        &self.strip
    }

    /// Spawn the worker. Returns `false` if one is already running.
    pub fn start(&self) -> Result<bool, LifecycleError> {
        if self.is_shut_down() {
            return Err(LifecycleError::ShutDown);
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("LED command worker already running");
            return Ok(false);
        }

        let task = Worker::new(
            self.receiver.clone(),
            self.strip.clone(),
            self.stop.subscribe(),
        );
        *worker = Some(tokio::spawn(task.run()));

        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_shut_down(&self) -> bool {
        *self.stop.borrow()
    }

    /// Queue a command for the worker. Never waits on the hardware.
    pub fn submit(&self, command: Command) -> Result<(), QueueError> {
        if self.is_shut_down() {
            return Err(QueueError::Closed);
        }
        self.sender.enqueue(command)
    }

    pub fn queue_size(&self) -> usize {
        self.sender.len()
    }

    /// Hardware configuration, read under the strip lock.
    pub async fn config_report(&self) -> ConfigReport {
        let strip = self.strip.lock().await;
        ConfigReport {
            success: true,
            led_count: strip.len(),
            brightness: strip.brightness(),
            pin: self.config.pin.to_string(),
        }
    }

    pub async fn status_report(&self) -> StatusReport {
        let strip = self.strip.lock().await;
        StatusReport {
            success: true,
            led_count: strip.len(),
            brightness: strip.brightness(),
            pin: self.config.pin.to_string(),
            queue_size: self.queue_size(),
            message: "LED Driver is running".to_string(),
        }
    }

    /// Stop the worker and leave the strip dark.
    ///
    /// New commands are refused from here on. Whatever is still queued is
    /// dropped. Safe to call more than once; every call ends with a blank,
    /// flushed strip.
    pub async fn shutdown(&self) {
        if self.stop.send_replace(true) {
            debug!("Shutdown already requested");
        } else {
            info!("Shutting down LED Driver...");
        }

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut handle) = handle {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handle).await {
                Ok(Ok(())) => debug!("LED command worker joined"),
                Ok(Err(e)) => error!("LED command worker failed: {}", e),
                Err(_) => {
                    error!(
                        "LED command worker did not stop within {:?}, aborting it",
                        SHUTDOWN_TIMEOUT
                    );
                    handle.abort();
                }
            }
        }

        // A running worker holds the receiver. Once we hold it, nothing else
        // can touch the strip after it is blanked.
        let _queue = match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.receiver.lock()).await {
            Ok(mut queue) => {
                let dropped = queue.close_and_drain();
                if dropped > 0 {
                    warn!("Discarding {} queued commands", dropped);
                }
                Some(queue)
            }
            Err(_) => {
                error!("LED command worker still holds the queue, blanking anyway");
                None
            }
        };

        let mut strip = self.strip.lock().await;
        match strip.clear_and_show() {
            Ok(()) => info!("LEDs turned off"),
            Err(e) => error!("Failed to turn off LEDs: {:#}", e),
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
