use std::time::Duration;

use displaydoc::Display;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::command::Command;

/// Why a command could not be queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum QueueError {
    /// Command queue is full
    Full,
    /// LED driver is shutting down
    Closed,
}

impl std::error::Error for QueueError {}

/// Result of waiting on the queue.
#[derive(Debug, PartialEq)]
pub enum Dequeued {
    Command(Command),
    /// Nothing arrived in time.
    Empty,
    /// Every sender is gone, or the queue was closed.
    Closed,
}

/// Create a FIFO command queue holding at most `capacity` pending commands.
pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer side, cheap to clone into request handlers.
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Append to the tail of the queue without waiting. A full queue is
    /// reported, never silently dropped.
    pub fn enqueue(&self, command: Command) -> Result<(), QueueError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Number of commands waiting for the worker.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer side, owned by the worker.
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Take the head of the queue, waiting at most `timeout` for one to
    /// arrive.
    pub async fn dequeue_with_timeout(&mut self, timeout: Duration) -> Dequeued {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(command)) => Dequeued::Command(command),
            Ok(None) => Dequeued::Closed,
            Err(_) => Dequeued::Empty,
        }
    }

    /// Refuse further commands and throw away whatever is still queued.
    /// Returns how many commands were discarded.
    pub fn close_and_drain(&mut self) -> usize {
        self.rx.close();

        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}
