use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::{bail, Error};
use log::debug;
use smart_leds::{SmartLedsWrite, RGB8};

/// Shared record of every frame a [`SimulatedDevice`] has been asked to
/// display. Cloning it gives another view of the same log.
#[derive(Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<Vec<RGB8>>>>,
    failing: Arc<AtomicBool>,
}

impl FrameLog {
    pub fn frames(&self) -> Vec<Vec<RGB8>> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn last_frame(&self) -> Option<Vec<RGB8>> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }

    pub fn flush_count(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or_default()
    }

    /// Make subsequent writes fail, to exercise error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

/// A strip that only exists in memory.
#[derive(Default)]
pub struct SimulatedDevice {
    log: FrameLog,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> FrameLog {
        self.log.clone()
    }
}

impl SmartLedsWrite for SimulatedDevice {
    type Error = Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        if self.log.failing.load(Ordering::SeqCst) {
            bail!("simulated device write failure");
        }

        let frame: Vec<RGB8> = iterator.into_iter().map(Into::into).collect();

        debug!("Simulated strip: {:?}", frame);

        match self.log.frames.lock() {
            Ok(mut frames) => frames.push(frame),
            Err(_) => bail!("frame log poisoned"),
        }

        Ok(())
    }
}
