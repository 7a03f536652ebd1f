use std::fmt;

use anyhow::{anyhow, Error};
use smart_leds::{SmartLedsWrite, RGB8};

use crate::config::Config;

mod simulated;
#[cfg(feature = "pi")]
mod ws2812;

pub use simulated::{FrameLog, SimulatedDevice};
#[cfg(feature = "pi")]
pub use ws2812::Ws2812Spi;

/// Object-safe view of a [`SmartLedsWrite`] strip so the back end can be
/// chosen at runtime. Every `SmartLedsWrite<Color = RGB8>` driver is one.
///
/// Frames arrive already scaled by the strip brightness and in logical RGB
/// order; a device is responsible for its own wire ordering.
pub trait LedDevice: Send {
    fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), Error>;
}

impl<D> LedDevice for D
where
    D: SmartLedsWrite<Color = RGB8> + Send,
    D::Error: fmt::Debug,
{
    fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), Error> {
        self.write(frame.iter().cloned())
            .map_err(|e| anyhow!("LED write failed: {:?}", e))
    }
}

/// Open the device for the current build: WS2812 over SPI on the Pi, a
/// simulated strip everywhere else.
#[allow(unused_variables)]
pub fn open(config: &Config) -> Result<Box<dyn LedDevice>, Error> {
    #[cfg(feature = "pi")]
    let device: Box<dyn LedDevice> = Box::new(Ws2812Spi::open(config)?);

    #[cfg(not(feature = "pi"))]
    let device: Box<dyn LedDevice> = {
        log::warn!("Built without the `pi` feature, LED output is simulated");
        Box::new(SimulatedDevice::new())
    };

    Ok(device)
}
