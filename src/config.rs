use std::{fmt, path::Path};

use anyhow::{bail, Error};
use log::info;
use pi_pinout::{GpioPin, PhysicalPin, WiringPiPin};
use serde::{Deserialize, Serialize};
use smart_leds::RGB8;

/// Default location of the configuration file.
pub const CONFIG_PATH: &str = "config.ron";
/// Environment variable that overrides [`CONFIG_PATH`].
pub const CONFIG_ENV: &str = "LED_DRIVER_CONFIG";

/// Hardware and server settings, fixed for the lifetime of the process.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Number of pixels on the strip.
    pub led_count: usize,
    /// Data pin the strip is wired to.
    pub pin: Pin,
    /// Byte order the strip expects on the wire.
    pub order: ColorOrder,
    /// Brightness at startup, clamped into `[0.0, 1.0]`.
    pub brightness: f64,
    /// HTTP listening port.
    pub port: u16,
    /// Maximum number of commands waiting for the worker.
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub enum Pin {
    Physical(PhysicalPin),
    Gpio(GpioPin),
    WiringPi(WiringPiPin),
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Physical(pin) => write!(f, "P{}", pin.0),
            Pin::Gpio(pin) => write!(f, "D{}", pin.0),
            Pin::WiringPi(pin) => write!(f, "W{}", pin.0),
        }
    }
}

/// Channel order of the bytes sent to the strip.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ColorOrder {
    Rgb,
    Rbg,
    #[default]
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Reorder logical `[r, g, b]` channels into wire order.
    pub fn arrange(self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        match self {
            ColorOrder::Rgb => [r, g, b],
            ColorOrder::Rbg => [r, b, g],
            ColorOrder::Grb => [g, r, b],
            ColorOrder::Gbr => [g, b, r],
            ColorOrder::Brg => [b, r, g],
            ColorOrder::Bgr => [b, g, r],
        }
    }

    /// Repack `color` for a driver that always sends G, R, B, so the bytes
    /// on the wire come out in this order.
    pub fn to_grb(self, color: RGB8) -> RGB8 {
        let [first, second, third] = self.arrange([color.r, color.g, color.b]);
        RGB8::new(second, first, third)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            led_count: 10,
            pin: Pin::Gpio(GpioPin(18)),
            order: ColorOrder::Grb,
            brightness: 0.5,
            port: 8080,
            queue_capacity: 1024,
        }
    }
}

impl Config {
    /// Load the configuration from `$LED_DRIVER_CONFIG`, falling back to
    /// `config.ron`. A missing file yields the defaults.
    pub fn load() -> Result<Config, Error> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        let path = Path::new(&path);

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        Config::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Config, Error> {
        let config = std::fs::read_to_string(path)?;
        let config: Config = ron::from_str(&config)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.led_count == 0 {
            bail!("led_count must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        Ok(())
    }
}
