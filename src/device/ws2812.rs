use anyhow::Error;
use log::{info, warn};
use rppal::spi::{self, Bus, Mode, SlaveSelect, Spi};
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_spi::Ws2812;

use crate::config::{ColorOrder, Config, Pin};

/// Inside the 2-3.8 MHz window `ws2812-spi` needs for its bit timing.
const SPI_CLOCK_HZ: u32 = 3_000_000;
/// SPI0 drives its data out on GPIO 10.
const SPI0_MOSI: u8 = 10;

/// A WS2812 strip on the Pi's SPI0 bus.
pub struct Ws2812Spi {
    strip: Ws2812<Spi>,
    order: ColorOrder,
}

impl Ws2812Spi {
    pub fn open(config: &Config) -> Result<Self, Error> {
        if !matches!(&config.pin, Pin::Gpio(pin) if pin.0 == SPI0_MOSI) {
            warn!(
                "Configured pin {} is ignored, SPI output is on GPIO {}",
                config.pin, SPI0_MOSI
            );
        }

        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
        info!("WS2812 strip on SPI0 ({} LEDs)", config.led_count);

        Ok(Self {
            strip: Ws2812::new(spi),
            order: config.order,
        })
    }
}

impl SmartLedsWrite for Ws2812Spi {
    type Error = spi::Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let order = self.order;
        self.strip
            .write(iterator.into_iter().map(|color| order.to_grb(color.into())))
    }
}
