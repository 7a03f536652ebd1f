use std::sync::Arc;

use anyhow::Error;
use log::debug;
use smart_leds::{brightness, RGB8};
use tokio::sync::Mutex;

use crate::device::LedDevice;

/// The one lock guarding strip state and the device behind it.
pub type SharedStrip = Arc<Mutex<Strip>>;

/// In-memory pixel buffer plus the device it is flushed to.
///
/// Mutations only touch the buffer; nothing reaches the LEDs until
/// [`Strip::show`] is called.
pub struct Strip {
    pixels: Vec<RGB8>,
    brightness: f64,
    device: Box<dyn LedDevice>,
}

/// Copy of the strip state taken under the lock.
#[derive(Clone, Debug, PartialEq)]
pub struct StripSnapshot {
    pub pixels: Vec<RGB8>,
    pub brightness: f64,
}

pub fn clamp_brightness(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

impl Strip {
    /// An all-black strip of `led_count` pixels.
    pub fn new(led_count: usize, brightness: f64, device: Box<dyn LedDevice>) -> Self {
        Self {
            pixels: vec![RGB8::default(); led_count],
            brightness: clamp_brightness(brightness),
            device,
        }
    }

    pub fn shared(self) -> SharedStrip {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Write `color` at `index`. Indices outside the strip are ignored and
    /// `false` is returned.
    pub fn set_pixel(&mut self, index: i64, color: RGB8) -> bool {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| self.pixels.get_mut(index));

        match slot {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => {
                debug!("Ignoring pixel {} outside of 0..{}", index, self.pixels.len());
                false
            }
        }
    }

    /// Store a new brightness, clamped into `[0.0, 1.0]`. Does not flush.
    pub fn set_brightness(&mut self, level: f64) {
        self.brightness = clamp_brightness(level);
    }

    pub fn fill(&mut self, color: RGB8) {
        self.pixels.fill(color);
    }

    /// Brightness as the `0..=255` level `smart_leds::brightness` expects.
    pub fn brightness_level(&self) -> u8 {
        (self.brightness * 255.0).round() as u8
    }

    /// The frame as it would appear on the LEDs.
    pub fn scaled_frame(&self) -> Vec<RGB8> {
        brightness(self.pixels.iter().cloned(), self.brightness_level()).collect()
    }

    /// Push the buffer out to the device.
    pub fn show(&mut self) -> Result<(), Error> {
        let frame = self.scaled_frame();
        self.device.write_frame(&frame)
    }

    /// Whether `index` addresses a pixel on this strip.
    pub fn contains(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.pixels.len())
    }

    /// Blank every pixel and flush.
    pub fn clear_and_show(&mut self) -> Result<(), Error> {
        self.fill(RGB8::default());
        self.show()
    }

    pub fn snapshot(&self) -> StripSnapshot {
        StripSnapshot {
            pixels: self.pixels.clone(),
            brightness: self.brightness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SimulatedDevice;

    fn strip(led_count: usize) -> (Strip, crate::device::FrameLog) {
        let device = SimulatedDevice::new();
        let log = device.log();
        (Strip::new(led_count, 1.0, Box::new(device)), log)
    }

    #[test]
    fn test_starts_black() {
        let (strip, log) = strip(4);
        assert_eq!(strip.snapshot().pixels, vec![RGB8::default(); 4]);
        assert_eq!(log.flush_count(), 0);
    }

    #[test]
    fn test_set_pixel_ignores_out_of_range() {
        let (mut strip, _) = strip(3);

        assert!(strip.set_pixel(2, RGB8::new(9, 9, 9)));
        assert!(!strip.set_pixel(3, RGB8::new(1, 1, 1)));
        assert!(!strip.set_pixel(-1, RGB8::new(1, 1, 1)));
        assert!(!strip.set_pixel(i64::MAX, RGB8::new(1, 1, 1)));

        assert_eq!(
            strip.snapshot().pixels,
            vec![RGB8::default(), RGB8::default(), RGB8::new(9, 9, 9)]
        );
    }

    #[test]
    fn test_brightness_is_clamped() {
        let (mut strip, _) = strip(1);

        strip.set_brightness(-5.0);
        assert_eq!(strip.brightness(), 0.0);
        strip.set_brightness(3.2);
        assert_eq!(strip.brightness(), 1.0);
        strip.set_brightness(f64::NAN);
        assert_eq!(strip.brightness(), 0.0);
        strip.set_brightness(0.3);
        assert_eq!(strip.brightness(), 0.3);

        let clamped = Strip::new(1, 7.0, Box::new(SimulatedDevice::new()));
        assert_eq!(clamped.brightness(), 1.0);
    }

    #[test]
    fn test_show_scales_by_brightness() {
        let (mut strip, log) = strip(2);
        strip.set_pixel(0, RGB8::new(255, 100, 0));
        strip.set_brightness(0.5);

        strip.show().unwrap();

        // smart_leds::brightness computes c * (level + 1) / 256, level 128 here.
        assert_eq!(strip.brightness_level(), 128);
        assert_eq!(
            log.last_frame().unwrap(),
            vec![RGB8::new(128, 50, 0), RGB8::default()]
        );
    }

    #[test]
    fn test_brightness_extremes() {
        let (mut strip, log) = strip(1);
        strip.set_pixel(0, RGB8::new(255, 17, 1));

        strip.show().unwrap();
        assert_eq!(log.last_frame().unwrap(), vec![RGB8::new(255, 17, 1)]);

        strip.set_brightness(0.0);
        strip.show().unwrap();
        assert_eq!(log.last_frame().unwrap(), vec![RGB8::default()]);
    }

    #[test]
    fn test_contains() {
        let (strip, _) = strip(3);
        assert!(strip.contains(0));
        assert!(strip.contains(2));
        assert!(!strip.contains(3));
        assert!(!strip.contains(-1));
    }

    #[test]
    fn test_clear_and_show() {
        let (mut strip, log) = strip(2);
        strip.fill(RGB8::new(5, 5, 5));

        strip.clear_and_show().unwrap();

        assert_eq!(log.last_frame().unwrap(), vec![RGB8::default(); 2]);
        assert_eq!(strip.snapshot().pixels, vec![RGB8::default(); 2]);
    }
}
