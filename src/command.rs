use std::fmt;

use anyhow::Error;
use common::{display_field, LedRequest, PixelRequest, ProtocolError, SetBrightnessRequest};
use log::debug;
use smart_leds::RGB8;

use crate::strip::Strip;

/// A hardware-affecting request waiting for the worker.
///
/// Field values are carried as the client sent them and interpreted in
/// [`Command::apply`], so an unusable value fails there and is logged by the
/// worker instead of failing the request.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetPixel(PixelRequest),
    SetPixels(Vec<PixelRequest>),
    /// Flush the buffer. The only command that changes what the LEDs show.
    Show,
    SetBrightness(SetBrightnessRequest),
}

impl Command {
    pub fn set_pixel(index: i64, color: RGB8) -> Self {
        Command::SetPixel(PixelRequest::new(index, color))
    }

    pub fn set_pixels(pixels: impl IntoIterator<Item = (i64, RGB8)>) -> Self {
        Command::SetPixels(
            pixels
                .into_iter()
                .map(|(index, color)| PixelRequest::new(index, color))
                .collect(),
        )
    }

    pub fn set_brightness(level: f64) -> Self {
        Command::SetBrightness(SetBrightnessRequest::new(level))
    }

    /// Apply this command to the strip. Must be called with the strip lock
    /// held.
    ///
    /// A batch is applied entry by entry; the first unusable entry stops it
    /// and everything before it stays applied.
    pub fn apply(&self, strip: &mut Strip) -> Result<(), Error> {
        match self {
            Command::SetPixel(pixel) => apply_pixel(pixel, strip)?,
            Command::SetPixels(pixels) => {
                for pixel in pixels {
                    apply_pixel(pixel, strip)?;
                }
            }
            Command::Show => strip.show()?,
            Command::SetBrightness(request) => strip.set_brightness(request.level()?),
        }

        Ok(())
    }
}

/// Pixels without an index or off the strip are skipped before their colour
/// is looked at.
fn apply_pixel(pixel: &PixelRequest, strip: &mut Strip) -> Result<(), ProtocolError> {
    let Some(index) = pixel.index()? else {
        debug!("Ignoring pixel without an index");
        return Ok(());
    };

    if strip.contains(index) {
        strip.set_pixel(index, pixel.rgb()?);
    } else {
        debug!("Ignoring pixel {} outside of 0..{}", index, strip.len());
    }

    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetPixel(pixel) => write!(
                f,
                "set pixel {} to {}",
                display_field(pixel.index.as_ref()),
                display_field(pixel.color.as_ref())
            ),
            Command::SetPixels(pixels) => write!(f, "set {} pixels", pixels.len()),
            Command::Show => write!(f, "show"),
            Command::SetBrightness(request) => write!(
                f,
                "set brightness to {}",
                display_field(request.brightness.as_ref())
            ),
        }
    }
}

impl TryFrom<LedRequest> for Command {
    type Error = ProtocolError;

    /// `get_config` is answered directly and has no queued form.
    fn try_from(request: LedRequest) -> Result<Self, Self::Error> {
        match request {
            LedRequest::SetPixel(pixel) => Ok(Command::SetPixel(pixel)),
            LedRequest::SetPixels(batch) => Ok(Command::SetPixels(batch.pixels)),
            LedRequest::Show => Ok(Command::Show),
            LedRequest::SetBrightness(request) => Ok(Command::SetBrightness(request)),
            LedRequest::GetConfig => Err(ProtocolError::UnknownCommand("get_config".to_string())),
        }
    }
}
