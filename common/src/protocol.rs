use displaydoc::Display;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use smart_leds::RGB8;

use crate::color::{format_hex_color, parse_hex_color};

/// Colour used when a pixel request carries no `color` field.
pub const DEFAULT_COLOR: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
/// Brightness used when a `set_brightness` request carries no value.
pub const DEFAULT_BRIGHTNESS: f64 = 0.5;

/// Errors reported back to the client as `{success: false, error}`, or
/// logged by the worker when a queued field turns out to be unusable.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
pub enum ProtocolError {
    /// {0}
    MalformedJson(String),
    /// Request body must be a JSON object
    NotAnObject,
    /// Unknown command: {0}
    UnknownCommand(String),
    /// {0}
    InvalidField(String),
    /// Invalid color: {0}
    InvalidColor(String),
    /// Invalid index: {0}
    InvalidIndex(String),
    /// Invalid brightness: {0}
    InvalidBrightness(String),
}

impl std::error::Error for ProtocolError {}

/// One pixel write, `{"index": 3, "color": "#FF0000"}`.
///
/// Both fields are kept as the client sent them. They are only interpreted
/// when the command is applied, so a bad value is reported by the worker and
/// never fails the request that queued it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PixelRequest {
    #[serde(default)]
    pub index: Option<Value>,
    #[serde(default)]
    pub color: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SetPixelsRequest {
    #[serde(default)]
    pub pixels: Vec<PixelRequest>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SetBrightnessRequest {
    #[serde(default)]
    pub brightness: Option<Value>,
}

/// Everything a client can POST.
#[derive(Clone, Debug, PartialEq)]
pub enum LedRequest {
    SetPixel(PixelRequest),
    SetPixels(SetPixelsRequest),
    Show,
    SetBrightness(SetBrightnessRequest),
    /// Answered synchronously, never queued.
    GetConfig,
}

impl LedRequest {
    /// Decode a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

        let command = match object.get("command") {
            Some(Value::String(command)) => command.clone(),
            Some(other) => return Err(ProtocolError::UnknownCommand(other.to_string())),
            None => return Err(ProtocolError::UnknownCommand("None".to_string())),
        };

        match command.as_str() {
            "set_pixel" => Ok(Self::SetPixel(decode_fields(value)?)),
            "set_pixels" => Ok(Self::SetPixels(decode_fields(value)?)),
            "show" => Ok(Self::Show),
            "set_brightness" => Ok(Self::SetBrightness(decode_fields(value)?)),
            "get_config" => Ok(Self::GetConfig),
            _ => Err(ProtocolError::UnknownCommand(command)),
        }
    }

    /// Human readable confirmation returned once a command has been queued.
    /// Field values are echoed as sent.
    pub fn queued_message(&self) -> String {
        match self {
            Self::SetPixel(pixel) => format!(
                "Queued set pixel {} to {}",
                display_field(pixel.index.as_ref()),
                display_field(pixel.color.as_ref())
            ),
            Self::SetPixels(request) => format!("Queued set {} pixels", request.pixels.len()),
            Self::Show => "Queued LED update".to_string(),
            Self::SetBrightness(request) => format!(
                "Queued brightness to {}",
                display_field(request.brightness.as_ref())
            ),
            Self::GetConfig => "Configuration".to_string(),
        }
    }
}

/// Render a raw field for messages: strings bare, absent as `None`.
pub fn display_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

fn decode_fields<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidField(e.to_string()))
}

impl PixelRequest {
    pub fn new(index: i64, color: RGB8) -> Self {
        Self {
            index: Some(index.into()),
            color: Some(format_hex_color(color).into()),
        }
    }

    /// The target pixel, or `None` when the request names none.
    pub fn index(&self) -> Result<Option<i64>, ProtocolError> {
        match &self.index {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| ProtocolError::InvalidIndex(display_field(Some(value)))),
        }
    }

    pub fn rgb(&self) -> Result<RGB8, ProtocolError> {
        match &self.color {
            None | Some(Value::Null) => Ok(DEFAULT_COLOR),
            Some(Value::String(hex)) => parse_hex_color(hex),
            Some(other) => Err(ProtocolError::InvalidColor(other.to_string())),
        }
    }
}

impl SetBrightnessRequest {
    pub fn new(level: f64) -> Self {
        Self {
            brightness: Some(level.into()),
        }
    }

    /// Requested level, not yet clamped.
    pub fn level(&self) -> Result<f64, ProtocolError> {
        match &self.brightness {
            None | Some(Value::Null) => Ok(DEFAULT_BRIGHTNESS),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| ProtocolError::InvalidBrightness(display_field(Some(value)))),
        }
    }
}

/// Successful reply to a queued command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Reply to `get_config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigReport {
    pub success: bool,
    pub led_count: usize,
    pub brightness: f64,
    pub pin: String,
}

/// Reply to `GET /status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub success: bool,
    pub led_count: usize,
    pub brightness: f64,
    pub pin: String,
    pub queue_size: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error: String,
}

impl ErrorReport {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl From<&ProtocolError> for ErrorReport {
    fn from(error: &ProtocolError) -> Self {
        Self::new(error.to_string())
    }
}
