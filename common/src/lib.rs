pub mod color;
pub mod protocol;

pub use color::{format_hex_color, parse_hex_color};
pub use protocol::{
    display_field, Ack, ConfigReport, ErrorReport, LedRequest, PixelRequest, ProtocolError,
    SetBrightnessRequest, SetPixelsRequest, StatusReport,
};
pub use smart_leds::RGB8;
