use smart_leds::RGB8;

use crate::protocol::ProtocolError;

/// Parse a `#RRGGBB` colour. The leading `#` is optional.
pub fn parse_hex_color(hex: &str) -> Result<RGB8, ProtocolError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProtocolError::InvalidColor(hex.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| ProtocolError::InvalidColor(hex.to_string()))
    };

    Ok(RGB8::new(channel(0)?, channel(2)?, channel(4)?))
}

pub fn format_hex_color(color: RGB8) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}
