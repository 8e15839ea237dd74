//! Hex + ASCII rendering of captured bytes.

/// Two uppercase hex digits and a space: `0x07` -> `"07 "`.
pub fn hex_field(byte: u8) -> String {
    format!("{} ", hex::encode_upper([byte]))
}

/// The byte itself when printable (0x20..=0x7E), otherwise `.`, then a space.
pub fn ascii_field(byte: u8) -> String {
    let c = if (0x20..=0x7E).contains(&byte) { byte as char } else { '.' };
    format!("{c} ")
}

/// Full capture rendering of one byte: `0x41` -> `"41 A "`.
pub fn render_byte(byte: u8) -> String {
    let mut out = hex_field(byte);
    out.push_str(&ascii_field(byte));
    out
}
