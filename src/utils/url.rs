//! Percent-encoding for deep-link parameters.
//!
//! Mirrors the browser's `encodeURIComponent`/`decodeURIComponent` so links
//! produced here and links produced by the page decode identically.

/// Characters `encodeURIComponent` leaves untouched besides ASCII alphanumerics.
const UNRESERVED_MARKS: &[u8] = b"-_.!~*'()";

/// Percent-encode a string as a URI component.
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 3);
    for &byte in input.as_bytes() {
        if byte.is_ascii_alphanumeric() || UNRESERVED_MARKS.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// Decode a percent-encoded URI component.
///
/// Returns `None` for truncated or non-hex escapes and for byte sequences
/// that are not valid UTF-8.
pub fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hi = hex_value(hex[0])?;
            let lo = hex_value(hex[1])?;
            decoded.push(hi << 4 | lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
