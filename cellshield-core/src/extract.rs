//! Field extraction over response bytes
//!
//! Pure functions over a read-only view of a response. The stream variant,
//! which extracts while bytes are still arriving, lives on
//! [`AtTransport`](crate::engine::AtTransport).

use core::str::FromStr;

use heapless::String;

use crate::buffer::find;
use crate::error::{Error, Result};

/// Characters of a dotted-quad IPv4 address
pub const IPV4_CHARS: &[u8] = b"0123456789.";

/// Bytes strictly between the first `open` and the next `close` after it
///
/// Returns `None` if either delimiter is missing.
pub fn between<'a>(src: &'a [u8], open: &[u8], close: &[u8]) -> Option<&'a [u8]> {
    let start = find(src, open)? + open.len();
    let rest = &src[start..];
    let end = find(rest, close)?;
    Some(&rest[..end])
}

/// [`between`], returning text
pub fn between_str<'a>(src: &'a [u8], open: &[u8], close: &[u8]) -> Option<&'a str> {
    between(src, open, close).and_then(|b| core::str::from_utf8(b).ok())
}

/// The `n`-th field (zero-based) when `src` is split on `sep`
pub fn nth_field(src: &[u8], n: usize, sep: u8) -> Option<&[u8]> {
    src.split(|&b| b == sep).nth(n)
}

/// First maximal run of bytes drawn from `charset`
pub fn span_of<'a>(src: &'a [u8], charset: &[u8]) -> Option<&'a [u8]> {
    let start = src.iter().position(|b| charset.contains(b))?;
    let rest = &src[start..];
    let len = rest
        .iter()
        .position(|b| !charset.contains(b))
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Strip leading and trailing ASCII whitespace
pub fn trim_ascii(src: &[u8]) -> &[u8] {
    let start = src
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(src.len());
    let end = src
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &src[start..end]
}

/// Copy bytes into a fixed-capacity string
pub fn to_string<const M: usize>(bytes: &[u8]) -> Result<String<M>> {
    let text = core::str::from_utf8(bytes).map_err(|_| Error::Malformed)?;
    let mut out = String::new();
    out.push_str(text).map_err(|_| Error::BufferTooSmall)?;
    Ok(out)
}

/// Parse a decimal number, ignoring surrounding whitespace
pub fn parse_number<T: FromStr>(bytes: &[u8]) -> Result<T> {
    core::str::from_utf8(trim_ascii(bytes))
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::Malformed)
}
