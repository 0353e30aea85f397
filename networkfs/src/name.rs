//! Transport-safe encoding of entry names and file content.
//!
//! ASCII letters and digits pass through unchanged. Every other byte,
//! separators and non-ASCII bytes included, becomes `%` followed by its two
//! lowercase hex digits:
//!
//! - `hello` → `hello`
//! - `a b.txt` → `a%20b%2etxt`
//! - `é` (UTF-8 `c3 a9`) → `%c3%a9`
//!
//! The mapping is injective, so the service decodes it unambiguously. A
//! value's encoded form plus one terminator byte must fit the capacity the
//! service allots it; anything larger is refused rather than cut short.

use crate::error::{FsError, FsResult};
use crate::types::{MAX_CONTENT, MAX_NAME_LEN};

/// Buffer size for an encoded entry name, terminator included.
pub const NAME_CAPACITY: usize = 3 * MAX_NAME_LEN + 1;

/// Buffer size for encoded file content, terminator included.
pub const CONTENT_CAPACITY: usize = 3 * MAX_CONTENT + 1;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Size of the buffer `encode` needs for `raw`, terminator included.
pub fn encoded_len(raw: &[u8]) -> usize {
    raw.iter()
        .map(|b| if b.is_ascii_alphanumeric() { 1 } else { 3 })
        .sum::<usize>()
        + 1
}

/// Encode an entry name within [`NAME_CAPACITY`].
pub fn encode(name: &[u8]) -> FsResult<String> {
    encode_with_capacity(name, NAME_CAPACITY)
}

/// Encode a name that names a directory entry.
///
/// Listings return names as text, so an entry name must be valid UTF-8 to
/// be found again under the name it was listed with.
pub fn encode_entry_name(name: &[u8]) -> FsResult<String> {
    if std::str::from_utf8(name).is_err() {
        return Err(FsError::InvalidName(
            String::from_utf8_lossy(name).into_owned(),
        ));
    }
    encode(name)
}

/// Encode `raw` into a buffer of `capacity` bytes, terminator included.
///
/// Fails with [`FsError::EncodingOverflow`] when the encoded form would not
/// fit.
pub fn encode_with_capacity(raw: &[u8], capacity: usize) -> FsResult<String> {
    let required = encoded_len(raw);
    if required > capacity {
        return Err(FsError::EncodingOverflow { required, capacity });
    }

    let mut out = String::with_capacity(required - 1);
    for &b in raw {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    Ok(out)
}

/// Reverse of [`encode`]. Used by the in-memory service.
///
/// Returns `None` for a truncated or non-hex escape.
pub fn decode(encoded: &str) -> Option<Vec<u8>> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}
