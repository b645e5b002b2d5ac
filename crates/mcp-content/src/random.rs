//! Random string and random data generation.
//!
//! Characters are drawn from the operating system RNG with rejection sampling,
//! so every character of the charset is equally likely.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::types::{ContentError, ContentResult};

/// Alphanumeric charset used by [`random_string`].
pub const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum length accepted by the generators.
pub const MAX_RANDOM_LENGTH: usize = 1024;

/// Length used when the caller does not ask for one.
pub const DEFAULT_RANDOM_STRING_LENGTH: usize = 10;

const PRINTABLE_START: u8 = b' ';
const PRINTABLE_END: u8 = b'~';

/// Generate an alphanumeric string (a-z, A-Z, 0-9) of exactly `length` characters.
pub fn random_string(length: usize) -> ContentResult<String> {
    sample(ALPHANUMERIC, length)
}

/// Generate a string of printable ASCII characters (space through tilde).
pub fn random_data(length: usize) -> ContentResult<String> {
    let charset: Vec<u8> = (PRINTABLE_START..=PRINTABLE_END).collect();
    sample(&charset, length)
}

fn validate_length(length: usize) -> ContentResult<()> {
    if length == 0 {
        return Err(ContentError::LengthNotPositive);
    }
    if length > MAX_RANDOM_LENGTH {
        return Err(ContentError::LengthTooLarge {
            requested: length,
            max: MAX_RANDOM_LENGTH,
        });
    }
    Ok(())
}

fn sample(charset: &[u8], length: usize) -> ContentResult<String> {
    validate_length(length)?;
    if charset.is_empty() || charset.len() > 256 {
        return Err(ContentError::InvalidInput(format!(
            "charset size {} out of range",
            charset.len()
        )));
    }

    // Bytes at or above `zone` would bias the modulo and are rejected.
    let zone = 256 - (256 % charset.len());
    let mut out = Vec::with_capacity(length);
    let mut buf = [0u8; 64];

    while out.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| ContentError::Random(e.to_string()))?;

        for &b in &buf {
            if (b as usize) < zone {
                out.push(charset[b as usize % charset.len()]);
                if out.len() == length {
                    break;
                }
            }
        }
    }

    String::from_utf8(out).map_err(|e| ContentError::Random(e.to_string()))
}
