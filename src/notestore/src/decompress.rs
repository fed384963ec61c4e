//! Gzip front-end. Inflates when the input carries the gzip magic, passes it
//! through otherwise.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::{DecodeError, ErrorKind, Result};

/// Gzip member magic
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

pub fn inflate(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_gzip(data) {
        return Ok(Cow::Borrowed(data));
    }

    let mut decoder = GzDecoder::new(data);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| DecodeError::new(ErrorKind::InflationFailure(e.to_string()), 0))?;

    Ok(Cow::Owned(inflated))
}
