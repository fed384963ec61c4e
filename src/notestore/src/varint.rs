//! Base-128 varints and fixed-width little-endian scalars.
//!
//! Offsets in errors are relative to the slice passed in.

use crate::{DecodeError, ErrorKind, Result};

/// 64 bits at 7 bits per byte
pub const MAX_VARINT_LEN: usize = 10;

/// Read a varint at `pos`, returning (value, bytes consumed)
pub fn read_varint(buf: &[u8], pos: usize) -> Result<(u64, usize)> {
    let mut value = 0u64;

    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = buf.get(pos + i) else {
            return Err(DecodeError::new(ErrorKind::IncompleteVarint, pos));
        };

        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(DecodeError::new(ErrorKind::VarintTooLong, pos))
}

/// Read a little-endian u32 at `pos`
pub fn read_fixed32(buf: &[u8], pos: usize) -> Result<u32> {
    read_array(buf, pos).map(u32::from_le_bytes)
}

/// Read a little-endian u64 at `pos`
pub fn read_fixed64(buf: &[u8], pos: usize) -> Result<u64> {
    read_array(buf, pos).map(u64::from_le_bytes)
}

#[inline]
fn read_array<const N: usize>(buf: &[u8], pos: usize) -> Result<[u8; N]> {
    let Some(bytes) = buf.get(pos..pos.saturating_add(N)) else {
        return Err(DecodeError::new(
            ErrorKind::TruncatedFixed {
                needed: N,
                actual: buf.len().saturating_sub(pos),
            },
            pos,
        ));
    };

    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Read a run of back-to-back varints filling the whole slice (a packed array)
pub fn read_packed(buf: &[u8]) -> Result<Vec<u64>> {
    let mut values = Vec::new();
    let mut pos = 0;

    while pos < buf.len() {
        let (value, n) = read_varint(buf, pos)?;
        values.push(value);
        pos += n;
    }

    Ok(values)
}

/// Number of bytes the varint encoding of `n` occupies
#[inline]
pub fn size_of_varint(n: u64) -> usize {
    let bits = (u64::BITS - n.leading_zeros()) as usize;
    bits.div_ceil(7).max(1)
}

/// Append the varint encoding of `value`
pub fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_single_byte() {
        assert_eq!(read_varint(&[0x00], 0).unwrap(), (0, 1));
        assert_eq!(read_varint(&[0x7f], 0).unwrap(), (127, 1));
    }

    #[test]
    fn test_read_multi_byte() {
        // 300 = 0b1_0010_1100
        assert_eq!(read_varint(&[0xac, 0x02], 0).unwrap(), (300, 2));
        assert_eq!(read_varint(&[0xff, 0xac, 0x02], 1).unwrap(), (300, 2));
    }

    #[test]
    fn test_read_max_u64() {
        let buf = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert_eq!(read_varint(&buf, 0).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn test_incomplete_varint() {
        let err = read_varint(&[0x08, 0x96], 1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteVarint);
        assert_eq!(err.offset, 1);

        let err = read_varint(&[], 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteVarint);
    }

    #[test]
    fn test_varint_too_long() {
        let buf = [0x80u8; 11];
        let err = read_varint(&buf, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::VarintTooLong);
    }

    #[test]
    fn test_read_fixed() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_fixed32(&buf, 0).unwrap(), 0x0403_0201);
        assert_eq!(read_fixed32(&buf, 4).unwrap(), 0x0807_0605);
        assert_eq!(read_fixed64(&buf, 0).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_truncated_fixed() {
        let err = read_fixed64(&[0u8; 5], 0).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::TruncatedFixed {
                needed: 8,
                actual: 5
            }
        );

        let err = read_fixed32(&[0u8; 4], 2).unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_read_packed() {
        assert_eq!(read_packed(&[0x01, 0x00, 0xac, 0x02]).unwrap(), vec![1, 0, 300]);
        assert!(read_packed(&[]).unwrap().is_empty());
        assert!(read_packed(&[0x01, 0x80]).is_err());
    }

    #[test]
    fn test_size_of_varint() {
        assert_eq!(size_of_varint(0), 1);
        assert_eq!(size_of_varint(127), 1);
        assert_eq!(size_of_varint(128), 2);
        assert_eq!(size_of_varint(16_383), 2);
        assert_eq!(size_of_varint(16_384), 3);
        assert_eq!(size_of_varint(u64::MAX), 10);
    }

    #[test]
    fn test_write_matches_size() {
        for value in [0u64, 1, 127, 128, 300, 1 << 35, u64::MAX] {
            let mut out = Vec::new();
            write_varint(value, &mut out);
            assert_eq!(out.len(), size_of_varint(value));
            assert_eq!(read_varint(&out, 0).unwrap(), (value, out.len()));
        }
    }
}
