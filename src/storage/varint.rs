//! Variable-length unsigned integers whose first byte announces the total
//! length, so a reader can size its fetch before decoding and two encoded
//! values compare like their integers under memcmp.
//!
//! ```text
//! 0..=127     1 byte   the value itself
//! 128..=248   2 bytes  128 + 256*(b0-128) + b1   (up to 31103)
//! 249         3 bytes  b1..b2 as big-endian      (31104..=65535)
//! 250         4 bytes  b1..b3 as big-endian
//! ...
//! 255         9 bytes  b1..b8 as big-endian      (up to 2^64-1)
//! ```

use std::io::{ErrorKind, Read};

use crate::types::error::{DatabaseError, Result};

const MAX_VARINT_LEN: usize = 9;

const TWO_BYTE_LOW_END: u64 = 128;
const MULTI_BYTE_LOW_END: u8 = 249;

// One greater than 128 + 256 * 120 + 255
const TWO_BYTE_THRESHOLD: u64 = 31104;

// Value below thresholds[i] encodes in i + 1 total bytes; 2^56 and up take
// the full 9 bytes.
const THRESHOLDS: [u64; 8] = [
    128,
    31104,
    1 << 16,
    1 << 24,
    1 << 32,
    1 << 40,
    1 << 48,
    1 << 56,
];

/// Convenience for encoding lengths held in signed integers. Callers with
/// an unsigned value should use [`encode_u64`] directly.
pub fn encode(x: i64) -> Result<Vec<u8>> {
    if x < 0 {
        return Err(DatabaseError::NegativeInput(x));
    }
    Ok(encode_u64(x as u64))
}

pub fn encode_u64(x: u64) -> Vec<u8> {
    if x < TWO_BYTE_LOW_END {
        return vec![x as u8];
    }
    if x < TWO_BYTE_THRESHOLD {
        // Only the part above the one-byte range needs encoding
        let y = x - TWO_BYTE_LOW_END;
        return vec![(TWO_BYTE_LOW_END + y / 256) as u8, (y % 256) as u8];
    }

    let total = byte_length(x);
    let mut buf = vec![0u8; total];
    // 249 maps to 3 total bytes, 255 to 9
    buf[0] = MULTI_BYTE_LOW_END + (total - 3) as u8;
    let mut x = x;
    let mut i = total - 1;
    while x > 0 {
        buf[i] = x as u8;
        x >>= 8;
        i -= 1;
    }
    buf
}

/// Read one encoded integer. Fails with `Truncated` when the source ends
/// before the announced length; never fails for in-range values.
pub fn decode<R: Read>(r: &mut R) -> Result<u64> {
    let first = read_byte(r)?;
    if u64::from(first) < TWO_BYTE_LOW_END {
        return Ok(u64::from(first));
    }
    if first < MULTI_BYTE_LOW_END {
        let second = read_byte(r)?;
        let q = u64::from(first) - TWO_BYTE_LOW_END;
        return Ok(TWO_BYTE_LOW_END + 256 * q + u64::from(second));
    }
    // The rest is a big-endian integer: 249 -> 2 trailing bytes, 255 -> 8
    let trailing = first - 247;
    let mut x = 0u64;
    for _ in 0..trailing {
        x = (x << 8) + u64::from(read_byte(r)?);
    }
    Ok(x)
}

/// How many bytes [`encode_u64`] produces for `x`, without encoding. The
/// page writer uses this to pre-compute slot offsets, so it must agree
/// with the encoder for every input.
pub fn byte_length(x: u64) -> usize {
    for (i, threshold) in THRESHOLDS.iter().enumerate() {
        if x < *threshold {
            return i + 1;
        }
    }
    MAX_VARINT_LEN
}

fn read_byte<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            DatabaseError::Truncated {
                what: "varint".to_string(),
            }
        } else {
            DatabaseError::Io(e)
        }
    })?;
    Ok(buf[0])
}
