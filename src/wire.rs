//! Raw byte mechanics shared by the stream format and the single-frame
//! codec: NUL-padded magic blocks, native-endian i32/f64 fields, packed
//! double payloads.

use std::io::{Read, Write};

/// Every vis-brain file starts with a 256-byte NUL-padded magic block.
pub(crate) const MAGIC_BLOCK_LEN: usize = 256;

pub(crate) fn magic_block(magic: &str) -> [u8; MAGIC_BLOCK_LEN] {
    debug_assert!(magic.len() < MAGIC_BLOCK_LEN);
    let mut block = [0u8; MAGIC_BLOCK_LEN];
    block[..magic.len()].copy_from_slice(magic.as_bytes());
    block
}

/// Marker comparison up to the first NUL, like the original `strcmp` check:
/// the bytes before the padding must match exactly and the padding must
/// start right after the marker.
pub(crate) fn matches_magic(block: &[u8], magic: &str) -> bool {
    block.len() == MAGIC_BLOCK_LEN
        && block[..magic.len()] == *magic.as_bytes()
        && block[magic.len()] == 0
}

pub(crate) fn read_magic_block(r: &mut impl Read) -> std::io::Result<[u8; MAGIC_BLOCK_LEN]> {
    let mut block = [0u8; MAGIC_BLOCK_LEN];
    r.read_exact(&mut block)?;
    Ok(block)
}

pub(crate) fn read_i32(r: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_ne_bytes(buf))
}

pub(crate) fn read_f64(r: &mut impl Read) -> std::io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_ne_bytes(buf))
}

pub(crate) fn write_i32(w: &mut impl Write, value: i32) -> std::io::Result<()> {
    w.write_all(&value.to_ne_bytes())
}

pub(crate) fn write_f64(w: &mut impl Write, value: f64) -> std::io::Result<()> {
    w.write_all(&value.to_ne_bytes())
}

/// Pack doubles into `scratch` (cleared first) and write them in one call.
pub(crate) fn write_doubles(
    w: &mut impl Write,
    values: &[f64],
    scratch: &mut Vec<u8>,
) -> std::io::Result<()> {
    scratch.clear();
    scratch.reserve(values.len() * 8);
    for v in values {
        scratch.extend_from_slice(&v.to_ne_bytes());
    }
    w.write_all(scratch)
}

/// Read exactly `count` doubles.
pub(crate) fn read_doubles(r: &mut impl Read, count: usize) -> std::io::Result<Vec<f64>> {
    let byte_len = count.checked_mul(8).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("double payload of {count} values overflows the address space"),
        )
    })?;
    let mut bytes = vec![0u8; byte_len];
    r.read_exact(&mut bytes)?;
    let mut values = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(8) {
        // chunks_exact(8) always yields 8-byte slices.
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        values.push(f64::from_ne_bytes(buf));
    }
    Ok(values)
}
