// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License").

//! ULEB128 variable-length integers for the MWB weights format.
//!
//! Unsigned values are encoded 7 bits per byte, MSB as continuation flag,
//! so the small counts and dims that dominate a weights header cost one
//! byte each.

use std::io::{Read, Write};

/// Maximum bytes for a u64 ULEB128 encoding (ceil(64/7) = 10).
const MAX_ULEB128_BYTES: usize = 10;

/// Write an unsigned integer as ULEB128, returning the bytes written.
pub fn uleb128_write<W: Write>(w: &mut W, mut value: u64) -> std::io::Result<usize> {
    let mut written = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        w.write_all(&[byte])?;
        written += 1;
        if value == 0 {
            return Ok(written);
        }
    }
}

/// Read a ULEB128-encoded unsigned integer.
///
/// Fails with `InvalidData` on overlong encodings or truncated input.
pub fn uleb128_read<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for _ in 0..MAX_ULEB128_BYTES {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        let low = u64::from(byte[0] & 0x7F);
        if shift == 63 && low > 1 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "ULEB128 value overflows u64",
            ));
        }
        value |= low << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "ULEB128 encoding exceeds 10 bytes",
    ))
}
