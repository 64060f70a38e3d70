// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Part of the MIND project (Machine Intelligence Native Design).

//! MWB weights artifact encoder and decoder.
//!
//! Wire format:
//! ```text
//! [0..4)  : magic "MWB\0"
//! [4]     : version 0x01
//! [5..]   : ULEB128 tensor count, then per tensor:
//!           name (ULEB128 len + UTF-8), dtype code (1 byte),
//!           rank (ULEB128), dims (ULEB128 each),
//!           payload (ULEB128 byte len + raw little-endian elements)
//! ```
//!
//! Tensors are written in ascending name order, so the output is
//! deterministic: the same weight set always produces the same bytes.

use std::io::{Read, Write};

use crate::types::{DType, Tensor};

use super::varint::{uleb128_read, uleb128_write};

pub const MWB_MAGIC: [u8; 4] = *b"MWB\0";
pub const MWB_VERSION: u8 = 0x01;

/// Maximum tensors in one artifact.
pub const MAX_TENSOR_COUNT: usize = 100_000;

/// Maximum tensor name length in bytes.
pub const MAX_NAME_LEN: usize = 4096;

/// Maximum shape dimension count per tensor.
pub const MAX_RANK: usize = 32;

/// Maximum payload size per tensor in bytes (1 GiB).
pub const MAX_PAYLOAD: u64 = 1 << 30;

/// Error type for MWB operations.
#[derive(Debug, Clone)]
pub struct MwbError {
    pub message: String,
}

impl MwbError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for MwbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MWB error: {}", self.message)
    }
}

impl std::error::Error for MwbError {}

impl From<std::io::Error> for MwbError {
    fn from(e: std::io::Error) -> Self {
        Self { message: e.to_string() }
    }
}

fn dtype_code(dtype: DType) -> u8 {
    match dtype {
        DType::I32 => 0,
        DType::I64 => 1,
        DType::F32 => 2,
        DType::F64 => 3,
        DType::BF16 => 4,
        DType::F16 => 5,
    }
}

fn dtype_from_code(code: u8) -> Option<DType> {
    match code {
        0 => Some(DType::I32),
        1 => Some(DType::I64),
        2 => Some(DType::F32),
        3 => Some(DType::F64),
        4 => Some(DType::BF16),
        5 => Some(DType::F16),
        _ => None,
    }
}

/// Check the preconditions [`encode_weights`] enforces, without writing
/// anything: tensor count, name length, rank, and payload size within the
/// `MAX_*` limits the decoder applies, and no duplicate names. Everything
/// that passes here can be encoded and decoded again.
pub fn validate_weights(weights: &[Tensor]) -> Result<(), MwbError> {
    if weights.len() > MAX_TENSOR_COUNT {
        return Err(MwbError::new(format!("too many tensors: {}", weights.len())));
    }
    for tensor in weights {
        if tensor.name.len() > MAX_NAME_LEN {
            return Err(MwbError::new(format!(
                "tensor name length {} exceeds limit",
                tensor.name.len()
            )));
        }
        if tensor.shape.len() > MAX_RANK {
            return Err(MwbError::new(format!(
                "tensor `{}` rank {} exceeds limit",
                tensor.name,
                tensor.shape.len()
            )));
        }
        if tensor.data.len() as u64 > MAX_PAYLOAD {
            return Err(MwbError::new(format!(
                "tensor `{}` payload of {} bytes exceeds limit",
                tensor.name,
                tensor.data.len()
            )));
        }
    }
    let mut names: Vec<&str> = weights.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    for pair in names.windows(2) {
        if pair[0] == pair[1] {
            return Err(MwbError::new(format!("duplicate tensor name `{}`", pair[0])));
        }
    }
    Ok(())
}

/// Serialize a weight set to MWB.
///
/// Fails if [`validate_weights`] does; the output is otherwise independent
/// of the input order.
pub fn encode_weights<W: Write>(weights: &[Tensor], w: &mut W) -> Result<(), MwbError> {
    validate_weights(weights)?;

    let mut sorted: Vec<&Tensor> = weights.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    w.write_all(&MWB_MAGIC)?;
    w.write_all(&[MWB_VERSION])?;
    uleb128_write(w, sorted.len() as u64)?;

    for tensor in sorted {
        uleb128_write(w, tensor.name.len() as u64)?;
        w.write_all(tensor.name.as_bytes())?;
        w.write_all(&[dtype_code(tensor.dtype)])?;
        uleb128_write(w, tensor.shape.len() as u64)?;
        for dim in &tensor.shape {
            uleb128_write(w, *dim as u64)?;
        }
        uleb128_write(w, tensor.data.len() as u64)?;
        w.write_all(&tensor.data)?;
    }

    Ok(())
}

/// Parse an MWB artifact into its weight set, in ascending name order.
///
/// Enforces the `MAX_*` limits and cross-checks each payload length
/// against the declared shape and dtype.
pub fn decode_weights<R: Read>(r: &mut R) -> Result<Vec<Tensor>, MwbError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MWB_MAGIC {
        return Err(MwbError::new("bad magic, not an MWB artifact"));
    }
    let mut version = [0u8; 1];
    r.read_exact(&mut version)?;
    if version[0] != MWB_VERSION {
        return Err(MwbError::new(format!("unsupported MWB version {}", version[0])));
    }

    let count = uleb128_read(r)? as usize;
    if count > MAX_TENSOR_COUNT {
        return Err(MwbError::new(format!("tensor count {count} exceeds limit")));
    }

    let mut weights = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name_len = uleb128_read(r)? as usize;
        if name_len > MAX_NAME_LEN {
            return Err(MwbError::new(format!("tensor name length {name_len} exceeds limit")));
        }
        let mut name_bytes = vec![0u8; name_len];
        r.read_exact(&mut name_bytes)?;
        let name = String::from_utf8(name_bytes)
            .map_err(|_| MwbError::new("tensor name is not valid UTF-8"))?;

        let mut code = [0u8; 1];
        r.read_exact(&mut code)?;
        let dtype = dtype_from_code(code[0])
            .ok_or_else(|| MwbError::new(format!("unknown dtype code {}", code[0])))?;

        let rank = uleb128_read(r)? as usize;
        if rank > MAX_RANK {
            return Err(MwbError::new(format!("tensor rank {rank} exceeds limit")));
        }
        let mut shape = Vec::with_capacity(rank);
        for _ in 0..rank {
            shape.push(uleb128_read(r)? as usize);
        }

        let payload_len = uleb128_read(r)?;
        if payload_len > MAX_PAYLOAD {
            return Err(MwbError::new(format!("payload of {payload_len} bytes exceeds limit")));
        }
        let expected = shape
            .iter()
            .try_fold(dtype.byte_width() as u64, |acc, d| acc.checked_mul(*d as u64))
            .ok_or_else(|| MwbError::new("tensor shape overflows byte count"))?;
        if payload_len != expected {
            return Err(MwbError::new(format!(
                "payload is {payload_len} bytes but shape {shape:?} of {dtype} needs {expected}"
            )));
        }
        let mut data = vec![0u8; payload_len as usize];
        r.read_exact(&mut data)?;

        weights.push(Tensor { name, dtype, shape, data });
    }

    Ok(weights)
}
