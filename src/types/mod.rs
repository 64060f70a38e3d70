//! Weight tensor definitions.
//!
//! # Example
//! ```
//! use mind_export::types::{DType, Tensor};
//! let w = Tensor::from_f32("w", vec![1, 3], &[0.5, 1.5, 2.5]);
//! assert_eq!(w.dtype, DType::F32);
//! assert_eq!(w.element_count(), 3);
//! ```

/// Element type of a weight tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I32,
    I64,
    F32,
    F64,
    BF16,
    F16,
}

impl DType {
    /// Size of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            DType::F16 | DType::BF16 => 2,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::BF16 => "bf16",
            DType::F16 => "f16",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named constant weight: dtype, shape, and raw little-endian element
/// bytes. The bytes are carried verbatim through save/load, so derived
/// equality is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub data: Vec<u8>,
}

impl Tensor {
    /// Construct from raw little-endian element bytes.
    ///
    /// # Panics
    /// Panics if `data.len()` does not match `shape` and `dtype`.
    pub fn from_raw(name: impl Into<String>, dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Self {
        let expected = shape.iter().product::<usize>() * dtype.byte_width();
        assert_eq!(
            data.len(),
            expected,
            "tensor data is {} bytes but shape {:?} of {} needs {}",
            data.len(),
            shape,
            dtype,
            expected
        );
        Self { name: name.into(), dtype, shape, data }
    }

    /// Construct an f32 tensor from element values.
    ///
    /// # Panics
    /// Panics if `values.len()` does not match the shape's element count.
    pub fn from_f32(name: impl Into<String>, shape: Vec<usize>, values: &[f32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        Self::from_raw(name, DType::F32, shape, data)
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Decode the element values, if this is an f32 tensor.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        if self.dtype != DType::F32 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Elementwise comparison within `tol` for float dtypes; exact byte
    /// comparison otherwise. Names, dtypes, and shapes must match.
    pub fn approx_eq(&self, other: &Tensor, tol: f64) -> bool {
        if self.name != other.name || self.dtype != other.dtype || self.shape != other.shape {
            return false;
        }
        match self.dtype {
            DType::F32 => {
                let (a, b) = (self.to_f32().unwrap(), other.to_f32().unwrap());
                a.iter().zip(&b).all(|(x, y)| (f64::from(*x) - f64::from(*y)).abs() <= tol)
            }
            DType::F64 => {
                let decode = |data: &[u8]| -> Vec<f64> {
                    data.chunks_exact(8)
                        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                        .collect()
                };
                let (a, b) = (decode(&self.data), decode(&other.data));
                a.iter().zip(&b).all(|(x, y)| (x - y).abs() <= tol)
            }
            _ => self.data == other.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DType, Tensor};

    #[test]
    fn from_f32_roundtrips_values() {
        let t = Tensor::from_f32("w", vec![1, 3], &[0.5, -1.0, 2.25]);
        assert_eq!(t.element_count(), 3);
        assert_eq!(t.to_f32().unwrap(), vec![0.5, -1.0, 2.25]);
    }

    #[test]
    fn approx_eq_tolerates_small_drift() {
        let a = Tensor::from_f32("w", vec![2], &[1.0, 2.0]);
        let b = Tensor::from_f32("w", vec![2], &[1.0 + 5e-7, 2.0]);
        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&b, 1e-9));
    }

    #[test]
    fn approx_eq_rejects_shape_mismatch() {
        let a = Tensor::from_f32("w", vec![2], &[1.0, 2.0]);
        let b = Tensor::from_f32("w", vec![1, 2], &[1.0, 2.0]);
        assert!(!a.approx_eq(&b, 1e-6));
    }

    #[test]
    #[should_panic(expected = "needs")]
    fn from_raw_checks_length() {
        Tensor::from_raw("w", DType::I64, vec![2], vec![0u8; 4]);
    }
}
