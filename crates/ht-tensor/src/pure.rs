// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

//! Pure Rust tensor primitives with only lightweight external dependencies.
//!
//! Everything here is safe Rust with no native bindings, so the stack stays
//! usable in sandboxed environments. The surface is deliberately small: only
//! the operations the HashTorch layers, losses, and optimizer reach are kept.

use core::fmt;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;

/// Result alias used throughout the pure module.
pub type PureResult<T> = Result<T, TensorError>;

/// Errors emitted by tensor utilities and the layers built on top of them.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// A tensor constructor received an invalid shape.
    InvalidDimensions { rows: usize, cols: usize },
    /// Data provided to a constructor or operator does not match the tensor shape.
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine tensors of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Learning rate must stay positive for gradient descent.
    NonPositiveLearningRate { rate: f32 },
    /// Attempted to load or update a parameter that was missing from the state dict.
    MissingParameter { name: String },
    /// Wrapper around I/O failures when persisting or restoring tensors.
    IoError { message: String },
    /// Wrapper around serde failures when deserialising tensors.
    SerializationError { message: String },
    /// Generic configuration violation for pure helpers.
    InvalidValue { label: &'static str },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "invalid tensor dimensions ({rows} x {cols}); both axes must be non-zero"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={:?}, right={:?} cannot be combined",
                    left, right
                )
            }
            TensorError::NonPositiveLearningRate { rate } => {
                write!(f, "learning rate must be positive, got {rate}")
            }
            TensorError::MissingParameter { name } => {
                write!(f, "missing parameter '{name}' while loading module state")
            }
            TensorError::IoError { message } => {
                write!(f, "i/o error while handling tensor data: {message}")
            }
            TensorError::SerializationError { message } => {
                write!(
                    f,
                    "serialization error while handling tensor data: {message}"
                )
            }
            TensorError::InvalidValue { label } => {
                write!(f, "invalid value: {label}")
            }
        }
    }
}

impl Error for TensorError {}

/// A simple row-major 2D tensor backed by an owned `f32` buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Tensor {
    fn from_buffer(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        let expected = rows * cols;
        if expected != data.len() {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    fn seedable_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> PureResult<Self> {
        Self::from_buffer(rows, cols, vec![0.0; rows * cols])
    }

    /// Create a tensor from raw data. The provided vector must match
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        Self::from_buffer(rows, cols, data)
    }

    /// Construct a tensor by sampling a uniform distribution in `[min, max)`.
    ///
    /// When `seed` is provided the RNG becomes deterministic which makes tests
    /// and benchmarks reproducible. Otherwise entropy from the host is used.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: f32,
        max: f32,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        if !(min < max) {
            return Err(TensorError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut rng = Self::seedable_rng(seed);
        let distribution = Uniform::new(min, max);
        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            data.push(distribution.sample(&mut rng));
        }
        Self::from_buffer(rows, cols, data)
    }

    /// Returns the `(rows, cols)` pair of the tensor.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements stored in the tensor.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns `true` when the tensor holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immutable view of the underlying row-major buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the underlying row-major buffer.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Immutable view of a single row.
    pub fn row(&self, index: usize) -> PureResult<&[f32]> {
        if index >= self.rows {
            return Err(TensorError::InvalidValue { label: "row_index" });
        }
        let start = index * self.cols;
        Ok(&self.data[start..start + self.cols])
    }

    /// In-place `self += other * scale`.
    pub fn add_scaled(&mut self, other: &Tensor, scale: f32) -> PureResult<()> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst += src * scale;
        }
        Ok(())
    }

    /// Returns `self * value` as a new tensor.
    pub fn scale(&self, value: f32) -> PureResult<Tensor> {
        let data = self.data.iter().map(|x| x * value).collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Squared L2 norm of the whole tensor.
    pub fn squared_l2_norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_rejects_empty_axes() {
        assert_eq!(
            Tensor::zeros(0, 3),
            Err(TensorError::InvalidDimensions { rows: 0, cols: 3 })
        );
    }

    #[test]
    fn from_vec_checks_length() {
        let err = Tensor::from_vec(2, 2, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            TensorError::DataLength {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn random_uniform_is_seed_deterministic_and_bounded() {
        let a = Tensor::random_uniform(4, 4, -0.5, 0.5, Some(11)).unwrap();
        let b = Tensor::random_uniform(4, 4, -0.5, 0.5, Some(11)).unwrap();
        assert_eq!(a, b);
        assert!(a.data().iter().all(|v| (-0.5..0.5).contains(v)));
    }

    #[test]
    fn scale_and_norm_agree() {
        let tensor = Tensor::from_vec(1, 3, vec![1.0, -2.0, 2.0]).unwrap();
        assert_eq!(tensor.squared_l2_norm(), 9.0);
        let doubled = tensor.scale(2.0).unwrap();
        assert_eq!(doubled.data(), &[2.0, -4.0, 4.0]);
        assert_eq!(doubled.squared_l2_norm(), 36.0);
    }

    #[test]
    fn add_scaled_requires_matching_shapes() {
        let mut lhs = Tensor::zeros(2, 2).unwrap();
        let rhs = Tensor::zeros(2, 3).unwrap();
        assert!(lhs.add_scaled(&rhs, 1.0).is_err());
    }
}
