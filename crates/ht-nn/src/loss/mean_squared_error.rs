// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

use super::Loss;
use crate::{PureResult, Tensor, TensorError};

/// Classic mean squared error loss with mean reduction.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanSquaredError;

impl MeanSquaredError {
    /// Creates a new mean squared error loss instance.
    pub fn new() -> Self {
        Self
    }

    fn check(prediction: &Tensor, target: &Tensor) -> PureResult<()> {
        if prediction.shape() != target.shape() {
            return Err(TensorError::ShapeMismatch {
                left: prediction.shape(),
                right: target.shape(),
            });
        }
        Ok(())
    }
}

impl Loss for MeanSquaredError {
    fn forward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor> {
        Self::check(prediction, target)?;
        let count = prediction.len() as f32;
        let sum: f32 = prediction
            .data()
            .iter()
            .zip(target.data().iter())
            .map(|(pred, tgt)| {
                let diff = pred - tgt;
                diff * diff
            })
            .sum();
        Tensor::from_vec(1, 1, vec![sum / count])
    }

    fn backward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor> {
        Self::check(prediction, target)?;
        let (rows, cols) = prediction.shape();
        let inv = 2.0f32 / prediction.len() as f32;
        let data = prediction
            .data()
            .iter()
            .zip(target.data().iter())
            .map(|(pred, tgt)| (pred - tgt) * inv)
            .collect();
        Tensor::from_vec(rows, cols, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_matches_hand_computed_values() {
        let mut loss = MeanSquaredError::new();
        // Two feature vectors of width two, as the feature field emits.
        let prediction = Tensor::from_vec(2, 2, vec![0.5, -0.5, 1.0, 0.25]).unwrap();
        let target = Tensor::from_vec(2, 2, vec![0.0, 0.0, 1.5, 0.25]).unwrap();
        let value = loss.forward(&prediction, &target).unwrap();
        // (0.25 + 0.25 + 0.25 + 0.0) / 4
        assert!((value.data()[0] - 0.1875).abs() < 1e-6);

        // d/dpred of mean((pred - tgt)^2) = 2 (pred - tgt) / n with n = 4.
        let grad = loss.backward(&prediction, &target).unwrap();
        assert_eq!(grad.shape(), (2, 2));
        for (got, want) in grad.data().iter().zip([0.25, -0.25, -0.25, 0.0]) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn mse_rejects_mismatched_shapes() {
        let mut loss = MeanSquaredError::new();
        let prediction = Tensor::zeros(1, 3).unwrap();
        let target = Tensor::zeros(1, 2).unwrap();
        assert!(loss.forward(&prediction, &target).is_err());
    }
}
