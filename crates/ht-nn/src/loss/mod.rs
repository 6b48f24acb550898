// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

mod mean_squared_error;

use crate::{PureResult, Tensor};

pub use mean_squared_error::MeanSquaredError;

/// Trait implemented by differentiable losses that operate directly on
/// HashTorch tensors.
pub trait Loss {
    /// Computes the loss value for the given predictions and targets.
    fn forward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor>;

    /// Returns the gradient of the loss with respect to the predictions.
    fn backward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor>;
}

/// Peak signal-to-noise ratio in decibels for a mean-squared error on signals
/// with unit peak, the quality metric NeRF-style training loops report.
pub fn psnr_db(mse: f32) -> f32 {
    -10.0 * mse.log10()
}
