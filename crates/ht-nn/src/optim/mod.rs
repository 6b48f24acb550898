// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

use crate::module::Module;
use crate::{PureResult, TensorError};

/// Plain gradient descent over a module's parameters.
///
/// The optimizer never touches module internals: it drives updates purely
/// through the parameter-visitor interface, which is the whole contract a
/// module owes the outside world for training.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Creates a new optimizer, validating the learning rate.
    pub fn new(learning_rate: f32) -> PureResult<Self> {
        if learning_rate <= 0.0 || !learning_rate.is_finite() {
            return Err(TensorError::NonPositiveLearningRate {
                rate: learning_rate,
            });
        }
        Ok(Self { learning_rate })
    }

    /// Returns the current learning rate.
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Overrides the learning rate.
    pub fn set_learning_rate(&mut self, learning_rate: f32) -> PureResult<()> {
        if learning_rate <= 0.0 || !learning_rate.is_finite() {
            return Err(TensorError::NonPositiveLearningRate {
                rate: learning_rate,
            });
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    /// Scales the learning rate by the provided factor.
    pub fn scale_learning_rate(&mut self, factor: f32) -> PureResult<()> {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(TensorError::NonPositiveLearningRate { rate: factor });
        }
        self.learning_rate *= factor;
        Ok(())
    }

    /// Applies every accumulated gradient and clears the accumulators.
    pub fn step<M: Module>(&self, module: &mut M) -> PureResult<()> {
        let grad_norm_sq = module.accumulators_norm_sq()?;
        module.apply_step(self.learning_rate)?;
        tracing::debug!(
            learning_rate = self.learning_rate,
            grad_norm = grad_norm_sq.sqrt(),
            "gradient descent step"
        );
        Ok(())
    }

    /// Clears accumulated gradients without applying them.
    pub fn zero_grad<M: Module>(&self, module: &mut M) -> PureResult<()> {
        module.zero_accumulators()
    }
}
