// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

pub mod pure;

pub use pure::{PureResult, Tensor, TensorError};
