// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

//! High-level neural module API built on top of the HashTorch tensor
//! primitives.
//!
//! The centrepiece is [`HashFeatureField`], a multiresolution-hash-grid style
//! positional encoding (single resolution level) whose learnable feature table
//! receives gradients through the same `Module` seam an external regression
//! model and optimizer program against.

pub mod io;
pub mod layers;
pub mod loss;
pub mod module;
pub mod optim;

pub use io::{load_bincode, load_json, save_bincode, save_json};
pub use layers::hash_grid::{BoundingBox, HashFeatureField, HashGridConfig};
pub use loss::{psnr_db, Loss, MeanSquaredError};
pub use module::{Module, Parameter};
pub use optim::GradientDescent;

pub use ht_tensor::{PureResult, Tensor, TensorError};
