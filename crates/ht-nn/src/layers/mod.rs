// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

pub mod hash_grid;

pub use hash_grid::{BoundingBox, HashFeatureField, HashGridConfig};
