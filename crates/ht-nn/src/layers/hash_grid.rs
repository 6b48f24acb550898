// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

//! Hash-grid positional encoding in the Instant-NGP family.
//!
//! A learnable feature table of `2^log2_table_size` rows is indexed through a
//! spatial hash of the integer lattice corners surrounding each query point,
//! and the eight corner features are blended trilinearly. Hash collisions are
//! the point of the design, not a defect: colliding corners share a table row
//! and therefore share learned features and gradient updates, which is the
//! memory/quality trade the encoding makes.

use crate::module::{Module, Parameter};
use crate::{PureResult, Tensor, TensorError};
use serde::{Deserialize, Serialize};

/// Per-axis multipliers of the spatial hash. The first axis is left unmixed
/// on purpose so coarse grids stay close to a direct index.
pub const HASH_PRIMES: [u32; 3] = [1, 2_654_435_761, 805_459_861];

/// Largest supported `log2_table_size`; keeps the table addressable with the
/// 32-bit hash and the dense gradient buffer allocatable.
pub const MAX_LOG2_TABLE_SIZE: u32 = 24;

/// Construction parameters for [`HashFeatureField`]. The defaults match the
/// usual single-level NeRF hash-encoding setup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HashGridConfig {
    /// Half-width of the uniform initialisation interval `[-s, s]`.
    pub init_scale: f32,
    /// The feature table holds `2^log2_table_size` rows.
    pub log2_table_size: u32,
    /// Feature width `F` of each table row.
    pub features_per_level: usize,
    /// Grid cells per axis at this (single) resolution level.
    pub resolution: u32,
}

impl Default for HashGridConfig {
    fn default() -> Self {
        Self {
            init_scale: 1e-4,
            log2_table_size: 19,
            features_per_level: 2,
            resolution: 1024,
        }
    }
}

impl HashGridConfig {
    fn validate(&self) -> PureResult<()> {
        if self.log2_table_size == 0 || self.log2_table_size > MAX_LOG2_TABLE_SIZE {
            return Err(TensorError::InvalidValue {
                label: "hash_grid_log2_table_size",
            });
        }
        if self.resolution == 0 {
            return Err(TensorError::InvalidValue {
                label: "hash_grid_resolution",
            });
        }
        if self.features_per_level == 0 {
            return Err(TensorError::InvalidValue {
                label: "hash_grid_features_per_level",
            });
        }
        if self.init_scale <= 0.0 || !self.init_scale.is_finite() {
            return Err(TensorError::InvalidValue {
                label: "hash_grid_init_scale",
            });
        }
        Ok(())
    }
}

/// Single-level hash-grid feature field.
///
/// Maps a batch of coordinates in `[0,1]^3` to interpolated feature vectors of
/// width `features_per_level`. Gradients reach exactly the table rows a query
/// touched, scaled by that query's interpolation weights; the coordinates
/// themselves receive no gradient because floor/ceil and the hash are integer
/// operations.
///
/// A multi-level stack (independent tables with per-level resolutions,
/// outputs concatenated) is a natural extension but is not part of this
/// layer's contract.
#[derive(Clone, Debug)]
pub struct HashFeatureField {
    table: Parameter,
    table_size: usize,
    features: usize,
    resolution: u32,
}

impl HashFeatureField {
    /// Creates a feature field from the provided configuration, initialising
    /// the table uniformly in `[-init_scale, init_scale)`. Pass a seed for
    /// reproducible initialisation.
    pub fn new(
        name: impl Into<String>,
        config: HashGridConfig,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        config.validate()?;
        let table_size = 1usize << config.log2_table_size;
        let table = Tensor::random_uniform(
            table_size,
            config.features_per_level,
            -config.init_scale,
            config.init_scale,
            seed,
        )?;
        let name = name.into();
        Ok(Self {
            table: Parameter::new(format!("{name}::table"), table),
            table_size,
            features: config.features_per_level,
            resolution: config.resolution,
        })
    }

    /// Number of rows in the feature table.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Feature width of each table row.
    pub fn features_per_level(&self) -> usize {
        self.features
    }

    /// Grid cells per axis.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Returns a reference to the feature-table parameter.
    pub fn table(&self) -> &Parameter {
        &self.table
    }

    /// Returns a mutable reference to the feature-table parameter.
    pub fn table_mut(&mut self) -> &mut Parameter {
        &mut self.table
    }

    /// Hashes an integer lattice corner to a table row.
    ///
    /// `(p0·x ⊕ p1·y ⊕ p2·z) mod table_size`, computed with wrapping
    /// arithmetic so every corner (including negative ones produced by
    /// out-of-range queries) lands in `[0, table_size)`.
    pub fn hash_index(&self, corner: [i64; 3]) -> usize {
        let mixed = (corner[0] as u32).wrapping_mul(HASH_PRIMES[0])
            ^ (corner[1] as u32).wrapping_mul(HASH_PRIMES[1])
            ^ (corner[2] as u32).wrapping_mul(HASH_PRIMES[2]);
        // table_size is a power of two.
        mixed as usize & (self.table_size - 1)
    }

    fn check_coordinates(&self, input: &Tensor) -> PureResult<()> {
        if input.cols() != 3 {
            return Err(TensorError::ShapeMismatch {
                left: input.shape(),
                right: (input.rows(), 3),
            });
        }
        Ok(())
    }

    /// Encodes a `(batch, 3)` tensor of coordinates in `[0,1]^3 ` into a
    /// `(batch, features_per_level)` tensor of interpolated features.
    ///
    /// Coordinates outside `[0,1]^3` are not an error: the surrounding
    /// corners are hashed like any others and a result is produced, but the
    /// extrapolated region shares no training signal with the scene, so
    /// quality degrades. A `tracing` debug event is emitted once per batch
    /// when that happens.
    pub fn encode(&self, input: &Tensor) -> PureResult<Tensor> {
        self.check_coordinates(input)?;
        let batch = input.rows();
        let table = self.table.value().data();
        let mut out = vec![0.0f32; batch * self.features];
        let mut out_of_range = 0usize;
        for (point, out_row) in input
            .data()
            .chunks(3)
            .zip(out.chunks_mut(self.features))
        {
            if point.iter().any(|v| !(0.0..=1.0).contains(v)) {
                out_of_range += 1;
            }
            let (floor, ceil, frac) = self.cell_of(point);
            for corner in 0..8usize {
                let weight = corner_weight(corner, &frac);
                if weight == 0.0 {
                    continue;
                }
                let index = self.hash_index(select_corner(corner, &floor, &ceil));
                let row = &table[index * self.features..(index + 1) * self.features];
                for (acc, &feature) in out_row.iter_mut().zip(row.iter()) {
                    *acc += weight * feature;
                }
            }
        }
        if out_of_range > 0 {
            tracing::debug!(
                out_of_range,
                batch,
                "hash-grid queries outside [0,1]^3; extrapolated corners used"
            );
        }
        Tensor::from_vec(batch, self.features, out)
    }

    fn cell_of(&self, point: &[f32]) -> ([i64; 3], [i64; 3], [f32; 3]) {
        let mut floor = [0i64; 3];
        let mut ceil = [0i64; 3];
        let mut frac = [0f32; 3];
        for axis in 0..3 {
            let scaled = point[axis] * self.resolution as f32;
            let low = scaled.floor();
            floor[axis] = low as i64;
            ceil[axis] = scaled.ceil() as i64;
            frac[axis] = scaled - low;
        }
        (floor, ceil, frac)
    }
}

/// Picks the lattice corner addressed by a 3-bit index: bit `i` selects
/// ceil (set) or floor (clear) along axis `i`.
fn select_corner(corner: usize, floor: &[i64; 3], ceil: &[i64; 3]) -> [i64; 3] {
    let mut out = [0i64; 3];
    for (axis, slot) in out.iter_mut().enumerate() {
        *slot = if corner >> axis & 1 == 1 {
            ceil[axis]
        } else {
            floor[axis]
        };
    }
    out
}

/// Trilinear weight of a 3-bit corner index: the product over axes of `frac`
/// (bit set) or `1 - frac` (bit clear). Summing over the eight corners always
/// yields one, and at integral scaled coordinates the weight collapses onto
/// corner zero.
fn corner_weight(corner: usize, frac: &[f32; 3]) -> f32 {
    let mut weight = 1.0f32;
    for (axis, &f) in frac.iter().enumerate() {
        weight *= if corner >> axis & 1 == 1 { f } else { 1.0 - f };
    }
    weight
}

impl Module for HashFeatureField {
    fn forward(&self, input: &Tensor) -> PureResult<Tensor> {
        self.encode(input)
    }

    fn backward(&mut self, input: &Tensor, grad_output: &Tensor) -> PureResult<Tensor> {
        self.check_coordinates(input)?;
        let batch = input.rows();
        if grad_output.shape() != (batch, self.features) {
            return Err(TensorError::ShapeMismatch {
                left: grad_output.shape(),
                right: (batch, self.features),
            });
        }
        // Scatter-add: every query adds its weighted contribution into the
        // rows it touched, so colliding corners accumulate shared gradients.
        let mut grad_table = vec![0.0f32; self.table_size * self.features];
        for (point, grad_row) in input
            .data()
            .chunks(3)
            .zip(grad_output.data().chunks(self.features))
        {
            let (floor, ceil, frac) = self.cell_of(point);
            for corner in 0..8usize {
                let weight = corner_weight(corner, &frac);
                if weight == 0.0 {
                    continue;
                }
                let index = self.hash_index(select_corner(corner, &floor, &ceil));
                let target = &mut grad_table[index * self.features..(index + 1) * self.features];
                for (acc, &grad) in target.iter_mut().zip(grad_row.iter()) {
                    *acc += weight * grad;
                }
            }
        }
        let grad = Tensor::from_vec(self.table_size, self.features, grad_table)?
            .scale(1.0 / batch as f32)?;
        self.table.accumulate_euclidean(&grad)?;

        // No gradient reaches the coordinates through floor/ceil/hash.
        Tensor::zeros(batch, 3)
    }

    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&self.table)?;
        Ok(())
    }

    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&mut self.table)?;
        Ok(())
    }
}

/// Axis-aligned bounding box used to bring world coordinates into the
/// `[0,1]^3` domain the feature field expects. Normalisation is the caller's
/// side of the input contract; the field itself never rescales.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Maps a `(batch, 3)` tensor of world coordinates into `[0,1]^3`.
    /// Degenerate axes (zero extent) map to zero instead of dividing by zero.
    pub fn normalize(&self, coords: &Tensor) -> PureResult<Tensor> {
        if coords.cols() != 3 {
            return Err(TensorError::ShapeMismatch {
                left: coords.shape(),
                right: (coords.rows(), 3),
            });
        }
        let mut range = [0.0f32; 3];
        for axis in 0..3 {
            let extent = self.max[axis] - self.min[axis];
            range[axis] = if extent == 0.0 { 1.0 } else { extent };
        }
        let data = coords
            .data()
            .iter()
            .enumerate()
            .map(|(i, &v)| (v - self.min[i % 3]) / range[i % 3])
            .collect();
        Tensor::from_vec(coords.rows(), 3, data)
    }
}
