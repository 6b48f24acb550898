// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of HashTorch — Licensed under AGPL-3.0-or-later.

//! Snapshot persistence for module state dictionaries.
//!
//! JSON is convenient for small modules and inspection; bincode keeps large
//! feature tables compact.

use crate::module::Module;
use crate::{PureResult, Tensor, TensorError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl StoredTensor {
    fn from_tensor(tensor: &Tensor) -> StoredTensor {
        let (rows, cols) = tensor.shape();
        StoredTensor {
            rows,
            cols,
            data: tensor.data().to_vec(),
        }
    }

    fn into_tensor(self) -> PureResult<Tensor> {
        Tensor::from_vec(self.rows, self.cols, self.data)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ModuleSnapshot {
    parameters: HashMap<String, StoredTensor>,
}

impl ModuleSnapshot {
    fn capture<M: Module + ?Sized>(module: &M) -> PureResult<Self> {
        let mut parameters = HashMap::new();
        for (name, tensor) in module.state_dict()? {
            parameters.insert(name, StoredTensor::from_tensor(&tensor));
        }
        Ok(Self { parameters })
    }

    fn restore(self) -> PureResult<HashMap<String, Tensor>> {
        let mut state = HashMap::new();
        for (name, stored) in self.parameters {
            state.insert(name, stored.into_tensor()?);
        }
        Ok(state)
    }
}

fn io_error(err: std::io::Error) -> TensorError {
    TensorError::IoError {
        message: err.to_string(),
    }
}

fn serde_error(err: impl ToString) -> TensorError {
    TensorError::SerializationError {
        message: err.to_string(),
    }
}

/// Saves a module's parameters as pretty-printed JSON.
pub fn save_json<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> PureResult<()> {
    let snapshot = ModuleSnapshot::capture(module)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores a module's parameters from a JSON snapshot.
pub fn load_json<M: Module + ?Sized, P: AsRef<Path>>(module: &mut M, path: P) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: ModuleSnapshot = serde_json::from_reader(reader).map_err(serde_error)?;
    module.load_state_dict(&snapshot.restore()?)
}

/// Saves a module's parameters in the compact bincode format.
pub fn save_bincode<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> PureResult<()> {
    let snapshot = ModuleSnapshot::capture(module)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores a module's parameters from a bincode snapshot.
pub fn load_bincode<M: Module + ?Sized, P: AsRef<Path>>(module: &mut M, path: P) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: ModuleSnapshot = bincode::deserialize_from(reader).map_err(serde_error)?;
    module.load_state_dict(&snapshot.restore()?)
}
