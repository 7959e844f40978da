//! The plain owned column: an immutable buffer plus length, the type
//! `ChunkedColumn` is layered on top of.

use crate::element::Numeric;
use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// An owned, densely packed column of one numeric element type.
///
/// Construction always copies its input in: the column's lifetime and
/// layout are never at the mercy of whatever produced the input `Vec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column<E> {
    data: Vec<E>,
}

impl<E> Column<E>
where
    E: Numeric + Serialize + for<'de> Deserialize<'de>,
{
    pub fn from_vec(data: Vec<E>) -> Self {
        Self { data }
    }

    pub fn from_slice(data: &[E]) -> Self {
        Self { data: data.to_vec() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    pub fn get(&self, index: usize) -> Option<E> {
        self.data.get(index).copied()
    }

    /// Persists this column via bincode. Not part of the kernel's compute
    /// surface, but a development convenience worth keeping regardless.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|_| KernelError::Allocation)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).map_err(|_| KernelError::Allocation)?;
        writer.flush().map_err(|_| KernelError::Allocation)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|_| KernelError::Allocation)?;
        let reader = BufReader::new(file);
        bincode::deserialize_from(reader).map_err(|_| KernelError::Allocation)
    }
}
