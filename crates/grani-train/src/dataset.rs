//! Batch and dataset contracts.
//!
//! The orchestrator consumes a [`BatchSource`]: a finite, restartable
//! sequence of [`Batch`] records that preserves feature/target pairing order.
//! [`InMemoryDataset`] is the shipped implementation; anything that can hand
//! out batches in a stable order (a file reader, a streaming loader) can
//! implement the trait instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TrainError, TrainResult};

/// Paired features and targets; immutable once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    features: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl Batch {
    /// Create a batch, validating the pairing.
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> TrainResult<Self> {
        if features.len() != targets.len() {
            return Err(TrainError::BatchMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(TrainError::EmptyBatch);
        }
        Ok(Self { features, targets })
    }

    /// Number of examples in this batch.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the batch is empty (never true for a constructed batch).
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature rows, in pairing order.
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Target rows, in pairing order.
    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }
}

/// A finite, restartable, order-preserving source of batches.
pub trait BatchSource {
    /// Rewind to the first batch.
    fn reset(&mut self);

    /// The next batch, or `None` when the pass is complete.
    fn next_batch(&mut self) -> Option<Batch>;

    /// Total number of examples per pass.
    fn num_examples(&self) -> usize;
}

/// On-disk dataset file layout.
#[derive(Debug, Serialize, Deserialize)]
struct DataFile {
    features: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

/// A dataset held in memory, served in fixed-size batches.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    features: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
    batch_size: usize,
    cursor: usize,
}

impl InMemoryDataset {
    /// Create a dataset from paired rows.
    pub fn new(
        features: Vec<Vec<f64>>,
        targets: Vec<Vec<f64>>,
        batch_size: usize,
    ) -> TrainResult<Self> {
        if features.len() != targets.len() {
            return Err(TrainError::BatchMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(TrainError::EmptyBatch);
        }
        if batch_size == 0 {
            return Err(grani_ir::ConfigurationError::invalid_option(
                "batch_size",
                "must be at least 1",
            )
            .into());
        }
        Ok(Self {
            features,
            targets,
            batch_size,
            cursor: 0,
        })
    }

    /// Load a `{"features": [[..]], "targets": [[..]]}` JSON file.
    pub fn from_json_path(path: impl AsRef<Path>, batch_size: usize) -> TrainResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: DataFile = serde_json::from_str(&raw)?;
        Self::new(file.features, file.targets, batch_size)
    }
}

impl BatchSource for InMemoryDataset {
    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn next_batch(&mut self) -> Option<Batch> {
        if self.cursor >= self.features.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.features.len());
        let batch = Batch {
            features: self.features[self.cursor..end].to_vec(),
            targets: self.targets[self.cursor..end].to_vec(),
        };
        self.cursor = end;
        Some(batch)
    }

    fn num_examples(&self) -> usize {
        self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, -(i as f64)]).collect();
        let targets: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 * 0.1]).collect();
        (features, targets)
    }

    #[test]
    fn test_batch_pairing_validated() {
        assert!(matches!(
            Batch::new(vec![vec![1.0]], vec![]),
            Err(TrainError::BatchMismatch {
                features: 1,
                targets: 0
            })
        ));
        assert!(matches!(
            Batch::new(vec![], vec![]),
            Err(TrainError::EmptyBatch)
        ));
    }

    #[test]
    fn test_batching_covers_all_examples_in_order() {
        let (features, targets) = rows(7);
        let mut data = InMemoryDataset::new(features.clone(), targets, 3).unwrap();

        let mut seen = vec![];
        while let Some(batch) = data.next_batch() {
            assert!(batch.len() <= 3);
            seen.extend(batch.features().to_vec());
        }
        assert_eq!(seen, features);
    }

    #[test]
    fn test_reset_restarts_the_pass() {
        let (features, targets) = rows(4);
        let mut data = InMemoryDataset::new(features, targets, 2).unwrap();

        let first = data.next_batch().unwrap();
        while data.next_batch().is_some() {}
        assert!(data.next_batch().is_none());

        data.reset();
        assert_eq!(data.next_batch().unwrap(), first);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let (features, targets) = rows(2);
        assert!(InMemoryDataset::new(features, targets, 0).is_err());
    }

    #[test]
    fn test_json_roundtrip_via_file() {
        let (features, targets) = rows(3);
        let file = DataFile {
            features: features.clone(),
            targets,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let mut data = InMemoryDataset::from_json_path(&path, 8).unwrap();
        assert_eq!(data.num_examples(), 3);
        assert_eq!(data.next_batch().unwrap().features(), features.as_slice());
    }
}
