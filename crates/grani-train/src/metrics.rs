//! Per-epoch training metrics.

use serde::{Deserialize, Serialize};

/// Metrics recorded at the end of each epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch index (0-based).
    pub epoch: usize,
    /// Mean batch loss over the epoch.
    pub train_loss: f64,
    /// Validation loss, when a validation source was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_loss: Option<f64>,
    /// Best monitored loss seen so far (monotonically non-increasing).
    pub best_loss: f64,
    /// L2 norm of the last batch gradient of the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_norm: Option<f64>,
    /// Learning rate in effect during the epoch.
    pub learning_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let metrics = EpochMetrics {
            epoch: 0,
            train_loss: 0.5,
            val_loss: None,
            best_loss: 0.5,
            gradient_norm: None,
            learning_rate: 0.01,
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(!json.contains("val_loss"));
        assert!(!json.contains("gradient_norm"));
    }
}
