//! Training metrics and evaluation

use crate::Winner;
use std::fmt;

/// Metrics accumulated during training/evaluation
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Sum of batch losses
    pub total_loss: f64,
    /// Number of batches accumulated
    pub batch_count: usize,
    /// Number of correct outcome predictions
    pub correct: usize,
    /// Total predictions
    pub total_predictions: usize,
    /// Sum of -ln(p) of the true class
    pub log_loss_sum: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a set of predicted distributions against the true outcomes
    pub fn evaluate(probabilities: &[[f32; 3]], targets: &[Winner]) -> Self {
        let mut metrics = Self::new();
        metrics.record_predictions(probabilities, targets);
        metrics
    }

    /// Update metrics with a batch result
    pub fn update(&mut self, loss: f32, probabilities: &[[f32; 3]], targets: &[Winner]) {
        self.total_loss += loss as f64;
        self.batch_count += 1;
        self.record_predictions(probabilities, targets);
    }

    fn record_predictions(&mut self, probabilities: &[[f32; 3]], targets: &[Winner]) {
        for (p, target) in probabilities.iter().zip(targets) {
            if crate::model::mlp::most_likely(p) == *target {
                self.correct += 1;
            }
            let p_true = p[target.code() as usize].max(1e-7) as f64;
            self.log_loss_sum -= p_true.ln();
            self.total_predictions += 1;
        }
    }

    /// Get average batch loss
    pub fn avg_loss(&self) -> f64 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.total_loss / self.batch_count as f64
        }
    }

    /// Fraction of correct predictions (0-1)
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64
        }
    }

    /// Mean negative log-likelihood of the true class
    pub fn log_loss(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.log_loss_sum / self.total_predictions as f64
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss={:.4}, acc={:.1}%, log_loss={:.4}",
            self.avg_loss(),
            self.accuracy() * 100.0,
            self.log_loss()
        )
    }
}

/// Per-epoch training curve
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
    pub accuracies: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, metrics: &Metrics) {
        self.losses.push(metrics.avg_loss());
        self.accuracies.push(metrics.accuracy());
    }

    pub fn epochs(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}
