//! Training loop for the outcome network

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{FeatureBatch, FeatureBatcher, FeatureRow};
use crate::model::mlp::{class_probabilities, OutcomeNet, OutcomeNetConfig};
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::{QuinielaError, Result, TrainingConfig};

/// Feature normalization (z-score), computed from the training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut sum = vec![0.0f64; FeatureRow::DIM];
        let mut sum_sq = vec![0.0f64; FeatureRow::DIM];

        for row in rows {
            for (j, value) in row.features().iter().enumerate() {
                sum[j] += *value as f64;
                sum_sq[j] += (*value as f64) * (*value as f64);
            }
        }

        let n = rows.len().max(1) as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| ((sq / n - m * m).max(0.0).sqrt() as f32).max(0.001))
            .collect();

        FeatureNormalization {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        }
    }

    /// Normalize a feature tensor: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);

        (features - mean) / std
    }
}

/// Output of a training run, already detached from autodiff
pub struct TrainedNetwork<B: Backend> {
    pub network: OutcomeNet<B>,
    pub network_config: OutcomeNetConfig,
    pub normalization: FeatureNormalization,
    pub history: TrainingHistory,
}

/// Mini-batch trainer: Adam on softmax cross-entropy, batches in row order
pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(device: B::Device, config: TrainingConfig) -> Self {
        Trainer { config, device }
    }

    /// Fit on the played fixtures of `rows`
    pub fn train(&self, rows: &[FeatureRow]) -> Result<TrainedNetwork<B::InnerBackend>> {
        let rows: Vec<FeatureRow> = rows.iter().filter(|r| r.winner.is_some()).cloned().collect();
        if rows.is_empty() {
            return Err(QuinielaError::NoData("training rows".to_string()));
        }

        let network_config = OutcomeNetConfig {
            hidden_dims: self.config.hidden_dims.clone(),
            ..OutcomeNetConfig::default()
        };
        let normalization = FeatureNormalization::from_rows(&rows);
        log::debug!(
            "Feature normalization: mean={:?}, std={:?}",
            normalization.mean,
            normalization.std
        );

        let mut model = OutcomeNet::<B>::new(&self.device, &network_config, self.config.seed);
        let mut optimizer = AdamConfig::new().init();
        let loss_fn = CrossEntropyLossConfig::new().init(&self.device);
        let batch_size = self.config.batch_size.max(1);
        let epochs = self.config.epochs;
        let mut history = TrainingHistory::new();

        log::info!(
            "Training on {} fixtures for {} epochs (batch size {})",
            rows.len(),
            epochs,
            batch_size
        );

        for epoch in 0..epochs {
            let mut metrics = Metrics::new();

            for chunk in rows.chunks(batch_size) {
                let batch: FeatureBatch<B> = FeatureBatcher.batch(chunk.to_vec(), &self.device);
                let logits = model.forward(normalization.normalize(batch.features));
                let loss = loss_fn.forward(logits.clone(), batch.targets);

                let loss_value: f32 = loss.clone().into_scalar().elem();
                let probabilities = class_probabilities(logits.inner())?;
                let targets: Vec<_> = chunk.iter().filter_map(|r| r.winner).collect();
                metrics.update(loss_value, &probabilities, &targets);

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optimizer.step(self.config.learning_rate, model, grads);
            }

            history.record_epoch(&metrics);
            if epoch % 10 == 0 || epoch + 1 == epochs {
                log::info!("Epoch {}/{}: {}", epoch + 1, epochs, metrics);
            }
        }

        Ok(TrainedNetwork {
            network: model.valid(),
            network_config,
            normalization,
            history,
        })
    }
}
