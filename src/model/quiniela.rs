//! The persisted outcome model
//!
//! A model file holds one JSON manifest line (kind, version, network shape,
//! normalization, team encoding, season numericizer) followed by the network
//! weights.

use burn::backend::{Autodiff, NdArray};
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::dataset::{FeatureRow, QuinielaDataset, FEATURE_NAMES};
use crate::features::temporal::SeasonNumericizer;
use crate::features::TeamEncoding;
use crate::model::mlp::{class_probabilities, most_likely, OutcomeNet, OutcomeNetConfig};
use crate::training::metrics::TrainingHistory;
use crate::training::trainer::{FeatureNormalization, Trainer};
use crate::{QuinielaError, Result, TrainingConfig, Winner};

pub type InferenceBackend = NdArray<f32>;
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Kind tag written into every model file
pub const MODEL_KIND: &str = "quiniela-outcome-mlp";
pub const FORMAT_VERSION: u32 = 1;

/// Everything besides the weights needed to use a trained network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub kind: String,
    pub format_version: u32,
    pub features: Vec<String>,
    pub network: OutcomeNetConfig,
    pub normalization: FeatureNormalization,
    pub teams: TeamEncoding,
    /// Season numericization the training table used
    pub seasons: SeasonNumericizer,
    pub trained_fixtures: usize,
}

/// Trained classifier over fixture features
pub struct QuinielaModel {
    network: OutcomeNet<InferenceBackend>,
    manifest: ModelManifest,
    device: <InferenceBackend as burn::tensor::backend::Backend>::Device,
}

impl QuinielaModel {
    /// Fit a model on a training table
    pub fn train(dataset: &QuinielaDataset, config: &TrainingConfig) -> Result<(Self, TrainingHistory)> {
        let device = Default::default();
        let trainer = Trainer::<TrainingBackend>::new(device, config.clone());
        let trained = trainer.train(&dataset.rows)?;

        let manifest = ModelManifest {
            kind: MODEL_KIND.to_string(),
            format_version: FORMAT_VERSION,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            network: trained.network_config,
            normalization: trained.normalization,
            teams: dataset.encoding.clone(),
            seasons: dataset.seasons,
            trained_fixtures: dataset.len(),
        };

        let model = QuinielaModel {
            network: trained.network,
            manifest,
            device: Default::default(),
        };
        Ok((model, trained.history))
    }

    /// Class probabilities `[p_1, p_X, p_2]` per row
    pub fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<[f32; 3]>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<f32> = rows.iter().flat_map(|r| r.features()).collect();
        let features = Tensor::<InferenceBackend, 1>::from_floats(values.as_slice(), &self.device)
            .reshape([rows.len(), FeatureRow::DIM]);
        let logits = self
            .network
            .forward(self.manifest.normalization.normalize(features));
        class_probabilities(logits)
    }

    /// Most likely outcome per row
    pub fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<Winner>> {
        Ok(self.predict_proba(rows)?.iter().map(most_likely).collect())
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Team encoding the model was trained with
    pub fn encoding(&self) -> &TeamEncoding {
        &self.manifest.teams
    }

    /// Season numericizer the model was trained with
    pub fn seasons(&self) -> &SeasonNumericizer {
        &self.manifest.seasons
    }

    /// Write the model to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut blob = serde_json::to_vec(&self.manifest)
            .map_err(|e| QuinielaError::Model(format!("failed to serialize manifest: {}", e)))?;
        blob.push(b'\n');
        blob.extend(self.network.to_bytes()?);

        std::fs::write(path, blob)?;
        log::info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Read a model written by [`QuinielaModel::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let blob = std::fs::read(path)?;
        let mismatch = || QuinielaError::ModelTypeMismatch {
            path: path.display().to_string(),
            expected: MODEL_KIND.to_string(),
        };

        let split = blob.iter().position(|b| *b == b'\n').ok_or_else(mismatch)?;
        let manifest: ModelManifest =
            serde_json::from_slice(&blob[..split]).map_err(|_| mismatch())?;
        if manifest.kind != MODEL_KIND {
            return Err(mismatch());
        }
        if manifest.format_version != FORMAT_VERSION {
            return Err(QuinielaError::Model(format!(
                "unsupported model format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let manifest = ModelManifest {
            teams: manifest.teams.reindexed(),
            ..manifest
        };
        let device = Default::default();
        let network = OutcomeNet::from_bytes(&device, &manifest.network, blob[split + 1..].to_vec())?;
        log::debug!(
            "Loaded {} model trained on {} fixtures, {} teams",
            manifest.kind,
            manifest.trained_fixtures,
            manifest.teams.len()
        );

        Ok(QuinielaModel {
            network,
            manifest,
            device,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::tests::{make_match, TempPath};
    use crate::features::temporal::SeasonEncoding;

    fn dataset() -> QuinielaDataset {
        let mut matches = Vec::new();
        let teams = ["A", "B", "C", "D"];
        let scores = ["2:0", "1:1", "0:1", "3:1", "0:0", "1:2"];
        for matchday in 1..=6u32 {
            for pair in 0..2usize {
                let home = teams[(pair * 2 + matchday as usize) % 4];
                let away = teams[(pair * 2 + 1 + matchday as usize) % 4];
                let score = scores[(matchday as usize + pair) % scores.len()];
                matches.push(make_match("2019-2020", 1, matchday, home, away, score));
            }
        }
        QuinielaDataset::from_matches(
            &matches,
            TeamEncoding::from_matches(&matches),
            SeasonEncoding::Offset,
        )
        .unwrap()
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            epochs: 5,
            batch_size: 4,
            learning_rate: 1e-2,
            hidden_dims: vec![8],
            seed: 15,
        }
    }

    #[test]
    fn test_predictions_are_distributions() {
        let dataset = dataset();
        let (model, history) = QuinielaModel::train(&dataset, &config()).unwrap();
        assert_eq!(history.epochs(), 5);

        let probabilities = model.predict_proba(&dataset.rows).unwrap();
        assert_eq!(probabilities.len(), dataset.len());
        for p in &probabilities {
            assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        assert_eq!(model.predict(&dataset.rows).unwrap().len(), dataset.len());
        assert!(model.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_save_load_predicts_identically() {
        let dataset = dataset();
        let (model, _) = QuinielaModel::train(&dataset, &config()).unwrap();
        let file = TempPath::new("roundtrip.model");
        model.save(file.path()).unwrap();

        let loaded = QuinielaModel::load(file.path()).unwrap();
        assert_eq!(loaded.manifest(), model.manifest());
        assert_eq!(
            loaded.predict_proba(&dataset.rows).unwrap(),
            model.predict_proba(&dataset.rows).unwrap()
        );
        assert_eq!(
            loaded.predict(&dataset.rows).unwrap(),
            model.predict(&dataset.rows).unwrap()
        );
        assert_eq!(loaded.encoding().encode("A"), dataset.encoding.encode("A"));
        assert_eq!(loaded.seasons(), &dataset.seasons);
    }

    #[test]
    fn test_foreign_file_is_type_mismatch() {
        let file = TempPath::new("foreign.model");
        let path = file.path();
        std::fs::write(path, b"\x80\x04\x95 not a model at all").unwrap();
        assert!(matches!(
            QuinielaModel::load(path),
            Err(QuinielaError::ModelTypeMismatch { .. })
        ));

        let other_kind = r#"{"kind":"random-forest"}"#.to_string() + "\n";
        std::fs::write(path, other_kind).unwrap();
        assert!(matches!(
            QuinielaModel::load(path),
            Err(QuinielaError::ModelTypeMismatch { .. })
        ));
    }
}
