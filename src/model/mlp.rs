//! Outcome classifier network
//!
//! Architecture: Input(9) → Hidden1(64) → ReLU
//!                        → Hidden2(32) → ReLU
//!                        → head(3) logits for Local / Tie / Visitor

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::data::dataset::FeatureRow;
use crate::{QuinielaError, Result, Winner};

/// Configuration for the outcome network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeNetConfig {
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [64, 32] for two layers)
    pub hidden_dims: Vec<usize>,
    pub num_classes: usize,
}

impl Default for OutcomeNetConfig {
    fn default() -> Self {
        OutcomeNetConfig {
            input_dim: FeatureRow::DIM,
            hidden_dims: vec![64, 32],
            num_classes: Winner::COUNT,
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

/// Seeding the backend RNG and drawing the weights must not interleave
/// with another network being built
static INIT_LOCK: Mutex<()> = Mutex::new(());

impl<B: Backend> HiddenBlock<B> {
    fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: linear(device, in_dim, out_dim),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron over the fixture features
#[derive(Module, Debug)]
pub struct OutcomeNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    head: Linear<B>,
}

impl<B: Backend> OutcomeNet<B> {
    /// Create a network whose weights depend only on `seed`
    pub fn new(device: &B::Device, config: &OutcomeNetConfig, seed: u64) -> Self {
        let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        B::seed(seed);

        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        OutcomeNet {
            hidden,
            head: linear(device, in_dim, config.num_classes),
        }
    }

    /// Forward pass: [batch, input_dim] → logits [batch, num_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.head.forward(x)
    }

    /// Serialize the weights
    pub fn to_bytes(&self) -> Result<Vec<u8>>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), ())
            .map_err(|e| QuinielaError::Model(format!("failed to record weights: {}", e)))
    }

    /// Restore weights produced by [`OutcomeNet::to_bytes`]
    pub fn from_bytes(device: &B::Device, config: &OutcomeNetConfig, bytes: Vec<u8>) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(bytes, device)
            .map_err(|e| QuinielaError::Model(format!("failed to load weights: {}", e)))?;

        let model = Self::new(device, config, 0);
        Ok(model.load_record(record))
    }
}

fn linear<B: Backend>(device: &B::Device, in_dim: usize, out_dim: usize) -> Linear<B> {
    LinearConfig::new(in_dim, out_dim)
        .with_initializer(Initializer::KaimingUniform {
            gain: 1.0 / 3.0f64.sqrt(),
            fan_out_only: false,
        })
        .init(device)
}

/// Softmax over logits, one `[p_local, p_tie, p_visitor]` per row
pub fn class_probabilities<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<[f32; 3]>> {
    let [_batch, classes] = logits.dims();
    if classes != Winner::COUNT {
        return Err(QuinielaError::Model(format!(
            "expected {} classes, network has {}",
            Winner::COUNT,
            classes
        )));
    }

    let values = softmax(logits, 1)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| QuinielaError::Model(format!("failed to read probabilities: {:?}", e)))?;

    Ok(values
        .chunks_exact(Winner::COUNT)
        .map(|p| [p[0], p[1], p[2]])
        .collect())
}

/// Most likely class; the first one wins on equal probability
pub fn most_likely(probabilities: &[f32; 3]) -> Winner {
    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate() {
        if *p > probabilities[best] {
            best = i;
        }
    }
    Winner::from_code(best).unwrap_or(Winner::Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_outcome_net_shapes() {
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device, &OutcomeNetConfig::default(), 15);

        let features = Tensor::<TestBackend, 2>::zeros([4, FeatureRow::DIM], &device);
        let logits = model.forward(features);
        assert_eq!(logits.dims(), [4, 3]);

        let probabilities = class_probabilities(logits).unwrap();
        assert_eq!(probabilities.len(), 4);
        for p in probabilities {
            assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_same_seed_same_weights() {
        let device = Default::default();
        let config = OutcomeNetConfig::default();
        let a = OutcomeNet::<TestBackend>::new(&device, &config, 7);
        let b = OutcomeNet::<TestBackend>::new(&device, &config, 7);

        let features = Tensor::<TestBackend, 2>::ones([2, FeatureRow::DIM], &device);
        let la = a.forward(features.clone()).into_data().to_vec::<f32>().unwrap();
        let lb = b.forward(features).into_data().to_vec::<f32>().unwrap();
        assert_eq!(la, lb);

        let c = OutcomeNet::<TestBackend>::new(&device, &config, 8);
        let features = Tensor::<TestBackend, 2>::ones([2, FeatureRow::DIM], &device);
        let lc = c.forward(features).into_data().to_vec::<f32>().unwrap();
        assert_ne!(la, lc);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let device = Default::default();
        let config = OutcomeNetConfig {
            input_dim: FeatureRow::DIM,
            hidden_dims: vec![8],
            num_classes: 3,
        };
        let model = OutcomeNet::<TestBackend>::new(&device, &config, 3);
        let restored =
            OutcomeNet::<TestBackend>::from_bytes(&device, &config, model.to_bytes().unwrap()).unwrap();

        let features = Tensor::<TestBackend, 2>::ones([3, FeatureRow::DIM], &device);
        assert_eq!(
            model.forward(features.clone()).into_data().to_vec::<f32>().unwrap(),
            restored.forward(features).into_data().to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn test_most_likely() {
        assert_eq!(most_likely(&[0.2, 0.5, 0.3]), Winner::Tie);
        assert_eq!(most_likely(&[0.2, 0.3, 0.5]), Winner::Visitor);
        assert_eq!(most_likely(&[0.4, 0.4, 0.2]), Winner::Local);
    }
}
