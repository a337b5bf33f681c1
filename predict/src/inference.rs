use std::path::Path;

use burn::{config::Config, module::Module, record::{CompactRecorder, Recorder, RecorderError}, tensor::{backend::Backend, Data, Shape, Tensor}};
use tracing::debug;

use crate::{classifier::{Classifier, InputShape, InputTensor}, config::{Settings, MODEL_CONFIG_FILE, MODEL_RECORD_FILE}, error::{ArtifactError, PredictError}, model::{ClassifierConfig, Network}};

/// A `Classifier` backed by a burn network restored from disk.
#[derive(Debug)]
pub struct BurnClassifier<B: Backend> {
    config: ClassifierConfig,
    input_shape: InputShape,
    network: Network<B>,
    device: B::Device,
}

impl<B: Backend> BurnClassifier<B> {
    /// Wraps a freshly initialized (untrained) network.
    pub fn init(config: ClassifierConfig, device: B::Device) -> Result<Self, ArtifactError> {
        let network = config.init::<B>(&device)?;
        let input_shape = config.shape();

        Ok(Self { config, input_shape, network, device })
    }

    /// Restores the network described by `config.json` with the weights in
    /// `model.mpk`.
    pub fn load(settings: &Settings, device: B::Device) -> Result<Self, ArtifactError> {
        let config_path = settings.model_config_path();
        let record_path = settings.model_record_path();
        debug!("loading model config from {}", config_path.display());

        let config = ClassifierConfig::load(&config_path).map_err(|err| ArtifactError::Config {
            path: config_path.clone(),
            message: format!("{err:?}"),
        })?;
        let classifier = Self::init(config, device)?;

        let recorder = CompactRecorder::new();
        let record_err = |err: RecorderError| ArtifactError::Record {
            path: record_path.with_extension("mpk"),
            message: format!("{err:?}"),
        };
        let network = match classifier.network {
            Network::Tabular(net) => Network::Tabular(
                net.load_record(recorder.load(record_path.clone(), &classifier.device).map_err(record_err)?),
            ),
            Network::Image(net) => Network::Image(
                net.load_record(recorder.load(record_path.clone(), &classifier.device).map_err(record_err)?),
            ),
        };
        debug!("restored {} model from {}", classifier.input_shape, record_path.display());

        Ok(Self { network, ..classifier })
    }

    /// Writes `config.json` and `model.mpk` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(dir)?;
        self.config.save(dir.join(MODEL_CONFIG_FILE))?;

        let record_path = dir.join(MODEL_RECORD_FILE);
        let result = match &self.network {
            Network::Tabular(net) => net.clone().save_file(record_path.clone(), &CompactRecorder::new()),
            Network::Image(net) => net.clone().save_file(record_path.clone(), &CompactRecorder::new()),
        };
        result.map_err(|err: RecorderError| ArtifactError::Record {
            path: record_path.with_extension("mpk"),
            message: format!("{err:?}"),
        })
    }

    pub fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    fn mismatch(&self, input: &InputTensor) -> PredictError {
        PredictError::Inference(format!(
            "input of shape {:?} does not fit model input {}",
            input.dims(),
            self.input_shape
        ))
    }
}

impl<B: Backend> Classifier for BurnClassifier<B> {
    fn input_shape(&self) -> &InputShape {
        &self.input_shape
    }

    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, PredictError> {
        if input.dims().iter().skip(1).map(|len| Some(*len)).ne(self.input_shape.axes().iter().skip(1).copied()) {
            return Err(self.mismatch(&input));
        }

        let output = match (&self.network, input) {
            (Network::Tabular(net), InputTensor::Tabular { features }) => {
                let len = features.len();
                let features = Tensor::<B, 2>::from_data(Data::new(features, Shape::new([1, len])).convert(), &self.device);
                net.forward(features)
            }
            (Network::Image(net), InputTensor::Image { pixels, height, width, channels }) => {
                let shape = Shape::new([1, height, width, channels]);
                let images = Tensor::<B, 4>::from_data(Data::new(pixels, shape).convert(), &self.device);
                net.forward(images)
            }
            (_, input) => return Err(self.mismatch(&input)),
        };

        Ok(output.flatten::<1>(0, 1).into_data().convert::<f32>().value)
    }
}
