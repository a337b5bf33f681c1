use burn::{config::Config, module::Module, nn::{conv::{Conv2d, Conv2dConfig}, pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig}, Linear, LinearConfig, PaddingConfig2d, ReLU}, tensor::{activation::softmax, backend::Backend, Tensor}};

use crate::{classifier::{InputShape, ShapeKind}, error::ArtifactError};

#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Batch axis first, `null` where undefined.
    pub input_shape: Vec<Option<usize>>,
    pub num_classes: usize,
    #[config(default = 64)]
    pub hidden_size: usize,
    #[config(default = 16)]
    pub conv_channels: usize,
}

impl ClassifierConfig {
    pub fn shape(&self) -> InputShape {
        InputShape::new(self.input_shape.clone())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Network<B>, ArtifactError> {
        if self.num_classes == 0 {
            return Err(ArtifactError::Architecture(String::from("model must have at least one class")));
        }
        let kind = self
            .shape()
            .kind()
            .map_err(|err| ArtifactError::Architecture(err.to_string()))?;

        match kind {
            ShapeKind::Tabular { features: Some(features) } if features > 0 => {
                Ok(Network::Tabular(TabularNet {
                    hidden: LinearConfig::new(features, self.hidden_size).init(device),
                    activation: ReLU::new(),
                    output: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
                }))
            }
            ShapeKind::Tabular { .. } => Err(ArtifactError::Architecture(format!(
                "tabular model needs a positive feature count, got {}",
                self.shape()
            ))),
            ShapeKind::Image { height, width, channels } if height > 0 && width > 0 && channels > 0 => {
                let conv_channels = self.conv_channels;
                Ok(Network::Image(ImageNet {
                    conv1: Conv2dConfig::new([channels, conv_channels], [3, 3])
                        .with_padding(PaddingConfig2d::Explicit(1, 1)).init(device),
                    conv2: Conv2dConfig::new([conv_channels, conv_channels * 2], [3, 3])
                        .with_padding(PaddingConfig2d::Explicit(1, 1)).init(device),
                    pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
                    activation: ReLU::new(),
                    hidden: LinearConfig::new(conv_channels * 2, self.hidden_size).init(device),
                    output: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
                }))
            }
            ShapeKind::Image { .. } => Err(ArtifactError::Architecture(format!(
                "image model needs positive spatial dimensions, got {}",
                self.shape()
            ))),
        }
    }
}

/// The network rebuilt from a `ClassifierConfig`; its variant follows the
/// axis count of the input shape.
#[derive(Debug)]
pub enum Network<B: Backend> {
    Tabular(TabularNet<B>),
    Image(ImageNet<B>),
}

#[derive(Module, Debug)]
pub struct TabularNet<B: Backend> {
    hidden: Linear<B>,
    activation: ReLU,
    output: Linear<B>,
}

impl<B: Backend> TabularNet<B> {
    /// [batch, features] -> [batch, classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.forward(features);
        let x = self.activation.forward(x);
        let x = self.output.forward(x);

        softmax(x, 1)
    }
}

#[derive(Module, Debug)]
pub struct ImageNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: AdaptiveAvgPool2d,
    activation: ReLU,
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> ImageNet<B> {
    /// [batch, height, width, channels] -> [batch, classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        // NHWC -> NCHW
        let x = images.swap_dims(1, 3).swap_dims(2, 3);

        // conv 1 kxHxW
        let x = self.conv1.forward(x);
        let x = self.activation.forward(x);

        // conv 2 2kxHxW
        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);

        // pool 2kx1x1
        let x = self.pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.hidden.forward(x);
        let x = self.activation.forward(x);
        let x = self.output.forward(x);

        softmax(x, 1)
    }
}
