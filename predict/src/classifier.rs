use serde::Serialize;

use crate::error::PredictError;

/// Expected input shape of a model, batch axis included. Undefined axes
/// (normally the batch axis) are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputShape(Vec<Option<usize>>);

/// What an `InputShape` describes once its axes are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Tabular { features: Option<usize> },
    Image { height: usize, width: usize, channels: usize },
}

impl InputShape {
    pub fn new(axes: Vec<Option<usize>>) -> Self {
        Self(axes)
    }

    pub fn axes(&self) -> &[Option<usize>] {
        &self.0
    }

    pub fn is_image(&self) -> bool {
        self.0.len() == 4
    }

    pub fn kind(&self) -> Result<ShapeKind, PredictError> {
        match self.0.as_slice() {
            [_, features] => Ok(ShapeKind::Tabular { features: *features }),
            [_, height, width, channels] => Ok(ShapeKind::Image {
                height: self.defined(*height, "height")?,
                width: self.defined(*width, "width")?,
                channels: self.defined(*channels, "channels")?,
            }),
            axes => Err(PredictError::ShapeMismatch(format!(
                "unsupported model input shape with {} axes, expected 2 (tabular) or 4 (image)",
                axes.len()
            ))),
        }
    }

    fn defined(&self, axis: Option<usize>, name: &str) -> Result<usize, PredictError> {
        axis.ok_or_else(|| {
            PredictError::ShapeMismatch(format!("model input shape {self} leaves {name} undefined"))
        })
    }
}

impl std::fmt::Display for InputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let axes: Vec<String> = self
            .0
            .iter()
            .map(|axis| axis.map_or_else(|| "None".to_string(), |len| len.to_string()))
            .collect();
        write!(f, "({})", axes.join(", "))
    }
}

/// A single-sample input, batch axis implied.
#[derive(Debug, Clone, PartialEq)]
pub enum InputTensor {
    /// Shape (1, features).
    Tabular { features: Vec<f32> },
    /// Shape (1, height, width, channels), row-major.
    Image {
        pixels: Vec<f32>,
        height: usize,
        width: usize,
        channels: usize,
    },
}

impl InputTensor {
    pub fn dims(&self) -> Vec<usize> {
        match self {
            InputTensor::Tabular { features } => vec![1, features.len()],
            InputTensor::Image { height, width, channels, .. } => vec![1, *height, *width, *channels],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Image,
    Tabular,
}

impl ModelType {
    /// Derived from the model alone, never from the request.
    pub fn of(shape: &InputShape) -> Self {
        if shape.is_image() {
            ModelType::Image
        } else {
            ModelType::Tabular
        }
    }
}

/// A loaded, read-only classification model.
pub trait Classifier {
    fn input_shape(&self) -> &InputShape;

    /// Returns the confidence vector of the single batch element.
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, PredictError>;
}
