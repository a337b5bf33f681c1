use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single prediction request. Each one is rendered into the
/// error payload through its `Display` text.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("cannot decode image '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{0}")]
    ShapeMismatch(String),

    #[error("invalid input: {0}")]
    InputParse(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Start-up failures. Without a model there is nothing to answer with, so
/// these never reach the error payload.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("cannot load model config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("cannot load model weights '{}': {message}", path.display())]
    Record { path: PathBuf, message: String },

    #[error("unsupported model: {0}")]
    Architecture(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
