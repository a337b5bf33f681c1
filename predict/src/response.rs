use std::io::{self, Write};

use serde::Serialize;

use crate::{classifier::ModelType, error::PredictError, pipeline::Prediction};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Serialize)]
struct ClassConfidence<'a> {
    class: &'a str,
    confidence: f64,
}

#[derive(Serialize)]
struct SuccessPayload<'a> {
    predicted_class: &'a str,
    confidence: f64,
    top_3_predictions: Vec<ClassConfidence<'a>>,
    status: &'static str,
    model_type: ModelType,
}

#[derive(Serialize)]
struct ErrorPayload {
    error: String,
    status: &'static str,
}

/// Renders `outcome` as a single JSON line and returns the exit status.
pub fn emit<W: Write>(out: &mut W, outcome: &Result<Prediction, PredictError>) -> io::Result<u8> {
    let (line, status) = match outcome {
        Ok(prediction) => (success_line(prediction)?, EXIT_SUCCESS),
        Err(err) => (error_line(err)?, EXIT_FAILURE),
    };
    writeln!(out, "{line}")?;
    out.flush()?;

    Ok(status)
}

// Confidences are widened to f64 so they print with full double precision.
fn success_line(prediction: &Prediction) -> io::Result<String> {
    let ranking = &prediction.ranking;
    let payload = SuccessPayload {
        predicted_class: &ranking.best.label,
        confidence: ranking.best.confidence as f64,
        top_3_predictions: ranking
            .top
            .iter()
            .map(|ranked| ClassConfidence { class: &ranked.label, confidence: ranked.confidence as f64 })
            .collect(),
        status: "success",
        model_type: prediction.model_type,
    };

    Ok(serde_json::to_string(&payload)?)
}

fn error_line(err: &PredictError) -> io::Result<String> {
    let payload = ErrorPayload { error: err.to_string(), status: "error" };

    Ok(serde_json::to_string(&payload)?)
}
