use rand::Rng;

use crate::{classifier::{Classifier, ModelType}, data::{self, Request}, error::PredictError, labels::LabelMap, ranking::{self, Ranking}};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub ranking: Ranking,
    pub model_type: ModelType,
}

/// Resolves the input, runs the model once and ranks its output.
pub fn predict<M, R>(model: &M, labels: &LabelMap, args: &[String], rng: &mut R) -> Result<Prediction, PredictError>
where
    M: Classifier + ?Sized,
    R: Rng,
{
    let request = Request::from_args(args)?;
    let input = data::resolve(&request, model.input_shape(), rng)?;
    let confidences = model.predict(input)?;
    let ranking = ranking::rank(&confidences, labels)?;

    Ok(Prediction {
        ranking,
        model_type: ModelType::of(model.input_shape()),
    })
}
