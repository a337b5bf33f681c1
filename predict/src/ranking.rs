use std::cmp::Ordering;

use derive_new::new;
use tracing::trace;

use crate::{error::PredictError, labels::LabelMap};

pub const TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, new)]
pub struct RankedClass {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub best: RankedClass,
    /// Highest confidence first, at most `TOP_K` entries.
    pub top: Vec<RankedClass>,
}

pub fn rank(confidences: &[f32], labels: &LabelMap) -> Result<Ranking, PredictError> {
    let best = argmax(confidences)
        .ok_or_else(|| PredictError::Inference(String::from("model returned an empty confidence vector")))?;
    let ranked = |index: usize| RankedClass::new(index, labels.label(index), confidences[index]);

    let ranking = Ranking {
        best: ranked(best),
        top: top_k(confidences, TOP_K).into_iter().map(ranked).collect(),
    };
    trace!("best {} ({}) out of {}", ranking.best.label, ranking.best.confidence, confidences.len());

    Ok(ranking)
}

/// First index of the largest value. NaN wins over any number.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, value) in values.iter().enumerate() {
        match best {
            Some(current) if ascending(value, &values[current]) != Ordering::Greater => {}
            _ => best = Some(idx),
        }
        if value.is_nan() {
            break;
        }
    }
    best
}

/// The last `k` indices of a stable ascending sort, reversed. Equal values
/// therefore come out with the larger index first.
pub fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| ascending(&values[*a], &values[*b]));

    order.into_iter().rev().take(k).collect()
}

/// Numeric order with NaN above everything.
fn ascending(a: &f32, b: &f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    }
}
