use crate::error::{PipelineError, Result};
use crate::labels::ClassLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-class row of the accuracy summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1: f64,
    pub support: usize,
}

/// Per-class scores keyed by AAMI label, iterated in taxonomy order.
pub type Summary = BTreeMap<ClassLabel, ClassScore>;

/// Aggregates over all scored beats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overall {
    /// Beats with a ground-truth label.
    pub scored: usize,
    pub accuracy: f64,
    pub macro_avg: ClassScore,
    pub weighted_avg: ClassScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub summary: Summary,
    pub overall: Overall,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

/// Score predictions against aligned truth.
///
/// Positions with `None` truth are dropped before counting, so predictions
/// there are neither hits nor false positives. Returns `Ok(None)` when nothing
/// is left to score. Reported classes are those present among the scored
/// truths or predictions; zero denominators yield 0.
pub fn score(
    predicted: &[ClassLabel],
    truth: &[Option<ClassLabel>],
) -> Result<Option<ScoreReport>> {
    if predicted.len() != truth.len() {
        return Err(PipelineError::Input(format!(
            "{} predictions but {} ground-truth entries",
            predicted.len(),
            truth.len()
        )));
    }

    let mut counts: BTreeMap<ClassLabel, Counts> = BTreeMap::new();
    let mut scored = 0usize;
    let mut correct = 0usize;
    for (&pred, actual) in predicted.iter().zip(truth) {
        let Some(actual) = *actual else {
            continue;
        };
        scored += 1;
        counts.entry(pred).or_default().predicted += 1;
        counts.entry(actual).or_default().actual += 1;
        if pred == actual {
            counts.entry(pred).or_default().true_positive += 1;
            correct += 1;
        }
    }
    if scored == 0 {
        return Ok(None);
    }

    let raw: Vec<(ClassLabel, [f64; 3], usize)> = counts
        .iter()
        .map(|(&label, c)| {
            let precision = ratio(c.true_positive, c.predicted);
            let recall = ratio(c.true_positive, c.actual);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            (label, [precision, recall, f1], c.actual)
        })
        .collect();

    let summary: Summary = raw
        .iter()
        .map(|&(label, [p, r, f], support)| (label, rounded(p, r, f, support)))
        .collect();

    let n_classes = raw.len() as f64;
    let mut macro_sum = [0.0; 3];
    let mut weighted_sum = [0.0; 3];
    for (_, metrics, support) in &raw {
        for k in 0..3 {
            macro_sum[k] += metrics[k];
            weighted_sum[k] += metrics[k] * *support as f64;
        }
    }
    let macro_avg = rounded(
        macro_sum[0] / n_classes,
        macro_sum[1] / n_classes,
        macro_sum[2] / n_classes,
        scored,
    );
    let weighted_avg = rounded(
        weighted_sum[0] / scored as f64,
        weighted_sum[1] / scored as f64,
        weighted_sum[2] / scored as f64,
        scored,
    );

    log::info!(
        "scored {} beats, accuracy {:.3}",
        scored,
        correct as f64 / scored as f64
    );

    Ok(Some(ScoreReport {
        summary,
        overall: Overall {
            scored,
            accuracy: round2(correct as f64 / scored as f64),
            macro_avg,
            weighted_avg,
        },
    }))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn rounded(precision: f64, recall: f64, f1: f64, support: usize) -> ClassScore {
    ClassScore {
        precision: round2(precision),
        recall: round2(recall),
        f1: round2(f1),
        support,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
