//! Beat classifier seam.
//!
//! The pipeline only sees `SegmentBatch -> [batch, 5]` probability rows in
//! [`ClassLabel::ALL`] order. Backends are constructed by the caller and
//! passed in; nothing here is loaded globally.

use crate::error::{PipelineError, Result};
use crate::labels::ClassLabel;
use crate::segments::{Segment, SegmentBatch};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Opaque scoring function from fixed-width segments to class probabilities.
pub trait BeatClassifier: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Segment width the backend was built for.
    fn window_len(&self) -> usize;

    /// One probability row per segment, in batch order.
    fn classify(&self, batch: &SegmentBatch) -> Result<Vec<Vec<f64>>>;
}

/// Assigns every beat to the same class. Useful as a baseline and in tests.
#[derive(Debug, Clone)]
pub struct ConstantClassifier {
    label: ClassLabel,
    window: usize,
}

impl ConstantClassifier {
    pub fn new(label: ClassLabel, window: usize) -> Self {
        Self { label, window }
    }
}

impl BeatClassifier for ConstantClassifier {
    fn name(&self) -> &str {
        "constant"
    }

    fn window_len(&self) -> usize {
        self.window
    }

    fn classify(&self, batch: &SegmentBatch) -> Result<Vec<Vec<f64>>> {
        let mut row = vec![0.0; ClassLabel::COUNT];
        row[self.label.index()] = 1.0;
        Ok(vec![row; batch.len()])
    }
}

/// On-disk template set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    pub templates: BTreeMap<ClassLabel, Vec<f64>>,
}

fn default_temperature() -> f64 {
    1.0
}

/// Nearest-template classifier: softmax over negative Euclidean distance
/// between the mean-removed segment and each mean-removed class template.
/// Classes without a template get probability 0.
#[derive(Debug, Clone)]
pub struct TemplateClassifier {
    window: usize,
    temperature: f64,
    templates: Vec<(ClassLabel, Vec<f64>)>,
}

impl TemplateClassifier {
    pub fn new(file: TemplateFile) -> Result<Self> {
        if file.templates.is_empty() {
            return Err(PipelineError::Input("template set is empty".into()));
        }
        if !(file.temperature.is_finite() && file.temperature > 0.0) {
            return Err(PipelineError::Input(format!(
                "template temperature must be positive, got {}",
                file.temperature
            )));
        }
        let mut window = None;
        let mut templates = Vec::with_capacity(file.templates.len());
        for (label, samples) in file.templates {
            match window {
                None => window = Some(samples.len()),
                Some(w) if w != samples.len() => {
                    return Err(PipelineError::Input(format!(
                        "template {} has {} samples, expected {}",
                        label,
                        samples.len(),
                        w
                    )))
                }
                Some(_) => {}
            }
            if samples.iter().any(|x| !x.is_finite()) {
                return Err(PipelineError::Input(format!(
                    "template {} contains non-finite samples",
                    label
                )));
            }
            templates.push((label, centred(&samples)));
        }
        Ok(Self {
            window: window.unwrap_or_default(),
            temperature: file.temperature,
            templates,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: TemplateFile = serde_json::from_str(text)
            .map_err(|e| PipelineError::Input(format!("invalid template file: {}", e)))?;
        Self::new(file)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let classifier =
            Self::from_json(&text).with_context(|| format!("loading templates {}", path.display()))?;
        Ok(classifier)
    }

    fn score(&self, segment: &Segment) -> Result<Vec<f64>> {
        if segment.samples.len() != self.window {
            return Err(PipelineError::Classifier(format!(
                "segment at {} has {} samples, templates expect {}",
                segment.peak,
                segment.samples.len(),
                self.window
            )));
        }
        let x = centred(&segment.samples);
        let logits: Vec<(ClassLabel, f64)> = self
            .templates
            .iter()
            .map(|(label, t)| {
                let dist = x
                    .iter()
                    .zip(t)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                (*label, -dist / self.temperature)
            })
            .collect();
        let max = logits
            .iter()
            .map(|(_, l)| *l)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut row = vec![0.0; ClassLabel::COUNT];
        let mut total = 0.0;
        for (label, logit) in logits {
            let p = (logit - max).exp();
            row[label.index()] = p;
            total += p;
        }
        row.iter_mut().for_each(|p| *p /= total);
        Ok(row)
    }
}

impl BeatClassifier for TemplateClassifier {
    fn name(&self) -> &str {
        "templates"
    }

    fn window_len(&self) -> usize {
        self.window
    }

    fn classify(&self, batch: &SegmentBatch) -> Result<Vec<Vec<f64>>> {
        batch.iter().map(|segment| self.score(segment)).collect()
    }
}

fn centred(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter().map(|x| x - mean).collect()
}

/// Index of the highest probability; the first one wins ties.
pub fn argmax(row: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &p) in row.iter().enumerate() {
        match best {
            Some((_, top)) if p <= top => {}
            _ => best = Some((idx, p)),
        }
    }
    best.map(|(idx, _)| idx)
}
