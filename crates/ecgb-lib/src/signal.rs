use serde::{Deserialize, Serialize};

/// Single-channel waveform sampled at a uniform rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Ground-truth beat label at a sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub sample: usize,
    pub symbol: char,
}

impl Annotation {
    pub fn new(sample: usize, symbol: char) -> Self {
        Self { sample, symbol }
    }
}

/// Sample positions of the annotations, in input order.
pub fn annotation_locations(annotations: &[Annotation]) -> Vec<usize> {
    annotations.iter().map(|ann| ann.sample).collect()
}
