use crate::error::{PipelineError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Deepest decomposition accepted from configuration.
pub const MAX_DENOISE_LEVELS: usize = 20;

/// Wavelet denoising parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Number of DWT decomposition levels.
    pub levels: usize,
    /// Count of finest detail bands that are zeroed instead of thresholded.
    pub zeroed_bands: usize,
    /// MAD to standard deviation scale for Gaussian noise.
    pub mad_scale: f64,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            levels: 9,
            zeroed_bands: 2,
            mad_scale: 0.6745,
        }
    }
}

/// Parameters of the beat classification pipeline.
///
/// `half_window` is tied to the classifier input shape (`2 * half_window`
/// samples); it is checked against the classifier at pipeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub denoise: DenoiseConfig,
    /// Samples on each side of a peak in an extracted segment.
    pub half_window: usize,
    /// Minimum spacing between detected peaks, in samples.
    pub min_peak_distance: usize,
    /// Maximum peak-to-annotation distance accepted by the aligner, inclusive.
    pub match_tolerance: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            denoise: DenoiseConfig::default(),
            half_window: 128,
            min_peak_distance: 150,
            match_tolerance: 128,
        }
    }
}

impl PipelineConfig {
    pub fn window_len(&self) -> usize {
        self.half_window * 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.denoise.levels == 0 || self.denoise.levels > MAX_DENOISE_LEVELS {
            return Err(PipelineError::Config(format!(
                "denoise.levels must be between 1 and {}, got {}",
                MAX_DENOISE_LEVELS, self.denoise.levels
            )));
        }
        if self.denoise.zeroed_bands > self.denoise.levels {
            return Err(PipelineError::Config(format!(
                "denoise.zeroed_bands ({}) exceeds denoise.levels ({})",
                self.denoise.zeroed_bands, self.denoise.levels
            )));
        }
        if !(self.denoise.mad_scale.is_finite() && self.denoise.mad_scale > 0.0) {
            return Err(PipelineError::Config(
                "denoise.mad_scale must be a positive number".into(),
            ));
        }
        if self.half_window == 0 {
            return Err(PipelineError::Config("half_window must be >= 1".into()));
        }
        if self.min_peak_distance == 0 {
            return Err(PipelineError::Config(
                "min_peak_distance must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a TOML pipeline configuration; omitted keys keep their defaults.
pub fn parse_config(text: &str) -> Result<PipelineConfig> {
    let cfg: PipelineConfig =
        toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read and validate a TOML pipeline configuration from disk.
pub fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg = parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
