//! Wavelet shrinkage denoising tuned for QRS preservation.

pub mod wavelet;

use crate::config::DenoiseConfig;
use crate::error::{PipelineError, Result};
use crate::signal::TimeSeries;
use wavelet::Wavelet;

/// Denoise a single ECG channel with the default db5 / 9-level settings.
pub fn denoise(ts: &TimeSeries) -> Result<TimeSeries> {
    denoise_with_config(ts, &DenoiseConfig::default())
}

/// Decompose, shrink and reconstruct. The output always has the input length.
///
/// The universal threshold is estimated once from the finest detail band; the
/// `zeroed_bands` finest bands are discarded and the remaining detail bands are
/// soft-thresholded. The approximation band carries baseline and is kept.
pub fn denoise_with_config(ts: &TimeSeries, cfg: &DenoiseConfig) -> Result<TimeSeries> {
    let wavelet = Wavelet::db5();
    let required = wavelet.min_signal_len(cfg.levels);
    if ts.len() < required {
        return Err(PipelineError::InsufficientLength {
            len: ts.len(),
            required,
        });
    }
    if let Some(idx) = ts.data.iter().position(|x| !x.is_finite()) {
        return Err(PipelineError::Input(format!(
            "sample {} is not a finite number",
            idx
        )));
    }

    let mut coeffs = wavelet.wavedec(&ts.data, cfg.levels);
    // coeffs = [cA_n, cD_n, ..., cD_1]
    let finest = &coeffs[coeffs.len() - 1];
    let threshold = universal_threshold(finest, cfg.mad_scale);
    log::debug!(
        "denoise: {} levels of {}, threshold {:.6}",
        cfg.levels,
        wavelet.name,
        threshold
    );

    let first_zeroed = coeffs.len().saturating_sub(cfg.zeroed_bands).max(1);
    for (band, detail) in coeffs.iter_mut().enumerate().skip(1) {
        if band >= first_zeroed {
            detail.iter_mut().for_each(|c| *c = 0.0);
        } else {
            soft_threshold(detail, threshold);
        }
    }

    let mut data = wavelet.waverec(&coeffs);
    data.resize(ts.len(), 0.0);
    Ok(TimeSeries { fs: ts.fs, data })
}

/// `median(|d|) / mad_scale * sqrt(2 ln n)` over the finest detail band.
pub fn universal_threshold(finest_detail: &[f64], mad_scale: f64) -> f64 {
    if finest_detail.is_empty() {
        return 0.0;
    }
    let abs: Vec<f64> = finest_detail.iter().map(|c| c.abs()).collect();
    let sigma = median(abs) / mad_scale;
    sigma * (2.0 * (finest_detail.len() as f64).ln()).sqrt()
}

/// Shrink every coefficient toward zero by `threshold`.
pub fn soft_threshold(coeffs: &mut [f64], threshold: f64) {
    for c in coeffs.iter_mut() {
        let magnitude = (c.abs() - threshold).max(0.0);
        *c = magnitude.copysign(*c);
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}
