use crate::signal::TimeSeries;
use serde::{Deserialize, Serialize};

/// Parameters of the beat locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatLocatorConfig {
    /// Minimum spacing between two reported peaks, in samples.
    pub min_distance: usize,
    /// Samples required on each side of a peak for a full classifier window.
    pub edge_margin: usize,
}

impl Default for BeatLocatorConfig {
    fn default() -> Self {
        Self {
            min_distance: 150,
            edge_margin: 128,
        }
    }
}

/// Locate candidate beat centres in a denoised waveform.
///
/// Returns strictly increasing indices, at least `min_distance` apart, each
/// satisfying `edge_margin <= idx < len - edge_margin`.
pub fn locate_beats(ts: &TimeSeries, cfg: &BeatLocatorConfig) -> Vec<usize> {
    let maxima = local_maxima(&ts.data);
    let spaced = enforce_min_distance(&ts.data, &maxima, cfg.min_distance);
    let peaks = filter_edges(&spaced, ts.len(), cfg.edge_margin);
    log::debug!(
        "beat locator: {} local maxima, {} after spacing, {} inside margins",
        maxima.len(),
        spaced.len(),
        peaks.len()
    );
    peaks
}

/// Strict local maxima. A flat top reports its middle sample (rounded down).
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Suppress peaks closer than `min_distance` to a higher one.
///
/// Peaks are visited from highest to lowest; on equal height the later index
/// wins priority. Surviving peaks stay in index order.
pub fn enforce_min_distance(data: &[f64], peaks: &[usize], min_distance: usize) -> Vec<usize> {
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut priority: Vec<usize> = (0..peaks.len()).collect();
    priority.sort_by(|&a, &b| data[peaks[a]].total_cmp(&data[peaks[b]]));

    let mut keep = vec![true; peaks.len()];
    for &i in priority.iter().rev() {
        if !keep[i] {
            continue;
        }
        let mut k = i;
        while k > 0 && peaks[i] - peaks[k - 1] < min_distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = i + 1;
        while k < peaks.len() && peaks[k] - peaks[i] < min_distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Drop peaks whose window would cross either end of the waveform.
pub fn filter_edges(peaks: &[usize], len: usize, margin: usize) -> Vec<usize> {
    let upper = len.saturating_sub(margin);
    peaks
        .iter()
        .copied()
        .filter(|&p| p >= margin && p < upper)
        .collect()
}
