use crate::error::{PipelineError, Result};
use crate::signal::TimeSeries;

/// Fixed-width window of a waveform centred on a detected peak.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub peak: usize,
    pub samples: Vec<f64>,
}

/// Batch of equally sized segments laid out as `[batch, window, 1]`.
///
/// Segment `i` belongs to peak `i` of the locator output; classifiers must
/// preserve that order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBatch {
    window: usize,
    segments: Vec<Segment>,
}

impl SegmentBatch {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `[batch, window, channels]`, channels always 1.
    pub fn shape(&self) -> [usize; 3] {
        [self.segments.len(), self.window, 1]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Row-major `[batch, window, 1]` buffer for tensor backends.
    pub fn to_tensor(&self) -> Vec<f32> {
        self.segments
            .iter()
            .flat_map(|s| s.samples.iter().map(|&x| x as f32))
            .collect()
    }
}

/// Slice `data[peak - half_window .. peak + half_window]` for every peak.
///
/// Peaks come from the beat locator and must already be inside the margins; a
/// peak whose window would leave the waveform is an input error rather than
/// being skipped, because dropping it would shift peak/segment alignment.
pub fn extract_segments(
    ts: &TimeSeries,
    peaks: &[usize],
    half_window: usize,
) -> Result<SegmentBatch> {
    let window = half_window * 2;
    let mut segments = Vec::with_capacity(peaks.len());
    for &peak in peaks {
        if peak < half_window || peak + half_window > ts.len() {
            return Err(PipelineError::Input(format!(
                "peak {} leaves no room for a {}-sample window in a {}-sample signal",
                peak,
                window,
                ts.len()
            )));
        }
        segments.push(Segment {
            peak,
            samples: ts.data[peak - half_window..peak + half_window].to_vec(),
        });
    }
    Ok(SegmentBatch { window, segments })
}
