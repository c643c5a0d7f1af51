use crate::labels::ClassLabel;

/// For every peak, the label of the nearest annotation within `tolerance`
/// samples (inclusive), or `None`.
///
/// `annotations` pairs sample positions with already-mapped labels; order does
/// not matter. Several peaks may match the same annotation. When a peak sits
/// exactly halfway between two annotations the earlier one is taken.
pub fn align_annotations(
    peaks: &[usize],
    annotations: &[(usize, Option<ClassLabel>)],
    tolerance: usize,
) -> Vec<Option<ClassLabel>> {
    if annotations.is_empty() {
        return vec![None; peaks.len()];
    }
    let mut sorted = annotations.to_vec();
    // stable: equal samples keep input order, first one wins
    sorted.sort_by_key(|&(sample, _)| sample);

    peaks
        .iter()
        .map(|&peak| {
            let (sample, label) = nearest(&sorted, peak);
            if sample.abs_diff(peak) <= tolerance {
                label
            } else {
                None
            }
        })
        .collect()
}

/// Nearest entry by absolute distance in a non-empty, sample-sorted slice.
fn nearest(sorted: &[(usize, Option<ClassLabel>)], peak: usize) -> (usize, Option<ClassLabel>) {
    // first entry with sample >= peak
    let upper = sorted.partition_point(|&(sample, _)| sample < peak);
    if upper == 0 {
        return sorted[0];
    }
    let before = sorted[upper - 1].0;
    // earliest entry sharing the `before` position
    let before = sorted[sorted.partition_point(|&(sample, _)| sample < before)];
    match sorted.get(upper) {
        Some(&after) if after.0 - peak < peak - before.0 => after,
        _ => before,
    }
}
