//! Discrete wavelet transform with half-sample symmetric boundary extension.
//!
//! Coefficient lengths follow the PyWavelets "symmetric" mode: one level maps
//! `n` samples onto `(n + filter_len - 1) / 2` approximation and detail
//! coefficients, and the inverse step yields `2 * n - filter_len + 2` samples.

/// Orthogonal wavelet described by its reconstruction low-pass filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavelet {
    pub name: &'static str,
    dec_lo: Vec<f64>,
    dec_hi: Vec<f64>,
    rec_lo: Vec<f64>,
    rec_hi: Vec<f64>,
}

/// Daubechies 5 scaling filter (10 taps).
const DB5_REC_LO: [f64; 10] = [
    0.160102397974125,
    0.6038292697974729,
    0.7243085284385744,
    0.13842814590110342,
    -0.24229488706619015,
    -0.03224486958502952,
    0.07757149384006515,
    -0.006241490213011705,
    -0.012580751999015526,
    0.003335725285001549,
];

impl Wavelet {
    fn from_rec_lo(name: &'static str, rec_lo: &[f64]) -> Self {
        let len = rec_lo.len();
        let rec_hi: Vec<f64> = (0..len)
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign * rec_lo[len - 1 - k]
            })
            .collect();
        let dec_lo = rec_lo.iter().rev().copied().collect();
        let dec_hi = rec_hi.iter().rev().copied().collect();
        Self {
            name,
            dec_lo,
            dec_hi,
            rec_lo: rec_lo.to_vec(),
            rec_hi,
        }
    }

    pub fn db5() -> Self {
        Self::from_rec_lo("db5", &DB5_REC_LO)
    }

    pub fn filter_len(&self) -> usize {
        self.rec_lo.len()
    }

    /// Shortest signal that supports `levels` decompositions without every
    /// coefficient being dominated by boundary extension. Saturates at
    /// `usize::MAX` for level counts no signal could satisfy.
    pub fn min_signal_len(&self, levels: usize) -> usize {
        u32::try_from(levels)
            .ok()
            .and_then(|levels| 1usize.checked_shl(levels))
            .and_then(|scale| scale.checked_mul(self.filter_len() - 1))
            .unwrap_or(usize::MAX)
    }

    /// One analysis step: `(approximation, detail)`.
    pub fn dwt(&self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        if x.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let f = self.filter_len();
        let out_len = (x.len() + f - 1) / 2;
        let mut approx = Vec::with_capacity(out_len);
        let mut detail = Vec::with_capacity(out_len);
        for o in 0..out_len {
            let centre = 2 * o as isize + 1;
            let mut a = 0.0;
            let mut d = 0.0;
            for j in 0..f {
                let sample = symmetric(x, centre - j as isize);
                a += self.dec_lo[j] * sample;
                d += self.dec_hi[j] * sample;
            }
            approx.push(a);
            detail.push(d);
        }
        (approx, detail)
    }

    /// One synthesis step. `approx` and `detail` must have equal length.
    pub fn idwt(&self, approx: &[f64], detail: &[f64]) -> Vec<f64> {
        debug_assert_eq!(approx.len(), detail.len());
        let f = self.filter_len();
        let n = approx.len().min(detail.len());
        let out_len = (2 * n + 2).saturating_sub(f);
        let mut out = vec![0.0; out_len];
        for (i, slot) in out.iter_mut().enumerate() {
            let shifted = i + f - 2;
            // coefficient k contributes through filter tap shifted - 2k
            let k_min = (shifted + 1).saturating_sub(f).div_ceil(2);
            let k_max = (shifted / 2).min(n.saturating_sub(1));
            let mut acc = 0.0;
            for k in k_min..=k_max {
                if k >= n {
                    break;
                }
                let tap = shifted - 2 * k;
                acc += approx[k] * self.rec_lo[tap] + detail[k] * self.rec_hi[tap];
            }
            *slot = acc;
        }
        out
    }

    /// Multilevel decomposition: `[cA_levels, cD_levels, ..., cD_1]`.
    pub fn wavedec(&self, x: &[f64], levels: usize) -> Vec<Vec<f64>> {
        let mut details = Vec::with_capacity(levels);
        let mut approx = x.to_vec();
        for _ in 0..levels {
            let (a, d) = self.dwt(&approx);
            details.push(d);
            approx = a;
        }
        let mut coeffs = Vec::with_capacity(levels + 1);
        coeffs.push(approx);
        coeffs.extend(details.into_iter().rev());
        coeffs
    }

    /// Inverse of [`Wavelet::wavedec`]. An approximation band one longer than
    /// the next detail band loses its trailing coefficient.
    pub fn waverec(&self, coeffs: &[Vec<f64>]) -> Vec<f64> {
        let Some((first, details)) = coeffs.split_first() else {
            return Vec::new();
        };
        let mut approx = first.clone();
        for detail in details {
            if approx.len() == detail.len() + 1 {
                approx.pop();
            }
            approx = self.idwt(&approx, detail);
        }
        approx
    }
}

/// Half-sample symmetric extension: `... x1 x0 | x0 x1 ... xn-1 | xn-1 xn-2 ...`.
fn symmetric(x: &[f64], index: isize) -> f64 {
    let n = x.len() as isize;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    if m < n {
        x[m as usize]
    } else {
        x[(period - 1 - m) as usize]
    }
}
