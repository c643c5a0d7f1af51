#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{f64::consts::PI, fs, path::Path, path::PathBuf};

pub const FS: f64 = 360.0;
pub const LEN: usize = 5000;

/// Beat centres and widths: narrow at 1000 and 4000, a wide complex at 2500.
pub const BEATS: [(usize, f64); 3] = [(1000, 5.0), (2500, 12.0), (4000, 5.0)];

pub fn synthetic_ecg(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| {
            let t = i as f64;
            let mut v = 0.1 * (2.0 * PI * t / FS).sin() + rng.gen_range(-0.03..0.03);
            for &(centre, width) in &BEATS {
                v += 1.5 * (-0.5 * ((t - centre as f64) / width).powi(2)).exp();
            }
            v
        })
        .collect()
}

pub fn write_samples(dir: &Path, name: &str, samples: &[f64]) -> PathBuf {
    let path = dir.join(name);
    let text: String = samples.iter().map(|v| format!("{}\n", v)).collect();
    fs::write(&path, text).expect("write samples");
    path
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write file");
    path
}

/// Gaussian complex of the given width, centred in a 256-sample window.
pub fn template(width: f64) -> Vec<f64> {
    (0..256)
        .map(|i| 1.5 * (-0.5 * ((i as f64 - 128.0) / width).powi(2)).exp())
        .collect()
}

pub fn arg(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

/// Pack 12-bit samples two per three bytes (WFDB format 212).
pub fn encode_212(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::new();
    for pair in samples.chunks(2) {
        let a = pair[0] as u16 & 0x0FFF;
        let b = pair.get(1).map_or(0, |&b| b as u16 & 0x0FFF);
        out.push((a & 0xFF) as u8);
        out.push(((a >> 8) | ((b >> 8) << 4)) as u8);
        if pair.len() == 2 {
            out.push((b & 0xFF) as u8);
        }
    }
    out
}

/// MIT annotation stream; gaps wider than the 10-bit field go through SKIP.
pub fn encode_atr(beats: &[(usize, u16)]) -> Vec<u8> {
    let word = |code: u16, field: u16| ((code << 10) | field).to_le_bytes();
    let mut out = Vec::new();
    let mut last = 0;
    for &(sample, code) in beats {
        let mut diff = sample - last;
        if diff > 0x03FF {
            out.extend(word(59, 0));
            out.extend(((diff >> 16) as u16).to_le_bytes());
            out.extend((diff as u16).to_le_bytes());
            diff = 0;
        }
        out.extend(word(code, diff as u16));
        last = sample;
    }
    out.extend(0u16.to_le_bytes());
    out
}

/// Write `<dir>/rec.{hea,dat,atr}` holding `samples` at gain 200 as a single
/// MLII channel, with the synthetic beats annotated N, V, N.
pub fn write_record(dir: &Path, samples: &[f64]) -> PathBuf {
    let adc: Vec<i16> = samples.iter().map(|v| (v * 200.0).round() as i16).collect();
    let header = format!(
        "rec 1 {} {}\nrec.dat 212 200 12 0 0 0 0 MLII\n",
        FS,
        samples.len()
    );
    fs::write(dir.join("rec.hea"), header).expect("write header");
    fs::write(dir.join("rec.dat"), encode_212(&adc)).expect("write data");
    let beats = [(BEATS[0].0, 1), (BEATS[1].0, 5), (BEATS[2].0, 1)];
    fs::write(dir.join("rec.atr"), encode_atr(&beats)).expect("write annotations");
    dir.join("rec")
}
