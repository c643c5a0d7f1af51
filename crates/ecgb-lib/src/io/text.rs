use crate::signal::Annotation;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Parse `sample,symbol` rows. A leading header row (non-numeric first field)
/// and `#` comment lines are skipped.
pub fn parse_annotation_csv(text: &str) -> Result<Vec<Annotation>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading annotation row {}", idx + 1))?;
        let sample_field = record.get(0).unwrap_or("");
        let sample: usize = match sample_field.parse() {
            Ok(sample) => sample,
            Err(_) if idx == 0 => continue,
            Err(_) => anyhow::bail!(
                "annotation row {}: {:?} is not a sample index",
                idx + 1,
                sample_field
            ),
        };
        let symbol_field = record
            .get(1)
            .with_context(|| format!("annotation row {} has no symbol", idx + 1))?;
        let mut chars = symbol_field.chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => anyhow::bail!(
                "annotation row {}: symbol {:?} must be a single character",
                idx + 1,
                symbol_field
            ),
        };
        out.push(Annotation::new(sample, symbol));
    }
    Ok(out)
}

/// Read an annotation table from disk.
pub fn read_annotation_csv(path: &Path) -> Result<Vec<Annotation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_annotation_csv(&text).with_context(|| format!("parsing {}", path.display()))
}
