use crate::error::PipelineError;
use crate::signal::{Annotation, TimeSeries};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// MIT annotation codes 0..=41 and their symbols; `None` for unused codes.
const MIT_SYMBOLS: [Option<char>; 42] = [
    None,
    Some('N'),
    Some('L'),
    Some('R'),
    Some('a'),
    Some('V'),
    Some('F'),
    Some('J'),
    Some('A'),
    Some('S'),
    Some('E'),
    Some('j'),
    Some('/'),
    Some('Q'),
    Some('~'),
    None,
    Some('|'),
    None,
    Some('s'),
    Some('T'),
    Some('*'),
    Some('D'),
    Some('"'),
    Some('='),
    Some('p'),
    Some('B'),
    Some('^'),
    Some('t'),
    Some('+'),
    Some('u'),
    Some('?'),
    Some('!'),
    Some('['),
    Some(']'),
    Some('e'),
    Some('n'),
    Some('@'),
    Some('x'),
    Some('f'),
    Some('('),
    Some(')'),
    Some('r'),
];

const SKIP: u8 = 59;
const NUM: u8 = 60;
const SUB: u8 = 61;
const CHN: u8 = 62;
const AUX: u8 = 63;

/// Simple WFDB annotation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfdbAnnotation {
    pub sample: usize,
    pub code: u8,
}

impl WfdbAnnotation {
    pub fn symbol(&self) -> Option<char> {
        MIT_SYMBOLS.get(self.code as usize).copied().flatten()
    }
}

/// The companion files of one WFDB record (`<base>.hea`, `<base>.dat`,
/// optional `<base>.atr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFiles {
    pub header: PathBuf,
    pub data: PathBuf,
    pub annotations: Option<PathBuf>,
}

impl RecordFiles {
    /// Resolve a record from its base path. A path ending in `.hea`, `.dat` or
    /// `.atr` is accepted and treated as the base.
    pub fn from_base(path: &Path) -> Result<Self> {
        let base = match path.extension().and_then(|ext| ext.to_str()) {
            Some("hea" | "dat" | "atr") => path.with_extension(""),
            _ => path.to_path_buf(),
        };
        let companion = |ext: &str| {
            let mut name = base.clone().into_os_string();
            name.push(".");
            name.push(ext);
            PathBuf::from(name)
        };
        let header = companion("hea");
        let data = companion("dat");
        for required in [&header, &data] {
            if !required.is_file() {
                return Err(PipelineError::Input(format!(
                    "record file {} is missing",
                    required.display()
                )))
                .with_context(|| format!("resolving record {}", base.display()));
            }
        }
        let annotations = Some(companion("atr")).filter(|p| p.is_file());
        Ok(Self {
            header,
            data,
            annotations,
        })
    }
}

/// Which signal of a multi-channel record feeds the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelSelector {
    Index(usize),
    /// Match the signal description in the header, e.g. `MLII`.
    Label(String),
}

impl Default for ChannelSelector {
    fn default() -> Self {
        ChannelSelector::Index(0)
    }
}

impl ChannelSelector {
    /// Resolve against the header's signal descriptions. A missing label is an
    /// error; there is no fallback to another channel.
    pub fn resolve(&self, descriptions: &[String]) -> Result<usize, PipelineError> {
        match self {
            ChannelSelector::Index(idx) if *idx < descriptions.len() => Ok(*idx),
            ChannelSelector::Index(idx) => Err(PipelineError::Input(format!(
                "record contains {} signals, but channel {} was requested",
                descriptions.len(),
                idx
            ))),
            ChannelSelector::Label(label) => descriptions
                .iter()
                .position(|d| d.trim() == label)
                .ok_or_else(|| {
                    PipelineError::Input(format!(
                        "no signal labelled {:?}; available: {}",
                        label,
                        descriptions.join(", ")
                    ))
                }),
        }
    }
}

/// One loaded channel plus the record's annotations, if present.
#[derive(Debug, Clone)]
pub struct Recording {
    pub signal: TimeSeries,
    pub channel: usize,
    pub description: String,
    pub annotations: Option<Vec<Annotation>>,
}

/// Load the selected channel and any `.atr` annotations of a record.
pub fn load_record(files: &RecordFiles, channel: &ChannelSelector) -> Result<Recording> {
    let header = read_header(&files.header)?;
    let channel = channel
        .resolve(&header.descriptions())
        .with_context(|| format!("selecting channel in {}", files.header.display()))?;
    let signal = load_lead(&header, &files.header, channel)?;
    let description = header.signals[channel].description.clone();
    log::info!(
        "loaded channel {} ({}) from {}: {} samples at {} Hz",
        channel,
        description,
        files.header.display(),
        signal.len(),
        signal.fs
    );
    let annotations = match &files.annotations {
        Some(path) => Some(load_wfdb_annotations(path)?),
        None => None,
    };
    Ok(Recording {
        signal,
        channel,
        description,
        annotations,
    })
}

/// Sample rate used when the record line omits one.
const DEFAULT_FS: f64 = 250.0;
/// ADC gain used when a signal line omits it or gives 0.
const DEFAULT_GAIN: f64 = 200.0;
/// The only sample storage format this loader decodes.
const FORMAT_212: &str = "212";

/// One signal specification line of a header.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub file: String,
    pub format: String,
    /// ADC units per physical unit, never 0.
    pub gain: f64,
    /// ADC value of physical zero; defaults to `adc_zero`.
    pub baseline: i32,
    pub adc_zero: i32,
    /// Free text starting at the ninth field; empty when absent.
    pub description: String,
}

/// Parsed WFDB header of a single-segment record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub name: String,
    pub fs: f64,
    pub samples_per_signal: Option<usize>,
    pub signals: Vec<SignalSpec>,
}

impl RecordHeader {
    pub fn descriptions(&self) -> Vec<String> {
        self.signals.iter().map(|s| s.description.clone()).collect()
    }
}

/// Read and parse a `.hea` file.
pub fn read_header(header_path: &Path) -> Result<RecordHeader> {
    let text = read_text(header_path)?;
    let header = parse_header(&text)
        .with_context(|| format!("parsing header {}", header_path.display()))?;
    Ok(header)
}

/// Parse header text. Comment and blank lines are skipped; every field the
/// loader relies on is checked here so malformed headers fail as input errors.
pub fn parse_header(text: &str) -> Result<RecordHeader, PipelineError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    let record_line = lines
        .next()
        .ok_or_else(|| PipelineError::Input("header has no record line".into()))?;
    let fields: Vec<&str> = record_line.split_whitespace().collect();
    let name = fields[0].to_string();
    if name.contains('/') {
        return Err(PipelineError::Input(format!(
            "multi-segment record {} is not supported",
            name
        )));
    }
    let signal_count: usize = fields
        .get(1)
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| {
            PipelineError::Input(format!("record line has no signal count: {}", record_line))
        })?;
    let fs = match fields.get(2) {
        Some(field) => {
            // `freq[/counter_freq[(base)]]`
            let freq = field.split('/').next().unwrap_or(field);
            match freq.parse::<f64>() {
                Ok(fs) if fs.is_finite() && fs > 0.0 => fs,
                _ => {
                    return Err(PipelineError::Input(format!(
                        "invalid sampling frequency {:?}",
                        field
                    )))
                }
            }
        }
        None => DEFAULT_FS,
    };
    let samples_per_signal = match fields.get(3) {
        Some(field) => Some(field.parse::<usize>().map_err(|_| {
            PipelineError::Input(format!("invalid samples-per-signal field {:?}", field))
        })?),
        None => None,
    };

    let signals = lines
        .take(signal_count)
        .enumerate()
        .map(|(idx, line)| parse_signal_spec(line).map_err(|e| annotate_signal(e, idx)))
        .collect::<Result<Vec<_>, _>>()?;
    if signals.len() != signal_count {
        return Err(PipelineError::Input(format!(
            "header declares {} signals but lists {}",
            signal_count,
            signals.len()
        )));
    }
    Ok(RecordHeader {
        name,
        fs,
        samples_per_signal,
        signals,
    })
}

fn annotate_signal(err: PipelineError, idx: usize) -> PipelineError {
    match err {
        PipelineError::Input(msg) => PipelineError::Input(format!("signal {}: {}", idx, msg)),
        other => other,
    }
}

/// `file format [gain[(baseline)][/units] [resolution [adc_zero [...]]]] [description]`
fn parse_signal_spec(line: &str) -> Result<SignalSpec, PipelineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(PipelineError::Input(format!(
            "signal line lacks a storage format: {:?}",
            line
        )));
    }
    let file = fields[0].to_string();
    let format = fields[1].to_string();
    if format != FORMAT_212 {
        return Err(PipelineError::Input(format!(
            "unsupported storage format {:?} (only {} is decoded)",
            format, FORMAT_212
        )));
    }

    let adc_zero = match fields.get(4) {
        Some(field) => field
            .parse::<i32>()
            .map_err(|_| PipelineError::Input(format!("invalid ADC zero {:?}", field)))?,
        None => 0,
    };

    let (gain, baseline) = match fields.get(2) {
        Some(field) => parse_gain(field)?,
        None => (0.0, None),
    };
    let gain = if gain == 0.0 { DEFAULT_GAIN } else { gain };

    Ok(SignalSpec {
        file,
        format,
        gain,
        baseline: baseline.unwrap_or(adc_zero),
        adc_zero,
        description: fields.iter().skip(8).copied().collect::<Vec<_>>().join(" "),
    })
}

/// `gain[(baseline)][/units]`
fn parse_gain(field: &str) -> Result<(f64, Option<i32>), PipelineError> {
    let invalid = || PipelineError::Input(format!("invalid ADC gain {:?}", field));
    let spec = field.split('/').next().unwrap_or(field);
    let (gain, baseline) = match spec.split_once('(') {
        Some((gain, rest)) => {
            let baseline = rest
                .strip_suffix(')')
                .and_then(|b| b.parse::<i32>().ok())
                .ok_or_else(invalid)?;
            (gain, Some(baseline))
        }
        None => (spec, None),
    };
    match gain.parse::<f64>() {
        Ok(gain) if gain.is_finite() && gain >= 0.0 => Ok((gain, baseline)),
        _ => Err(invalid()),
    }
}

/// Load the specified signal (lead) from a WFDB header/data pair into a TimeSeries,
/// in physical units.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    let header = read_header(header_path)?;
    load_lead(&header, header_path, lead)
}

fn load_lead(header: &RecordHeader, header_path: &Path, lead: usize) -> Result<TimeSeries> {
    let spec = header.signals.get(lead).ok_or_else(|| {
        PipelineError::Input(format!(
            "WFDB record contains {} signals, but lead {} was requested",
            header.signals.len(),
            lead
        ))
    })?;
    let dir = header_path.parent().unwrap_or_else(|| Path::new(""));
    for signal in &header.signals {
        let path = dir.join(&signal.file);
        if !path.is_file() {
            return Err(PipelineError::Input(format!(
                "data file {} named in {} is missing",
                path.display(),
                header_path.display()
            ))
            .into());
        }
    }

    // signals stored in the same file are interleaved frame by frame
    let group: Vec<usize> = (0..header.signals.len())
        .filter(|&idx| header.signals[idx].file == spec.file)
        .collect();
    let stride = group.len();
    let offset = group.iter().position(|&idx| idx == lead).unwrap_or(0);

    let data_path = dir.join(&spec.file);
    let buf = read_exact(&data_path)?;
    let mut decoded = wfdb_rust::signal::parse_212_format(&buf);
    let frames = decoded.len() / stride;
    decoded.truncate(frames * stride);
    let mut raw: Vec<i16> = decoded.into_iter().skip(offset).step_by(stride).collect();
    if let Some(declared) = header.samples_per_signal {
        if raw.len() < declared {
            return Err(PipelineError::Input(format!(
                "{} holds {} samples per signal, header declares {}",
                data_path.display(),
                raw.len(),
                declared
            ))
            .into());
        }
        raw.truncate(declared);
    }

    let baseline = spec.baseline as f64;
    let data = raw
        .iter()
        .map(|&sample| (sample as f64 - baseline) / spec.gain)
        .collect();
    Ok(TimeSeries {
        fs: header.fs,
        data,
    })
}

/// Parse MIT annotation binary stream into samples & codes.
///
/// SKIP advances time, AUX payloads are skipped and NUM/SUB/CHN only change
/// annotation attributes; none of them are returned.
pub fn parse_wfdb_annotations(buf: &[u8]) -> Vec<WfdbAnnotation> {
    let mut out = Vec::new();
    let mut idx = 0;
    let mut sample: usize = 0;
    while idx + 2 <= buf.len() {
        let word = u16::from_le_bytes([buf[idx], buf[idx + 1]]);
        idx += 2;
        let code = (word >> 10) as u8;
        let field = (word & 0x03FF) as usize;
        if code == 0 && field == 0 {
            break;
        }
        match code {
            SKIP => {
                if idx + 4 > buf.len() {
                    break;
                }
                let high = u16::from_le_bytes([buf[idx], buf[idx + 1]]) as u32;
                let low = u16::from_le_bytes([buf[idx + 2], buf[idx + 3]]) as u32;
                idx += 4;
                let skip = ((high << 16) | low) as i32;
                sample = sample.saturating_add_signed(skip as isize);
            }
            NUM | SUB | CHN => {}
            AUX => {
                idx += field + field % 2;
            }
            0 => {
                sample = sample.wrapping_add(field);
            }
            _ => {
                sample = sample.wrapping_add(field);
                out.push(WfdbAnnotation { sample, code });
            }
        }
    }
    out
}

fn read_exact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read a WFDB annotation file (ATR) as (sample, symbol) pairs. Codes without
/// a symbol are dropped.
pub fn load_wfdb_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let buf = read_exact(path)?;
    let parsed = parse_wfdb_annotations(&buf);
    let total = parsed.len();
    let annotations: Vec<Annotation> = parsed
        .into_iter()
        .filter_map(|ann| ann.symbol().map(|symbol| Annotation::new(ann.sample, symbol)))
        .collect();
    if annotations.len() < total {
        log::debug!(
            "{}: dropped {} annotations with unassigned codes",
            path.display(),
            total - annotations.len()
        );
    }
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER_100: &str = "100 2 360 650000\n\
        100.dat 212 200 11 1024 995 -22131 0 MLII\n\
        100.dat 212 200 11 1024 1011 20052 0 V5\n\
        # 69 M 1085 1629 x1\n";

    fn word(code: u16, field: u16) -> [u8; 2] {
        ((code << 10) | field).to_le_bytes()
    }

    #[test]
    fn parses_simple_annotation_stream() {
        let mut bytes = vec![];
        // first annotation: code 1, diff=5 -> sample=5
        bytes.extend(word(1, 5));
        // second annotation: code 5 (V), diff=10 -> sample=15
        bytes.extend(word(5, 10));
        // SKIP 5000 samples
        bytes.extend(word(59, 0));
        bytes.extend(&0x0000u16.to_le_bytes());
        bytes.extend(&0x1388u16.to_le_bytes());
        // rhythm change with 3-byte aux payload (padded to 4)
        bytes.extend(word(28, 2));
        bytes.extend(word(63, 3));
        bytes.extend(b"(N\0\0");
        // NUM field does not move time
        bytes.extend(word(60, 7));
        bytes.extend(word(8, 3));
        // terminate
        bytes.extend(&0u16.to_le_bytes());

        let annotations = parse_wfdb_annotations(&bytes);
        let samples: Vec<_> = annotations.iter().map(|a| a.sample).collect();
        let symbols: Vec<_> = annotations.iter().filter_map(|a| a.symbol()).collect();
        assert_eq!(samples, vec![5, 15, 5017, 5020]);
        assert_eq!(symbols, vec!['N', 'V', '+', 'A']);
    }

    #[test]
    fn symbol_table_covers_beat_codes() {
        let beat = |code| WfdbAnnotation { sample: 0, code }.symbol();
        assert_eq!(beat(1), Some('N'));
        assert_eq!(beat(12), Some('/'));
        assert_eq!(beat(38), Some('f'));
        assert_eq!(beat(15), None);
        assert_eq!(beat(50), None);
    }

    /// Pack 12-bit samples two per three bytes.
    fn encode_212(samples: &[i16]) -> Vec<u8> {
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

    fn write_record(dir: &Path, header: &str, samples: &[i16]) -> PathBuf {
        fs::write(dir.join("rec.hea"), header).unwrap();
        fs::write(dir.join("rec.dat"), encode_212(samples)).unwrap();
        dir.join("rec.hea")
    }

    fn input_message(err: &anyhow::Error) -> String {
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Input(msg)) => msg.clone(),
            other => panic!("expected an input error, got {:?} ({:#})", other, err),
        }
    }

    #[test]
    fn parses_header_fields() {
        let header = parse_header(HEADER_100).unwrap();
        assert_eq!(header.name, "100");
        assert_eq!(header.fs, 360.0);
        assert_eq!(header.samples_per_signal, Some(650000));
        assert_eq!(header.descriptions(), vec!["MLII", "V5"]);
        let mlii = &header.signals[0];
        assert_eq!((mlii.gain, mlii.baseline, mlii.adc_zero), (200.0, 1024, 1024));

        let header =
            parse_header("r 1

r.dat 212 100(-12)/mV 12 5 0 0 0 lead II

").unwrap();
        assert_eq!(header.fs, 250.0);
        assert_eq!(header.samples_per_signal, None);
        let spec = &header.signals[0];
        assert_eq!((spec.gain, spec.baseline, spec.adc_zero), (100.0, -12, 5));
        assert_eq!(spec.description, "lead II");

        let header = parse_header("r 1 500/1000(0)
r.dat 212
").unwrap();
        assert_eq!(header.fs, 500.0);
        assert_eq!(header.signals[0].gain, 200.0);
        assert_eq!(header.signals[0].description, "");
    }

    #[test]
    fn malformed_headers_are_input_errors() {
        for text in [
            "# only a comment
",
            "100 3 360
100.dat 212 200 11 1024 0 0 0 MLII
",
            "100 x 360
",
            "100 1 fast
100.dat 212
",
            "100 1 360 many
100.dat 212
",
            "100/2 1 360
100.dat 212
",
            "100 1 360
100.dat
",
            "100 1 360
100.dat 212 abc
",
            "100 1 360
100.dat 212 200(x)
",
            "100 1 360
100.dat 212 200 11 zero
",
        ] {
            assert!(
                matches!(parse_header(text), Err(PipelineError::Input(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn only_format_212_is_decoded() {
        let dir = tempdir().unwrap();
        let header = "rec 1 360 4
rec.dat 16 200 16 0 0 0 0 MLII
";
        fs::write(dir.path().join("rec.hea"), header).unwrap();
        let words: Vec<u8> = [100i16, 200, 300, 400]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        fs::write(dir.path().join("rec.dat"), words).unwrap();

        let err = load_wfdb_lead(&dir.path().join("rec.hea"), 0).unwrap_err();
        assert!(input_message(&err).contains("unsupported storage format"));
        let err = parse_header("rec 1
rec.dat 212x2
").unwrap_err();
        assert!(err.to_string().contains("unsupported storage format"));
    }

    #[test]
    fn data_file_named_in_header_must_exist() {
        let dir = tempdir().unwrap();
        let header_path = write_record(
            dir.path(),
            "rec 2 360
rec.dat 212 200 12 0 0 0 0 MLII
other.dat 212 200 12 0 0 0 0 V5
",
            &[1, 2, 3, 4],
        );
        let err = load_wfdb_lead(&header_path, 0).unwrap_err();
        assert!(input_message(&err).contains("other.dat"));
    }

    #[test]
    fn loads_physical_units_from_212_record() {
        let dir = tempdir().unwrap();
        let samples: Vec<i16> = (0..10).map(|i| 1024 + 10 * i).collect();
        let header_path = write_record(
            dir.path(),
            "rec 1 360 10
rec.dat 212 200 12 1024 1024 0 0 MLII
",
            &samples,
        );
        let ts = load_wfdb_lead(&header_path, 0).unwrap();
        assert_eq!(ts.fs, 360.0);
        assert_eq!(ts.len(), 10);
        for (i, v) in ts.data.iter().enumerate() {
            assert!((v - 0.05 * i as f64).abs() < 1e-12, "sample {}: {}", i, v);
        }
    }

    #[test]
    fn negative_samples_keep_their_sign() {
        let dir = tempdir().unwrap();
        let header_path = write_record(
            dir.path(),
            "rec 1 360 3
rec.dat 212 100 12 0 0 0 0 MLII
",
            &[-200, -1, 2047],
        );
        let ts = load_wfdb_lead(&header_path, 0).unwrap();
        assert_eq!(ts.data, vec![-2.0, -0.01, 20.47]);
    }

    #[test]
    fn declared_length_is_enforced() {
        let dir = tempdir().unwrap();
        let header_path = write_record(
            dir.path(),
            "rec 1 360 8
rec.dat 212 200 12 0 0 0 0 MLII
",
            &[1, 2, 3, 4],
        );
        let err = load_wfdb_lead(&header_path, 0).unwrap_err();
        assert!(input_message(&err).contains("declares 8"));

        let header_path = write_record(
            dir.path(),
            "rec 1 360 3
rec.dat 212 200 12 0 0 0 0 MLII
",
            &[200, 400, 600, 800],
        );
        assert_eq!(load_wfdb_lead(&header_path, 0).unwrap().data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn selects_interleaved_channel_by_label() {
        let dir = tempdir().unwrap();
        // frames of (V5, MLII); MLII has gain 0, so the default gain applies
        let frames: [i16; 8] = [110, 205, 120, 405, 130, 605, 140, 805];
        write_record(
            dir.path(),
            "rec 2 250 4
rec.dat 212 100(10)/mV 12 0 0 0 0 V5
rec.dat 212 0 12 5 0 0 0 MLII
",
            &frames,
        );
        let files = RecordFiles::from_base(&dir.path().join("rec")).unwrap();
        let recording = load_record(&files, &ChannelSelector::Label("MLII".into())).unwrap();
        assert_eq!(recording.channel, 1);
        assert_eq!(recording.description, "MLII");
        assert_eq!(recording.signal.fs, 250.0);
        assert_eq!(recording.signal.data, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(recording.annotations.is_none());

        let v5 = load_record(&files, &ChannelSelector::default()).unwrap();
        assert_eq!(v5.description, "V5");
        let expected = [1.0, 1.1, 1.2, 1.3];
        for (got, want) in v5.signal.data.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }

        let err = load_record(&files, &ChannelSelector::Label("V1".into())).unwrap_err();
        assert!(input_message(&err).contains("V1"));
    }

    #[test]
    fn record_picks_up_its_annotations() {
        let dir = tempdir().unwrap();
        write_record(
            dir.path(),
            "rec 1 360 4
rec.dat 212 200 12 0 0 0 0 MLII
",
            &[0, 0, 0, 0],
        );
        let mut atr = Vec::new();
        atr.extend(word(1, 1));
        atr.extend(word(5, 2));
        atr.extend(&0u16.to_le_bytes());
        fs::write(dir.path().join("rec.atr"), atr).unwrap();

        let files = RecordFiles::from_base(&dir.path().join("rec")).unwrap();
        let recording = load_record(&files, &ChannelSelector::Index(0)).unwrap();
        assert_eq!(
            recording.annotations,
            Some(vec![Annotation::new(1, 'N'), Annotation::new(3, 'V')])
        );
    }

    #[test]
    fn channel_selection_is_explicit() {
        let descriptions = vec!["V5".to_string(), "MLII".to_string()];
        assert_eq!(ChannelSelector::Index(0).resolve(&descriptions).unwrap(), 0);
        assert_eq!(
            ChannelSelector::Label("MLII".into()).resolve(&descriptions).unwrap(),
            1
        );
        assert!(ChannelSelector::Label("V1".into()).resolve(&descriptions).is_err());
        assert!(ChannelSelector::Index(2).resolve(&descriptions).is_err());
    }

    #[test]
    fn record_files_require_header_and_data() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("100");
        fs::write(dir.path().join("100.hea"), HEADER_100).unwrap();
        let err = RecordFiles::from_base(&base).unwrap_err();
        assert!(err.downcast_ref::<PipelineError>().is_some());

        fs::write(dir.path().join("100.dat"), [0u8; 6]).unwrap();
        let files = RecordFiles::from_base(&base).unwrap();
        assert_eq!(files.annotations, None);

        fs::write(dir.path().join("100.atr"), [0u8; 2]).unwrap();
        let files = RecordFiles::from_base(&dir.path().join("100.hea")).unwrap();
        assert_eq!(files.data, dir.path().join("100.dat"));
        assert_eq!(files.annotations, Some(dir.path().join("100.atr")));
        assert!(load_wfdb_annotations(&dir.path().join("100.atr"))
            .unwrap()
            .is_empty());
    }
}
