use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ecgb_lib::{
    classifier::{BeatClassifier, ConstantClassifier, TemplateClassifier},
    config::{load_config, PipelineConfig},
    denoise::denoise_with_config,
    detectors::ecg::{locate_beats, BeatLocatorConfig},
    io::{
        text as text_io,
        wfdb::{self as wfdb_io, ChannelSelector, RecordFiles},
    },
    labels::ClassLabel,
    pipeline::{BeatPipeline, PipelineInput},
    signal::{Annotation, TimeSeries},
};
use env_logger::Env;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Parser)]
#[command(
    name = "ecgb",
    version,
    about = "ECGB: single-lead ECG beat classification tools"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SignalArgs {
    /// WFDB record base path (expects <base>.hea and <base>.dat)
    #[arg(long, conflicts_with = "input")]
    record: Option<PathBuf>,
    /// Newline-delimited samples; stdin when neither --record nor --input is given
    #[arg(long)]
    input: Option<PathBuf>,
    /// Sampling rate for --input/stdin samples
    #[arg(long, default_value_t = 360.0)]
    fs: f64,
    /// Record channel index
    #[arg(long, default_value_t = 0)]
    lead: usize,
    /// Record channel by header description (e.g. MLII); overrides --lead
    #[arg(long)]
    channel_label: Option<String>,
}

impl SignalArgs {
    fn channel(&self) -> ChannelSelector {
        match &self.channel_label {
            Some(label) => ChannelSelector::Label(label.clone()),
            None => ChannelSelector::Index(self.lead),
        }
    }
}

/// `constant:<N|S|V|F|Q>` or `templates:<path.json>`.
#[derive(Clone, Debug)]
enum ClassifierSpec {
    Constant(ClassLabel),
    Templates(PathBuf),
}

impl FromStr for ClassifierSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <kind>:<arg>, got {:?}", s))?;
        match kind {
            "constant" => {
                let mut chars = arg.chars();
                match (chars.next().and_then(ClassLabel::from_char), chars.next()) {
                    (Some(label), None) => Ok(ClassifierSpec::Constant(label)),
                    _ => Err(format!("{:?} is not one of N, S, V, F, Q", arg)),
                }
            }
            "templates" if !arg.is_empty() => Ok(ClassifierSpec::Templates(PathBuf::from(arg))),
            _ => Err(format!("unknown classifier {:?}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Denoise, detect and classify beats; score against annotations when available
    Classify {
        #[command(flatten)]
        signal: SignalArgs,
        /// Ground truth as WFDB .atr or `sample,symbol` CSV (defaults to <record>.atr)
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Ignore annotations even if the record ships them
        #[arg(long, conflicts_with = "annotations")]
        no_annotations: bool,
        /// Beat classifier backend
        #[arg(long, default_value = "constant:N")]
        classifier: ClassifierSpec,
        /// Pipeline configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the wavelet-denoised signal
    Denoise {
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print candidate beat positions of the denoised signal
    FindBeats {
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DenoiseOutput {
    fs: f64,
    sample_count: usize,
    denoised_signal: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BeatsOutput {
    fs: f64,
    sample_count: usize,
    peaks: Vec<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str()))
        .init();
    match cli.command {
        Commands::Classify {
            signal,
            annotations,
            no_annotations,
            classifier,
            config,
        } => cmd_classify(
            &signal,
            annotations.as_deref(),
            no_annotations,
            &classifier,
            config.as_deref(),
        )?,
        Commands::Denoise { signal, config } => cmd_denoise(&signal, config.as_deref())?,
        Commands::FindBeats { signal, config } => cmd_find_beats(&signal, config.as_deref())?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(PipelineConfig::default()),
    }
}

/// The selected signal plus the record's own annotations, if any.
fn load_signal(args: &SignalArgs) -> Result<(TimeSeries, Option<Vec<Annotation>>)> {
    if let Some(base) = &args.record {
        let files = RecordFiles::from_base(base)?;
        let recording = wfdb_io::load_record(&files, &args.channel())?;
        Ok((recording.signal, recording.annotations))
    } else {
        if args.fs <= 0.0 {
            bail!("--fs must be positive, got {}", args.fs);
        }
        let data = read_samples(args.input.as_deref())?;
        Ok((TimeSeries::new(args.fs, data), None))
    }
}

fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("atr") => wfdb_io::load_wfdb_annotations(path),
        _ => text_io::read_annotation_csv(path),
    }
}

fn build_classifier(spec: &ClassifierSpec, cfg: &PipelineConfig) -> Result<Box<dyn BeatClassifier>> {
    let classifier: Box<dyn BeatClassifier> = match spec {
        ClassifierSpec::Constant(label) => {
            Box::new(ConstantClassifier::new(*label, cfg.window_len()))
        }
        ClassifierSpec::Templates(path) => Box::new(TemplateClassifier::load(path)?),
    };
    Ok(classifier)
}

fn cmd_classify(
    signal: &SignalArgs,
    annotations: Option<&Path>,
    no_annotations: bool,
    classifier: &ClassifierSpec,
    config: Option<&Path>,
) -> Result<()> {
    let cfg = read_config(config)?;
    let classifier = build_classifier(classifier, &cfg)?;
    log::info!(
        "using classifier {} ({}-sample window)",
        classifier.name(),
        classifier.window_len()
    );
    let pipeline = BeatPipeline::new(cfg, classifier.as_ref())?;

    let (ts, record_annotations) = load_signal(signal)?;
    let annotations = match (annotations, no_annotations) {
        (_, true) => None,
        (Some(path), false) => Some(load_annotations(path)?),
        (None, false) => record_annotations,
    };
    let input = PipelineInput {
        signal: ts,
        annotations,
    };
    let output = pipeline
        .run(&input)
        .context("beat classification failed")?;
    let js = serde_json::to_string(&output)?;
    println!("{}", js);
    Ok(())
}

fn cmd_denoise(signal: &SignalArgs, config: Option<&Path>) -> Result<()> {
    let cfg = read_config(config)?;
    let (ts, _) = load_signal(signal)?;
    let denoised = denoise_with_config(&ts, &cfg.denoise)?;
    let out = DenoiseOutput {
        fs: denoised.fs,
        sample_count: denoised.len(),
        denoised_signal: denoised.data,
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_find_beats(signal: &SignalArgs, config: Option<&Path>) -> Result<()> {
    let cfg = read_config(config)?;
    let (ts, _) = load_signal(signal)?;
    let denoised = denoise_with_config(&ts, &cfg.denoise)?;
    let peaks = locate_beats(
        &denoised,
        &BeatLocatorConfig {
            min_distance: cfg.min_peak_distance,
            edge_margin: cfg.half_window,
        },
    );
    let out = BeatsOutput {
        fs: denoised.fs,
        sample_count: denoised.len(),
        peaks,
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}
