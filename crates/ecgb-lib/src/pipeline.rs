use crate::{
    align::align_annotations,
    classifier::{argmax, BeatClassifier},
    config::PipelineConfig,
    denoise::denoise_with_config,
    detectors::ecg::{locate_beats, BeatLocatorConfig},
    error::{Diagnostic, PipelineError, Result},
    labels::{index_to_class, map_annotations, ClassLabel},
    metrics::scoring::{score, Overall, Summary},
    segments::{extract_segments, SegmentBatch},
    signal::{annotation_locations, Annotation, TimeSeries},
};
use serde::{Deserialize, Serialize};

/// One recording: the selected channel and, optionally, its ground truth.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub signal: TimeSeries,
    pub annotations: Option<Vec<Annotation>>,
}

/// Everything the pipeline produced for one recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub fs: f64,
    pub sample_count: usize,
    pub denoised_signal: Vec<f64>,
    pub peaks: Vec<usize>,
    /// Predicted class per peak.
    pub predictions: Vec<ClassLabel>,
    /// Raw annotation positions, not aligned to peaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_locations: Option<Vec<usize>>,
    /// Aligned ground truth per peak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Option<ClassLabel>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<Overall>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Denoise → locate → segment → classify, plus alignment and scoring when
/// ground truth is supplied. The classifier is borrowed for the lifetime of
/// the pipeline and may be shared across threads.
pub struct BeatPipeline<'a> {
    config: PipelineConfig,
    classifier: &'a dyn BeatClassifier,
}

impl<'a> BeatPipeline<'a> {
    pub fn new(config: PipelineConfig, classifier: &'a dyn BeatClassifier) -> Result<Self> {
        config.validate()?;
        if classifier.window_len() != config.window_len() {
            return Err(PipelineError::Config(format!(
                "classifier '{}' expects {}-sample segments, pipeline extracts {}",
                classifier.name(),
                classifier.window_len(),
                config.window_len()
            )));
        }
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, input: &PipelineInput) -> Result<PipelineOutput> {
        let cfg = &self.config;
        let denoised = denoise_with_config(&input.signal, &cfg.denoise)?;
        let peaks = locate_beats(
            &denoised,
            &BeatLocatorConfig {
                min_distance: cfg.min_peak_distance,
                edge_margin: cfg.half_window,
            },
        );
        let batch = extract_segments(&denoised, &peaks, cfg.half_window)?;
        let predictions = self.predict(&batch)?;
        log::info!(
            "{} samples at {} Hz: {} beats classified by {}",
            denoised.len(),
            denoised.fs,
            peaks.len(),
            self.classifier.name()
        );

        let mut diagnostics = Vec::new();
        let mut output = PipelineOutput {
            fs: denoised.fs,
            sample_count: denoised.len(),
            denoised_signal: Vec::new(),
            peaks,
            predictions,
            annotation_locations: None,
            annotations: None,
            summary: None,
            overall: None,
            diagnostics: Vec::new(),
        };

        if let Some(annotations) = &input.annotations {
            let labels = map_annotations(annotations, &mut diagnostics);
            let labelled: Vec<(usize, Option<ClassLabel>)> = annotations
                .iter()
                .map(|ann| ann.sample)
                .zip(labels)
                .collect();
            let aligned = align_annotations(&output.peaks, &labelled, cfg.match_tolerance);
            if let Some(report) = score(&output.predictions, &aligned)? {
                output.summary = Some(report.summary);
                output.overall = Some(report.overall);
            } else {
                log::info!("no beat matched an annotation; skipping scoring");
            }
            output.annotation_locations = Some(annotation_locations(annotations));
            output.annotations = Some(aligned);
        }

        output.denoised_signal = denoised.data;
        output.diagnostics = diagnostics;
        Ok(output)
    }

    fn predict(&self, batch: &SegmentBatch) -> Result<Vec<ClassLabel>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.classifier.classify(batch)?;
        if rows.len() != batch.len() {
            return Err(PipelineError::Classifier(format!(
                "{} returned {} rows for {} segments",
                self.classifier.name(),
                rows.len(),
                batch.len()
            )));
        }
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != ClassLabel::COUNT {
                    return Err(PipelineError::Classifier(format!(
                        "row {} has {} scores, expected {}",
                        i,
                        row.len(),
                        ClassLabel::COUNT
                    )));
                }
                if row.iter().any(|p| !p.is_finite()) {
                    return Err(PipelineError::Classifier(format!(
                        "row {} contains non-finite scores",
                        i
                    )));
                }
                argmax(row).and_then(index_to_class).ok_or_else(|| {
                    PipelineError::Classifier(format!("row {} has no usable score", i))
                })
            })
            .collect()
    }
}

/// Convenience helper that builds a pipeline and runs it once.
pub fn run_pipeline(
    input: &PipelineInput,
    config: &PipelineConfig,
    classifier: &dyn BeatClassifier,
) -> Result<PipelineOutput> {
    BeatPipeline::new(*config, classifier)?.run(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ConstantClassifier;
    use crate::labels::ClassLabel::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::PI;

    const BEATS: [usize; 3] = [1000, 2500, 4000];

    fn synthetic_signal(seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..5000)
            .map(|i| {
                let t = i as f64;
                let mut v = 0.1 * (2.0 * PI * t / 360.0).sin() + rng.gen_range(-0.03..0.03);
                for &centre in &BEATS {
                    v += 1.5 * (-0.5 * ((t - centre as f64) / 5.0).powi(2)).exp();
                }
                v
            })
            .collect();
        TimeSeries::new(360.0, data)
    }

    fn ground_truth() -> Vec<Annotation> {
        vec![
            Annotation::new(1000, 'N'),
            Annotation::new(2500, 'V'),
            Annotation::new(4000, 'N'),
        ]
    }

    /// Returns `batch.len() - missing` rows of `width` scores.
    struct Broken {
        width: usize,
        missing: usize,
    }

    impl BeatClassifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn window_len(&self) -> usize {
            256
        }
        fn classify(&self, batch: &SegmentBatch) -> Result<Vec<Vec<f64>>> {
            let rows = batch.len().saturating_sub(self.missing);
            Ok(vec![vec![0.2; self.width]; rows])
        }
    }

    #[test]
    fn end_to_end_scores_against_annotations() {
        let stub = ConstantClassifier::new(N, 256);
        let input = PipelineInput {
            signal: synthetic_signal(7),
            annotations: Some(ground_truth()),
        };
        let out = run_pipeline(&input, &PipelineConfig::default(), &stub).unwrap();

        assert_eq!(out.denoised_signal.len(), 5000);
        assert_eq!(out.predictions.len(), out.peaks.len());
        assert!(out.predictions.iter().all(|&p| p == N));
        for &beat in &BEATS {
            assert!(
                out.peaks.iter().any(|&p| p.abs_diff(beat) <= 10),
                "no peak near {}: {:?}",
                beat,
                out.peaks
            );
        }

        let aligned = out.annotations.as_ref().unwrap();
        assert_eq!(aligned.len(), out.peaks.len());
        let matched: Vec<ClassLabel> = aligned.iter().flatten().copied().collect();
        assert_eq!(matched, vec![N, V, N]);
        assert_eq!(out.annotation_locations, Some(BEATS.to_vec()));

        let summary = out.summary.as_ref().unwrap();
        assert_eq!(summary[&V].support, 1);
        assert_eq!(summary[&V].recall, 0.0);
        assert_eq!(summary[&N].support, 2);
        assert_eq!(summary[&N].recall, 1.0);
        assert_eq!(out.overall.unwrap().scored, 3);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn every_segment_is_a_slice_of_the_denoised_signal() {
        let stub = ConstantClassifier::new(Q, 256);
        let input = PipelineInput {
            signal: synthetic_signal(1),
            annotations: None,
        };
        let out = run_pipeline(&input, &PipelineConfig::default(), &stub).unwrap();
        let denoised = TimeSeries::new(out.fs, out.denoised_signal.clone());
        let batch = extract_segments(&denoised, &out.peaks, 128).unwrap();
        for (segment, &peak) in batch.iter().zip(&out.peaks) {
            assert!(peak >= 128 && peak < 5000 - 128);
            assert_eq!(segment.samples[..], out.denoised_signal[peak - 128..peak + 128]);
        }
    }

    #[test]
    fn without_annotations_there_is_no_summary() {
        let stub = ConstantClassifier::new(N, 256);
        let input = PipelineInput {
            signal: synthetic_signal(3),
            annotations: None,
        };
        let out = run_pipeline(&input, &PipelineConfig::default(), &stub).unwrap();
        assert!(out.summary.is_none());
        assert!(out.annotations.is_none());
        let js = serde_json::to_value(&out).unwrap();
        assert!(js.get("summary").is_none());
        assert!(js.get("annotations").is_none());
        assert!(js.get("denoisedSignal").is_some());
    }

    #[test]
    fn unmatched_annotations_skip_scoring_and_report_unknown_symbols() {
        let stub = ConstantClassifier::new(N, 256);
        let input = PipelineInput {
            signal: synthetic_signal(5),
            annotations: Some(vec![Annotation::new(1000, '+'), Annotation::new(2500, 'x')]),
        };
        let out = run_pipeline(&input, &PipelineConfig::default(), &stub).unwrap();
        assert!(out.summary.is_none());
        assert!(out.annotations.unwrap().iter().all(Option::is_none));
        assert_eq!(out.diagnostics.len(), 2);
        assert_eq!(
            out.diagnostics[0],
            Diagnostic::UnknownSymbol {
                sample: 1000,
                symbol: '+'
            }
        );
    }

    #[test]
    fn flat_signal_yields_empty_result() {
        let stub = ConstantClassifier::new(N, 256);
        let input = PipelineInput {
            signal: TimeSeries::new(360.0, vec![0.0; 5000]),
            annotations: Some(ground_truth()),
        };
        let out = run_pipeline(&input, &PipelineConfig::default(), &stub).unwrap();
        assert!(out.peaks.is_empty());
        assert!(out.predictions.is_empty());
        assert_eq!(out.annotations, Some(vec![]));
        assert!(out.summary.is_none());
    }

    #[test]
    fn short_signal_fails_the_run() {
        let stub = ConstantClassifier::new(N, 256);
        let input = PipelineInput {
            signal: TimeSeries::new(360.0, vec![0.0; 1000]),
            annotations: None,
        };
        assert!(matches!(
            run_pipeline(&input, &PipelineConfig::default(), &stub),
            Err(PipelineError::InsufficientLength { len: 1000, .. })
        ));
    }

    #[test]
    fn window_mismatch_is_rejected_up_front() {
        let stub = ConstantClassifier::new(N, 200);
        assert!(matches!(
            BeatPipeline::new(PipelineConfig::default(), &stub),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn malformed_classifier_output_is_an_error() {
        let input = PipelineInput {
            signal: synthetic_signal(9),
            annotations: None,
        };
        let cfg = PipelineConfig::default();
        let short_rows = Broken {
            width: 5,
            missing: 1,
        };
        assert!(matches!(
            run_pipeline(&input, &cfg, &short_rows),
            Err(PipelineError::Classifier(_))
        ));
        let narrow = Broken {
            width: 2,
            missing: 0,
        };
        assert!(matches!(
            run_pipeline(&input, &cfg, &narrow),
            Err(PipelineError::Classifier(_))
        ));
    }
}
