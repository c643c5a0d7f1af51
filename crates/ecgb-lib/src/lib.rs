pub mod align;
pub mod classifier;
pub mod config;
pub mod denoise;
pub mod detectors;
pub mod error;
pub mod io;
pub mod labels;
pub mod metrics;
pub mod pipeline;
pub mod segments;
pub mod signal;

pub use classifier::{BeatClassifier, ConstantClassifier, TemplateClassifier};
pub use config::PipelineConfig;
pub use error::{Diagnostic, PipelineError};
pub use labels::ClassLabel;
pub use pipeline::*;
pub use signal::*;
