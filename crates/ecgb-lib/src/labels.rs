//! AAMI label space shared by model outputs and annotation symbols.

use crate::error::Diagnostic;
use crate::signal::Annotation;
use serde::{Deserialize, Serialize};

/// The five AAMI beat classes, in the order the classifier emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    /// Normal and bundle-branch-block beats
    N,
    /// Supraventricular ectopic
    S,
    /// Ventricular ectopic
    V,
    /// Fusion of ventricular and normal
    F,
    /// Paced, unclassifiable and noise
    Q,
}

impl ClassLabel {
    /// Classifier output order. Index `i` of a probability vector scores `ALL[i]`.
    pub const ALL: [ClassLabel; 5] = [
        ClassLabel::N,
        ClassLabel::S,
        ClassLabel::V,
        ClassLabel::F,
        ClassLabel::Q,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        match self {
            ClassLabel::N => 'N',
            ClassLabel::S => 'S',
            ClassLabel::V => 'V',
            ClassLabel::F => 'F',
            ClassLabel::Q => 'Q',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_char() == c)
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Map a clinical annotation symbol onto its AAMI class.
pub fn symbol_to_class(symbol: char) -> Option<ClassLabel> {
    match symbol {
        'N' | 'L' | 'R' | 'e' | 'j' => Some(ClassLabel::N),
        'A' | 'a' | 'J' | 'S' => Some(ClassLabel::S),
        'V' | 'E' => Some(ClassLabel::V),
        'F' => Some(ClassLabel::F),
        '/' | 'f' | 'Q' | 'P' | '|' | '~' => Some(ClassLabel::Q),
        _ => None,
    }
}

/// Map a classifier output index onto its AAMI class.
pub fn index_to_class(index: usize) -> Option<ClassLabel> {
    ClassLabel::ALL.get(index).copied()
}

/// Label-map a set of annotations. Symbols outside the vocabulary come back as
/// `None` and are reported through `diagnostics`.
pub fn map_annotations(
    annotations: &[Annotation],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Option<ClassLabel>> {
    annotations
        .iter()
        .map(|ann| {
            let label = symbol_to_class(ann.symbol);
            if label.is_none() {
                let diagnostic = Diagnostic::UnknownSymbol {
                    sample: ann.sample,
                    symbol: ann.symbol,
                };
                log::warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }
            label
        })
        .collect()
}
