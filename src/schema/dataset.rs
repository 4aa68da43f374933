//! Labeled measurement datasets for embedding experiments.
//!
//! Two formats are accepted: comma-separated text with numeric fields and a
//! trailing label (the classic iris `.data` layout), or a JSON array of
//! [`Sample`] objects.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One labeled measurement vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub measures: Vec<f64>,
    pub label: String,
}

/// An ordered collection of samples sharing one dimensionality.
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl Dataset {
    /// Build from samples, checking they are non-empty and consistent.
    pub fn new(samples: Vec<Sample>) -> Result<Self, DatasetError> {
        let dimensions = samples.first().ok_or(DatasetError::Empty)?.measures.len();
        if dimensions == 0 {
            return Err(DatasetError::NoMeasures);
        }
        for (i, sample) in samples.iter().enumerate() {
            if sample.measures.len() != dimensions {
                return Err(DatasetError::DimensionMismatch {
                    sample: i,
                    expected: dimensions,
                    actual: sample.measures.len(),
                });
            }
            if sample.measures.iter().any(|m| !m.is_finite()) {
                return Err(DatasetError::NonFinite { sample: i });
            }
        }
        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// Load from disk; `.json` files are parsed as JSON, anything else as CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_csv_str(&text)
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, DatasetError> {
        let samples: Vec<Sample> = serde_json::from_str(text)?;
        Self::new(samples)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        let mut samples = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let Some((label, numbers)) = fields.split_last() else {
                continue;
            };

            let measures = numbers
                .iter()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
                        line: line_no + 1,
                        value: field.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            samples.push(Sample {
                measures,
                label: label.to_string(),
            });
        }

        Self::new(samples)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Distinct labels in order of first appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for sample in &self.samples {
            if !labels.contains(&sample.label.as_str()) {
                labels.push(&sample.label);
            }
        }
        labels
    }
}

/// Dataset loading errors.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Line {line}: '{value}' is not a number")]
    InvalidNumber { line: usize, value: String },
    #[error("Sample {sample} has {actual} measures, expected {expected}")]
    DimensionMismatch {
        sample: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Sample {sample} contains a non-finite measure")]
    NonFinite { sample: usize },
    #[error("Samples carry no numeric measures")]
    NoMeasures,
    #[error("Dataset contains no samples")]
    Empty,
}
