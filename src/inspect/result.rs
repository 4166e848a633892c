use serde::{Deserialize, Serialize};

use crate::core::{InspectError, Result};

/// Output of a zero-shot classifier: the echoed input plus parallel label and score columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub sequence: String,
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

/// One row of a [`ScoreTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub sequence: String,
    pub label: String,
    pub score: f32,
}

/// A classification result laid out as rows, with `sequence` repeated on each row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Fails with [`InspectError::MalformedResult`] when labels and scores differ in length.
    pub fn from_result(result: ClassificationResult) -> Result<Self> {
        if result.labels.len() != result.scores.len() {
            return Err(InspectError::MalformedResult {
                labels: result.labels.len(),
                scores: result.scores.len(),
            });
        }

        let sequence = result.sequence;
        let rows = result
            .labels
            .into_iter()
            .zip(result.scores)
            .map(|(label, score)| ScoreRow {
                sequence: sequence.clone(),
                label,
                score,
            })
            .collect();
        Ok(Self { rows })
    }

    /// Stable ascending sort by score; equal scores keep their current order.
    /// NaN scores go last whatever their sign bit.
    pub fn sort_by_score(&mut self) {
        self.rows.sort_by(|a, b| {
            a.score
                .is_nan()
                .cmp(&b.score.is_nan())
                .then_with(|| a.score.total_cmp(&b.score))
        });
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.label.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.rows.iter().map(|row| row.score).collect()
    }

    /// Sequence text of the first row.
    pub fn first_sequence(&self) -> Result<&str> {
        self.rows
            .first()
            .map(|row| row.sequence.as_str())
            .ok_or(InspectError::EmptyResult)
    }
}
