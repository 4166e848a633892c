use tokenizers::Tokenizer;

use super::model::ZeroShotClassificationModel;
use crate::core::{InspectError, Result};
use crate::inspect::ClassificationResult;

/// Classifies text into arbitrary categories without training.
///
/// Each candidate label is turned into a hypothesis through the template
/// (`"This example is {}."` by default) and scored by an NLI model against
/// the input text.
///
/// Construct with [`ZeroShotClassificationPipelineBuilder`](super::ZeroShotClassificationPipelineBuilder).
///
/// ```rust,no_run
/// # use zeroshot_inspect::pipelines::zero_shot_classification_pipeline::*;
/// # fn main() -> zeroshot_inspect::core::Result<()> {
/// let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
/// let result = pipeline.classify("The team won the championship!", &["sports", "politics"])?;
/// println!("{}: {:.2}", result.labels[0], result.scores[0]);
/// # Ok(())
/// # }
/// ```
pub struct ZeroShotClassificationPipeline<M: ZeroShotClassificationModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) hypothesis_template: String,
    pub(crate) multi_label: bool,
}

impl<M: ZeroShotClassificationModel> ZeroShotClassificationPipeline<M> {
    /// Assemble a pipeline from an already loaded model and tokenizer.
    pub fn from_parts(
        model: M,
        tokenizer: Tokenizer,
        hypothesis_template: impl Into<String>,
    ) -> Result<Self> {
        let hypothesis_template = hypothesis_template.into();
        validate_template(&hypothesis_template)?;
        Ok(Self {
            model,
            tokenizer,
            hypothesis_template,
            multi_label: false,
        })
    }

    /// Classify with normalized probabilities for single-label classification (scores sum to 1).
    ///
    /// Labels come back sorted by score, highest first.
    pub fn classify(&self, text: &str, candidate_labels: &[&str]) -> Result<ClassificationResult> {
        self.run(text, candidate_labels, true)
    }

    /// Classify with raw entailment probabilities, each label scored independently.
    pub fn classify_multi_label(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ClassificationResult> {
        self.run(text, candidate_labels, false)
    }

    pub fn hypothesis_template(&self) -> &str {
        &self.hypothesis_template
    }

    /// Whether the [`Classifier`](crate::inspect::Classifier) impl scores labels independently.
    pub fn is_multi_label(&self) -> bool {
        self.multi_label
    }

    pub fn with_multi_label(mut self, multi_label: bool) -> Self {
        self.multi_label = multi_label;
        self
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }

    fn run(
        &self,
        text: &str,
        candidate_labels: &[&str],
        normalize: bool,
    ) -> Result<ClassificationResult> {
        if candidate_labels.is_empty() {
            return Err(InspectError::InvalidInput(
                "at least one candidate label is required".into(),
            ));
        }

        let hypotheses: Vec<String> = candidate_labels
            .iter()
            .map(|label| self.hypothesis_template.replace("{}", label))
            .collect();

        let mut scores = self
            .model
            .entailment_scores(&self.tokenizer, text, &hypotheses)?;
        if scores.len() != candidate_labels.len() {
            return Err(InspectError::MalformedResult {
                labels: candidate_labels.len(),
                scores: scores.len(),
            });
        }

        if normalize {
            let sum: f32 = scores.iter().sum();
            if sum > 0.0 {
                scores.iter_mut().for_each(|s| *s /= sum);
            }
        }

        let mut ranked: Vec<(String, f32)> = candidate_labels
            .iter()
            .map(|label| label.to_string())
            .zip(scores)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (labels, scores): (Vec<String>, Vec<f32>) = ranked.into_iter().unzip();
        Ok(ClassificationResult {
            sequence: text.to_string(),
            labels,
            scores,
        })
    }
}

pub(crate) fn validate_template(template: &str) -> Result<()> {
    if template.contains("{}") {
        Ok(())
    } else {
        Err(InspectError::InvalidInput(format!(
            "hypothesis template {template:?} has no `{{}}` placeholder for the label"
        )))
    }
}
