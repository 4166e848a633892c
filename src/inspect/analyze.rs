use std::io::Write;

use super::chart::{BarChart, ChartBackend, Figure};
use super::dataset::Dataset;
use super::plot::SvgChart;
use super::result::{ClassificationResult, ScoreTable};
use crate::core::Result;
use crate::pipelines::zero_shot_classification_pipeline::{
    ZeroShotClassificationModel, ZeroShotClassificationPipeline,
};

/// Anything that scores a text against candidate labels.
///
/// Implemented by [`ZeroShotClassificationPipeline`] and by closures with the
/// matching signature, which makes stubbing the model trivial:
///
/// ```rust
/// use zeroshot_inspect::core::Result;
/// use zeroshot_inspect::inspect::{Classifier, ClassificationResult};
///
/// let stub = |text: &str, labels: &[&str]| -> Result<ClassificationResult> {
///     Ok(ClassificationResult {
///         sequence: text.to_string(),
///         labels: labels.iter().map(|l| l.to_string()).collect(),
///         scores: vec![0.5; labels.len()],
///     })
/// };
/// let result = stub.classify("hi", &["a", "b"]).unwrap();
/// assert_eq!(result.scores, vec![0.5, 0.5]);
/// ```
pub trait Classifier {
    fn classify(&self, text: &str, candidate_labels: &[&str]) -> Result<ClassificationResult>;
}

impl<F> Classifier for F
where
    F: Fn(&str, &[&str]) -> Result<ClassificationResult>,
{
    fn classify(&self, text: &str, candidate_labels: &[&str]) -> Result<ClassificationResult> {
        self(text, candidate_labels)
    }
}

impl<M: ZeroShotClassificationModel> Classifier for ZeroShotClassificationPipeline<M> {
    fn classify(&self, text: &str, candidate_labels: &[&str]) -> Result<ClassificationResult> {
        if self.multi_label {
            self.classify_multi_label(text, candidate_labels)
        } else {
            ZeroShotClassificationPipeline::classify(self, text, candidate_labels)
        }
    }
}

/// Runs a classifier over single dataset rows and shows the scores as a chart.
///
/// The two text lines of each inspection go to `out`; the chart is displayed
/// through the backend's figures.
pub struct Inspector<'c, C: ?Sized, B, W> {
    classifier: &'c C,
    chart: B,
    out: W,
}

impl<'c, C, B, W> Inspector<'c, C, B, W>
where
    C: Classifier + ?Sized,
    B: ChartBackend,
    W: Write,
{
    pub fn new(classifier: &'c C, chart: B, out: W) -> Self {
        Self {
            classifier,
            chart,
            out,
        }
    }

    /// Classify the `input` of row `index` against `candidate_labels`, chart
    /// the scores lowest first, then print the classified text and the row's
    /// `category`.
    ///
    /// Errors are returned as soon as they happen: lines already printed stay
    /// printed and nothing is retried.
    pub fn analyze_one(
        &mut self,
        dataset: &Dataset,
        candidate_labels: &[&str],
        index: usize,
    ) -> Result<()> {
        let text = dataset.input(index)?;
        tracing::debug!(index, labels = candidate_labels.len(), "classifying row");

        let result = self.classifier.classify(text, candidate_labels)?;
        let mut table = ScoreTable::from_result(result)?;
        table.sort_by_score();

        let figure = self
            .chart
            .bar(BarChart::horizontal(table.labels(), table.scores()))?;

        writeln!(self.out, "{}", table.first_sequence()?)?;
        writeln!(self.out, "Actual Category: {}", dataset.category(index)?)?;
        self.out.flush()?;

        figure.show()
    }

    pub fn chart(&self) -> &B {
        &self.chart
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_parts(self) -> (B, W) {
        (self.chart, self.out)
    }
}

/// [`Inspector::analyze_one`] printing to stdout and saving the chart with a
/// default [`SvgChart`] (a file in the system temp directory).
pub fn analyze_one<C: Classifier + ?Sized>(
    classifier: &C,
    dataset: &Dataset,
    candidate_labels: &[&str],
    index: usize,
) -> Result<()> {
    let stdout = std::io::stdout();
    Inspector::new(classifier, SvgChart::default(), stdout.lock()).analyze_one(
        dataset,
        candidate_labels,
        index,
    )
}
