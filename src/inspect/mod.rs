//! Single-row inspection of a zero-shot classifier.
//!
//! [`analyze_one`] takes one dataset row, scores its `input` against a set of
//! candidate labels, draws a horizontal bar chart of the scores (highest on
//! top) and prints the row's ground-truth `category` next to it.

pub mod analyze;
pub mod chart;
pub mod dataset;
pub mod plot;
pub mod result;

pub use analyze::{analyze_one, Classifier, Inspector};
pub use chart::{BarChart, ChartBackend, Figure, Orientation, TextChart, TextFigure};
pub use plot::{SvgChart, SvgFigure};
pub use dataset::{display_value, Dataset, Record, CATEGORY_FIELD, INPUT_FIELD};
pub use result::{ClassificationResult, ScoreRow, ScoreTable};
