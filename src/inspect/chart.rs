//! Bar charts of label scores.
//!
//! Charts are produced in two steps like a plotting library's figure API:
//! [`ChartBackend::bar`] builds a figure, [`Figure::show`] displays it.

use std::io::Write;

use crate::core::{ChartConfig, InspectError, Result};

const BAR_GLYPH: char = '█';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Data for a bar chart: one bar per label, sized by its score.
///
/// With [`Orientation::Horizontal`] labels run along the y axis and scores
/// along the x axis. Rows are given bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
    pub orientation: Orientation,
}

impl BarChart {
    pub fn horizontal(labels: Vec<String>, scores: Vec<f32>) -> Self {
        Self {
            labels,
            scores,
            orientation: Orientation::Horizontal,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub trait Figure {
    fn show(&self) -> Result<()>;
}

pub trait ChartBackend {
    type Figure: Figure;

    fn bar(&mut self, chart: BarChart) -> Result<Self::Figure>;
}

/// Renders horizontal bar charts as text, one line per bar.
///
/// Terminal fallback for [`SvgChart`](super::plot::SvgChart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChart {
    width: usize,
    precision: usize,
}

impl TextChart {
    pub fn new(width: usize, precision: usize) -> Self {
        Self { width, precision }
    }

    pub fn render(&self, chart: &BarChart) -> Result<Vec<String>> {
        if chart.orientation != Orientation::Horizontal {
            return Err(InspectError::InvalidInput(
                "text charts only support horizontal bars".into(),
            ));
        }
        if chart.labels.len() != chart.scores.len() {
            return Err(InspectError::MalformedResult {
                labels: chart.labels.len(),
                scores: chart.scores.len(),
            });
        }

        let label_width = chart
            .labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        let max_score = chart
            .scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(0.0f32, f32::max);

        // First row is the bottom of the y axis, so it is printed last.
        let lines = chart
            .labels
            .iter()
            .zip(&chart.scores)
            .rev()
            .map(|(label, &score)| {
                let bar: String = std::iter::repeat(BAR_GLYPH)
                    .take(self.bar_len(score, max_score))
                    .collect();
                format!(
                    "{label:>lw$} |{bar} {score:.prec$}",
                    lw = label_width,
                    prec = self.precision
                )
            })
            .collect();
        Ok(lines)
    }

    fn bar_len(&self, score: f32, max_score: f32) -> usize {
        if max_score <= 0.0 || !score.is_finite() || score <= 0.0 {
            return 0;
        }
        let len = (score / max_score * self.width as f32).round() as usize;
        len.min(self.width)
    }
}

impl Default for TextChart {
    fn default() -> Self {
        Self::from(&ChartConfig::default())
    }
}

impl From<&ChartConfig> for TextChart {
    fn from(config: &ChartConfig) -> Self {
        Self::new(config.width, config.precision)
    }
}

impl ChartBackend for TextChart {
    type Figure = TextFigure;

    fn bar(&mut self, chart: BarChart) -> Result<TextFigure> {
        let lines = self.render(&chart)?;
        tracing::debug!(bars = lines.len(), "rendered bar chart");
        Ok(TextFigure { lines })
    }
}

/// A rendered text chart; [`Figure::show`] prints it to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFigure {
    lines: Vec<String>,
}

impl TextFigure {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Figure for TextFigure {
    fn show(&self) -> Result<()> {
        self.write_to(&mut std::io::stdout().lock())
    }
}
