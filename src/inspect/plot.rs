//! SVG bar charts drawn with `plotters`.

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use super::chart::{BarChart, ChartBackend, Figure, Orientation};
use crate::core::{ChartConfig, InspectError, Result};

const DEFAULT_FILE_NAME: &str = "zeroshot_inspect_scores.svg";
const DEFAULT_SIZE: (u32, u32) = (800, 480);

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> InspectError {
    InspectError::Chart(err.to_string())
}

/// Draws horizontal bar charts into an SVG document.
///
/// Labels run up the y axis in row order (first row at the bottom) and
/// scores along the x axis. [`Figure::show`] writes the document to
/// [`SvgChart::path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgChart {
    path: PathBuf,
    size: (u32, u32),
}

impl SvgChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render `chart` to an SVG string without touching the filesystem.
    pub fn render(&self, chart: &BarChart) -> Result<String> {
        if chart.orientation != Orientation::Horizontal {
            return Err(InspectError::InvalidInput(
                "SVG charts only support horizontal bars".into(),
            ));
        }
        if chart.labels.len() != chart.scores.len() {
            return Err(InspectError::MalformedResult {
                labels: chart.labels.len(),
                scores: chart.scores.len(),
            });
        }

        let rows = chart.len();
        let (low, high) = score_range(&chart.scores);
        let label_chars = chart
            .labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        let label_area = (label_chars as u32 * 8 + 24).min(self.size.0 / 2);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(draw_error)?;

            let mut plot = ChartBuilder::on(&root)
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(label_area)
                .build_cartesian_2d(low..high, (0..rows.max(1)).into_segmented())
                .map_err(draw_error)?;

            // Segment keys run 0..=rows; ask for one label per key.
            plot.configure_mesh()
                .disable_y_mesh()
                .y_labels(rows.max(1) + 1)
                .y_label_formatter(&|value: &SegmentValue<usize>| match value {
                    SegmentValue::CenterOf(row) => chart.labels.get(*row).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .x_desc("scores")
                .y_desc("labels")
                .draw()
                .map_err(draw_error)?;

            // Non-finite scores have no length to draw.
            plot.draw_series(
                chart
                    .scores
                    .iter()
                    .enumerate()
                    .filter(|(_, score)| score.is_finite())
                    .map(|(row, &score)| {
                        let mut bar = Rectangle::new(
                            [
                                (0.0, SegmentValue::Exact(row)),
                                (score, SegmentValue::Exact(row + 1)),
                            ],
                            BLUE.mix(0.7).filled(),
                        );
                        bar.set_margin(4, 4, 0, 0);
                        bar
                    }),
            )
            .map_err(draw_error)?;

            root.present().map_err(draw_error)?;
        }
        Ok(svg)
    }
}

/// x range covering zero and every finite score, at least `0..1`.
fn score_range(scores: &[f32]) -> (f32, f32) {
    scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold((0.0f32, 1.0f32), |(low, high), s| (low.min(s), high.max(s)))
}

impl Default for SvgChart {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join(DEFAULT_FILE_NAME))
    }
}

impl From<&ChartConfig> for SvgChart {
    fn from(config: &ChartConfig) -> Self {
        let chart = match &config.output {
            Some(path) => Self::new(path),
            None => Self::default(),
        };
        chart.with_size(config.image_width, config.image_height)
    }
}

impl ChartBackend for SvgChart {
    type Figure = SvgFigure;

    fn bar(&mut self, chart: BarChart) -> Result<SvgFigure> {
        let svg = self.render(&chart)?;
        tracing::debug!(bars = chart.len(), bytes = svg.len(), "rendered svg chart");
        Ok(SvgFigure {
            svg,
            path: self.path.clone(),
        })
    }
}

/// A rendered SVG chart; [`Figure::show`] saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgFigure {
    svg: String,
    path: PathBuf,
}

impl SvgFigure {
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Figure for SvgFigure {
    fn show(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &self.svg)?;
        tracing::info!(path = ?self.path, "chart written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(labels: &[&str], scores: &[f32]) -> BarChart {
        BarChart::horizontal(labels.iter().map(|l| l.to_string()).collect(), scores.to_vec())
    }

    #[test]
    fn svg_names_every_label() {
        let svg = SvgChart::new("unused.svg")
            .render(&chart(&["farewell", "greeting"], &[0.1, 0.9]))
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("farewell"));
        assert!(svg.contains("greeting"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn range_covers_negative_and_large_scores() {
        assert_eq!(score_range(&[0.2, 0.7]), (0.0, 1.0));
        assert_eq!(score_range(&[-0.5, 3.0, f32::NAN]), (-0.5, 3.0));
        assert_eq!(score_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn empty_and_nan_charts_still_render() {
        let backend = SvgChart::default();
        assert!(backend.render(&chart(&[], &[])).is_ok());
        assert!(backend.render(&chart(&["nan"], &[f32::NAN])).is_ok());
    }

    #[test]
    fn vertical_and_ragged_charts_are_rejected() {
        let mut vertical = chart(&["a"], &[1.0]);
        vertical.orientation = Orientation::Vertical;
        assert!(matches!(
            SvgChart::default().render(&vertical),
            Err(InspectError::InvalidInput(_))
        ));

        let ragged = BarChart::horizontal(vec!["a".into(), "b".into()], vec![1.0]);
        assert!(matches!(
            SvgChart::default().render(&ragged),
            Err(InspectError::MalformedResult { labels: 2, scores: 1 })
        ));
    }

    #[test]
    fn show_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("scores.svg");
        let config = ChartConfig {
            output: Some(path.clone()),
            image_width: 640,
            image_height: 320,
            ..ChartConfig::default()
        };
        let mut backend = SvgChart::from(&config);
        let figure = backend.bar(chart(&["jobs"], &[0.8])).unwrap();

        assert!(!path.exists());
        figure.show().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), figure.svg());
        assert!(figure.svg().contains("640"));
    }
}
