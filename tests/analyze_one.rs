// Integration tests for single-row inspection.
// Collaborators are stubbed so these run without model weights.

use std::cell::RefCell;
use std::rc::Rc;

use zeroshot_inspect::core::{InspectError, Result};
use zeroshot_inspect::inspect::*;

/// Chart backend that records every chart and every `show` call.
#[derive(Default, Clone)]
struct RecordingChart {
    log: Rc<RefCell<Vec<String>>>,
    charts: Rc<RefCell<Vec<BarChart>>>,
}

struct RecordingFigure {
    log: Rc<RefCell<Vec<String>>>,
}

impl Figure for RecordingFigure {
    fn show(&self) -> Result<()> {
        self.log.borrow_mut().push("show".to_string());
        Ok(())
    }
}

impl ChartBackend for RecordingChart {
    type Figure = RecordingFigure;

    fn bar(&mut self, chart: BarChart) -> Result<RecordingFigure> {
        self.log.borrow_mut().push("bar".to_string());
        self.charts.borrow_mut().push(chart);
        Ok(RecordingFigure {
            log: self.log.clone(),
        })
    }
}

fn greeting_dataset() -> Dataset {
    Dataset::new(vec![
        Record::labeled("good night", "farewell"),
        Record::labeled("hello", "greeting"),
    ])
}

fn fixed(
    labels: &'static [&'static str],
    scores: &'static [f32],
) -> impl Fn(&str, &[&str]) -> Result<ClassificationResult> {
    move |text: &str, _candidates: &[&str]| -> Result<ClassificationResult> {
        Ok(ClassificationResult {
            sequence: text.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            scores: scores.to_vec(),
        })
    }
}

#[test]
fn chart_receives_scores_in_ascending_order() -> anyhow::Result<()> {
    let classifier = fixed(&["greeting", "farewell"], &[0.9, 0.1]);
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["greeting", "farewell"], 1)?;

    let charts = chart.charts.borrow();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].labels, vec!["farewell", "greeting"]);
    assert_eq!(charts[0].scores, vec![0.1, 0.9]);
    assert_eq!(charts[0].orientation, Orientation::Horizontal);
    Ok(())
}

#[test]
fn prints_exactly_the_sequence_and_the_category() -> anyhow::Result<()> {
    let classifier = fixed(&["greeting", "farewell"], &[0.9, 0.1]);
    let mut inspector = Inspector::new(&classifier, RecordingChart::default(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["greeting", "farewell"], 1)?;

    let (_, out) = inspector.into_parts();
    let printed = String::from_utf8(out)?;
    assert_eq!(
        printed.lines().collect::<Vec<_>>(),
        vec!["hello", "Actual Category: greeting"]
    );
    Ok(())
}

#[test]
fn chart_is_built_before_printing_and_shown_last() -> anyhow::Result<()> {
    let classifier = fixed(&["greeting"], &[1.0]);
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["greeting"], 0)?;

    assert_eq!(*chart.log.borrow(), vec!["bar", "show"]);
    Ok(())
}

#[test]
fn chart_rows_match_classifier_labels() -> anyhow::Result<()> {
    let echo = |text: &str, labels: &[&str]| -> Result<ClassificationResult> {
        Ok(ClassificationResult {
            sequence: text.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            scores: (0..labels.len()).map(|i| (i % 3) as f32 / 3.0).collect(),
        })
    };
    let candidates = ["jobs", "news", "sales", "events", "jobs"];
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&echo, chart.clone(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &candidates, 0)?;

    let charts = chart.charts.borrow();
    assert_eq!(charts[0].labels.len(), candidates.len());
    assert_eq!(charts[0].scores.len(), candidates.len());
    Ok(())
}

#[test]
fn equal_scores_keep_classifier_order() -> anyhow::Result<()> {
    let classifier = fixed(&["b", "a", "c"], &[0.4, 0.4, 0.2]);
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["a", "b", "c"], 0)?;

    assert_eq!(chart.charts.borrow()[0].labels, vec!["c", "b", "a"]);
    Ok(())
}

#[test]
fn index_equal_to_len_is_out_of_range() {
    let classifier = fixed(&["greeting"], &[1.0]);
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    let err = inspector
        .analyze_one(&greeting_dataset(), &["greeting"], 2)
        .unwrap_err();

    assert!(matches!(err, InspectError::IndexOutOfRange { index: 2, len: 2 }));
    assert!(chart.log.borrow().is_empty());
    assert!(inspector.output().is_empty());
}

#[test]
fn malformed_classifier_output_is_an_error() {
    let classifier = fixed(&["greeting", "farewell"], &[0.9]);
    let mut inspector = Inspector::new(&classifier, RecordingChart::default(), Vec::new());

    let err = inspector
        .analyze_one(&greeting_dataset(), &["greeting", "farewell"], 0)
        .unwrap_err();

    assert!(matches!(err, InspectError::MalformedResult { .. }));
}

#[test]
fn classifier_errors_propagate_unchanged() {
    let failing = |_: &str, _: &[&str]| -> Result<ClassificationResult> {
        Err(InspectError::InvalidInput("no labels".into()))
    };
    let mut inspector = Inspector::new(&failing, RecordingChart::default(), Vec::new());

    let err = inspector
        .analyze_one(&greeting_dataset(), &[], 0)
        .unwrap_err();

    assert_eq!(err.to_string(), "no labels");
}

#[test]
fn missing_category_fails_after_the_sequence_line() {
    let dataset = Dataset::from_json_str(r#"[{"input": "orphan text"}]"#).unwrap();
    let classifier = fixed(&["x"], &[1.0]);
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    let err = inspector.analyze_one(&dataset, &["x"], 0).unwrap_err();

    assert!(matches!(err, InspectError::MissingField { index: 0, ref field } if field == "category"));
    assert_eq!(inspector.output().as_slice(), b"orphan text\n");
    assert_eq!(*chart.log.borrow(), vec!["bar"]);
}

#[test]
fn text_chart_draws_the_top_label_first() -> anyhow::Result<()> {
    let classifier = fixed(&["greeting", "farewell"], &[0.9, 0.1]);
    let mut chart = TextChart::new(10, 2);
    let figure = chart.bar(BarChart::horizontal(
        vec!["farewell".into(), "greeting".into()],
        vec![0.1, 0.9],
    ))?;
    assert_eq!(figure.lines()[0], "greeting |██████████ 0.90");

    let mut inspector = Inspector::new(&classifier, chart, Vec::new());
    inspector.analyze_one(&greeting_dataset(), &["greeting", "farewell"], 1)?;
    Ok(())
}

#[test]
fn svg_chart_is_saved_when_shown() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scores.svg");
    let classifier = fixed(&["greeting", "farewell"], &[0.9, 0.1]);
    let mut inspector = Inspector::new(&classifier, SvgChart::new(&path), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["greeting", "farewell"], 1)?;

    let svg = std::fs::read_to_string(&path)?;
    assert!(svg.contains("farewell") && svg.contains("greeting"));
    let (_, out) = inspector.into_parts();
    assert_eq!(String::from_utf8(out)?, "hello\nActual Category: greeting\n");
    Ok(())
}

#[test]
fn computed_nan_score_is_charted_on_top() -> anyhow::Result<()> {
    let nan = std::hint::black_box(0.0f32) / 0.0;
    let classifier = move |text: &str, _: &[&str]| -> Result<ClassificationResult> {
        Ok(ClassificationResult {
            sequence: text.to_string(),
            labels: vec!["a".into(), "nan".into(), "b".into()],
            scores: vec![0.2, nan, 0.7],
        })
    };
    let chart = RecordingChart::default();
    let mut inspector = Inspector::new(&classifier, chart.clone(), Vec::new());

    inspector.analyze_one(&greeting_dataset(), &["a", "nan", "b"], 0)?;

    assert_eq!(chart.charts.borrow()[0].labels, vec!["a", "b", "nan"]);
    Ok(())
}
