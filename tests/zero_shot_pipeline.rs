// Integration tests for the zero shot classification pipeline.
// These download ModernBERT weights from the HuggingFace hub on first run.

use zeroshot_inspect::inspect::{Classifier, Dataset, Inspector, Record, TextChart};
use zeroshot_inspect::pipelines::zero_shot_classification_pipeline::*;

#[test]
#[ignore = "downloads model weights"]
fn basic_zero_shot_classification() -> anyhow::Result<()> {
    let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(ModernBertSize::Base)
        .cpu()
        .build()?;
    let labels = ["politics", "sports"];
    let res = pipeline.classify("The election results were surprising", &labels)?;

    assert_eq!(res.labels.len(), 2);
    assert_eq!(res.labels[0], "politics");
    let total: f32 = res.scores.iter().sum();
    assert!((total - 1.0).abs() < 1e-4);
    Ok(())
}

#[test]
#[ignore = "downloads model weights"]
fn analyze_one_with_modernbert() -> anyhow::Result<()> {
    let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(ModernBertSize::Base)
        .cpu()
        .multi_label(true)
        .build()?;
    let dataset = Dataset::new(vec![Record::labeled(
        "We are hiring a senior Rust engineer, apply today!",
        "jobs",
    )]);
    let labels = ["jobs", "cooking", "weather"];

    let scored = Classifier::classify(&pipeline, dataset.input(0)?, &labels)?;
    assert_eq!(scored.labels.len(), labels.len());

    let mut inspector = Inspector::new(&pipeline, TextChart::default(), Vec::new());
    inspector.analyze_one(&dataset, &labels, 0)?;

    let (_, out) = inspector.into_parts();
    assert_eq!(
        String::from_utf8(out)?,
        "We are hiring a senior Rust engineer, apply today!\nActual Category: jobs\n"
    );
    Ok(())
}
