//! Inspect one row of a dataset with the ModernBERT zero-shot classifier.
//!
//! ```text
//! cargo run --example analyze_one -- demos/sample.jsonl 0 jobs events "career update"
//! ```
//!
//! Set `ZEROSHOT_CONFIG` to a JSON config file to pick the model size, device,
//! hypothesis template or chart settings, and `RUST_LOG=debug` for progress logs.
//! The chart is saved as SVG unless the config sets `"chart": {"kind": "text"}`.

use anyhow::{bail, Context, Result};
use zeroshot_inspect::core::{ChartKind, InspectConfig};
use zeroshot_inspect::inspect::{Dataset, Inspector, SvgChart, TextChart};
use zeroshot_inspect::pipelines::zero_shot_classification_pipeline::*;

const DEFAULT_LABELS: &[&str] = &["jobs", "career update", "events", "thought leadership"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(index)) = (args.next(), args.next()) else {
        bail!("usage: analyze_one <dataset.json|dataset.jsonl> <index> [label ...]");
    };
    let index: usize = index
        .parse()
        .with_context(|| format!("row index must be a non-negative integer, got {index:?}"))?;
    let labels: Vec<String> = args.collect();
    let labels: Vec<&str> = if labels.is_empty() {
        DEFAULT_LABELS.to_vec()
    } else {
        labels.iter().map(String::as_str).collect()
    };

    let config = match std::env::var_os("ZEROSHOT_CONFIG") {
        Some(path) => InspectConfig::from_path(path)?,
        None => InspectConfig::default(),
    };

    let dataset = Dataset::from_path(&path)?;
    println!("Loaded {} rows from {path}", dataset.len());

    println!("Building pipeline...");
    let pipeline = ZeroShotClassificationPipelineBuilder::from_config(&config).build()?;
    println!("Pipeline built successfully.\n");

    let stdout = std::io::stdout();
    match config.chart.kind {
        ChartKind::Svg => {
            let chart = SvgChart::from(&config.chart);
            let path = chart.path().to_path_buf();
            Inspector::new(&pipeline, chart, stdout.lock()).analyze_one(&dataset, &labels, index)?;
            println!("\nChart saved to {}", path.display());
        }
        ChartKind::Text => {
            Inspector::new(&pipeline, TextChart::from(&config.chart), stdout.lock())
                .analyze_one(&dataset, &labels, index)?;
        }
    }

    Ok(())
}
