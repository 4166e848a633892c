pub mod core;
pub mod inspect;
pub mod models;
pub mod pipelines;

// Re-export core types
pub use crate::core::{InspectConfig, InspectError, Result};

pub use inspect::{analyze_one, ClassificationResult, Classifier, Dataset, Inspector, Record};

// Re-export model types for easier access
pub use models::{ModernBertSize, ZeroShotModernBertModel};
pub use pipelines::zero_shot_classification_pipeline::{
    ZeroShotClassificationPipeline, ZeroShotClassificationPipelineBuilder,
};
