//! Zero-shot text classification through natural language inference.
//!
//! For every `(text, candidate_label)` pair a hypothesis such as
//! "This example is {candidate_label}." is built, and an NLI model predicts
//! the probability that the text entails it.

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::ZeroShotClassificationPipelineBuilder;
pub use model::ZeroShotClassificationModel;
pub use pipeline::ZeroShotClassificationPipeline;

pub use crate::core::Result;
pub use crate::models::ModernBertSize;
