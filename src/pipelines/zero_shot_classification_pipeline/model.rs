use tokenizers::Tokenizer;

use crate::core::Result;

/// An NLI model that can back a [`ZeroShotClassificationPipeline`](super::ZeroShotClassificationPipeline).
pub trait ZeroShotClassificationModel {
    type Options: std::fmt::Debug + Clone;

    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Probability that `premise` entails each hypothesis, one score per hypothesis in input order.
    fn entailment_scores(
        &self,
        tokenizer: &Tokenizer,
        premise: &str,
        hypotheses: &[String],
    ) -> Result<Vec<f32>>;

    fn get_tokenizer(options: Self::Options) -> Result<Tokenizer>;

    fn device(&self) -> &candle_core::Device;
}
