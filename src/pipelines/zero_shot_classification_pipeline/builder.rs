use super::model::ZeroShotClassificationModel;
use super::pipeline::{validate_template, ZeroShotClassificationPipeline};
use crate::core::{global_cache, InspectConfig, ModelOptions, Result, DEFAULT_HYPOTHESIS_TEMPLATE};
use crate::models::{ModernBertSize, ZeroShotModernBertModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

pub struct ZeroShotClassificationPipelineBuilder<M: ZeroShotClassificationModel> {
    options: M::Options,
    device_request: DeviceRequest,
    hypothesis_template: String,
    multi_label: bool,
}

impl<M: ZeroShotClassificationModel> ZeroShotClassificationPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            multi_label: false,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device_request = DeviceRequest::Explicit(device);
        self
    }

    /// Template turning a label into an NLI hypothesis; `{}` marks the label.
    pub fn hypothesis_template(mut self, template: impl Into<String>) -> Self {
        self.hypothesis_template = template.into();
        self
    }

    /// Score each label independently instead of normalizing across labels.
    pub fn multi_label(mut self, multi_label: bool) -> Self {
        self.multi_label = multi_label;
        self
    }

    pub fn build(self) -> Result<ZeroShotClassificationPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions,
    {
        validate_template(&self.hypothesis_template)?;

        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        tracing::info!(key = %key, "building zero-shot classification pipeline");

        let model = global_cache().get_or_create(&key, || M::new(self.options.clone(), device))?;
        let tokenizer = M::get_tokenizer(self.options)?;

        Ok(ZeroShotClassificationPipeline {
            model,
            tokenizer,
            hypothesis_template: self.hypothesis_template,
            multi_label: self.multi_label,
        })
    }
}

impl ZeroShotClassificationPipelineBuilder<ZeroShotModernBertModel> {
    pub fn modernbert(size: ModernBertSize) -> Self {
        Self::new(size)
    }

    /// Builder preloaded with model size, device and template from a config file.
    pub fn from_config(config: &InspectConfig) -> Self {
        let mut builder = Self::new(config.model)
            .hypothesis_template(&config.hypothesis_template)
            .multi_label(config.multi_label);
        builder.device_request = config.device.into();
        builder
    }
}
