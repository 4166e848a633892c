//! ModernBERT encoder with a sequence-classification head, used as an NLI
//! model for zero-shot classification.
//!
//! ModernBERT is a bidirectional encoder-only Transformer with:
//! - Sliding window attention for efficient long context processing
//! - Global attention every few layers for long-range dependencies
//! - Rotary position embeddings with separate local/global bases
//!
//! The zero-shot checkpoints (`MoritzLaurer/ModernBERT-{base,large}-zeroshot-v2.0`)
//! are fine-tuned on `entailment` / `not_entailment`:
//!
//! ```text
//! "id2label": { "0": "entailment", "1": "not_entailment" },
//! "classifier_pooling": "mean",
//! "global_attn_every_n_layers": 3,
//! "local_attention": 128,
//! ```

use candle_core::{DType, Device, IndexOp, Result, Tensor, D};
use candle_nn::{
    embedding, layer_norm_no_bias, linear, linear_no_bias, ops::softmax, Embedding, LayerNorm,
    Linear, Module, VarBuilder,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const NEG_INF: f32 = f32::NEG_INFINITY;
const MIN_VALUE_F64: f64 = f32::MIN as f64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    pub layer_norm_eps: f64,
    pub pad_token_id: u32,
    pub global_attn_every_n_layers: usize,
    pub global_rope_theta: f64,
    pub local_attention: usize,
    pub local_rope_theta: f64,
    #[serde(flatten)]
    pub classifier_config: Option<ClassifierConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierPooling {
    #[default]
    CLS,
    MEAN,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassifierConfig {
    pub id2label: HashMap<String, String>,
    pub label2id: HashMap<String, u32>,
    #[serde(default)]
    pub classifier_pooling: ClassifierPooling,
}

impl ClassifierConfig {
    /// Column of the classifier output holding the entailment logit.
    pub fn entailment_index(&self) -> Option<usize> {
        self.label2id
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case("entailment"))
            .map(|(_, &id)| id as usize)
    }
}

/// Rotary Position Embedding (RoPE).
#[derive(Debug, Clone)]
struct RoPE {
    sin: Tensor,
    cos: Tensor,
}

impl RoPE {
    fn new(dtype: DType, config: &Config, rope_theta: f64, device: &Device) -> Result<Self> {
        let dim = config.hidden_size / config.num_attention_heads;
        let inv_freq: Vec<f32> = (0..dim)
            .step_by(2)
            .map(|i| (1.0 / rope_theta.powf(i as f64 / dim as f64)) as f32)
            .collect();

        let inv_freq_len = inv_freq.len();
        let inv_freq = Tensor::from_vec(inv_freq, (1, inv_freq_len), device)?.to_dtype(dtype)?;
        let max_seq_len = config.max_position_embeddings;
        let positions = Tensor::arange(0u32, max_seq_len as u32, device)?
            .to_dtype(dtype)?
            .reshape((max_seq_len, 1))?;
        let angles = positions.matmul(&inv_freq)?;

        Ok(Self {
            sin: angles.sin()?,
            cos: angles.cos()?,
        })
    }

    fn apply(&self, q: &Tensor, k: &Tensor) -> Result<(Tensor, Tensor)> {
        let q_embed = candle_nn::rotary_emb::rope(&q.contiguous()?, &self.cos, &self.sin)?;
        let k_embed = candle_nn::rotary_emb::rope(&k.contiguous()?, &self.cos, &self.sin)?;
        Ok((q_embed, k_embed))
    }
}

#[derive(Debug, Clone)]
struct Attention {
    qkv: Linear,
    proj: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
    rope: Arc<RoPE>,
}

impl Attention {
    fn load(vb: VarBuilder, config: &Config, rope: Arc<RoPE>) -> Result<Self> {
        let num_attention_heads = config.num_attention_heads;
        let attention_head_size = config.hidden_size / config.num_attention_heads;

        let qkv = linear_no_bias(config.hidden_size, config.hidden_size * 3, vb.pp("Wqkv"))?;
        let proj = linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("Wo"))?;

        Ok(Self {
            qkv,
            proj,
            num_attention_heads,
            attention_head_size,
            rope,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let qkv = hidden_states
            .apply(&self.qkv)?
            .reshape((
                batch,
                seq_len,
                3,
                self.num_attention_heads,
                self.attention_head_size,
            ))?
            .permute((2, 0, 3, 1, 4))?;

        let q = qkv.get(0)?;
        let k = qkv.get(1)?;
        let v = qkv.get(2)?;

        let (q, k) = self.rope.apply(&q, &k)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let q = (q * scale)?;

        let attention_scores = q.matmul(&k.transpose(D::Minus2, D::Minus1)?)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax(&attention_scores, D::Minus1)?;

        attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden_size))?
            .apply(&self.proj)
    }
}

/// Feed-forward network with GeGLU activation.
#[derive(Debug, Clone)]
struct FeedForward {
    wi: Linear,
    wo: Linear,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let wi = linear_no_bias(
            config.hidden_size,
            config.intermediate_size * 2,
            vb.pp("Wi"),
        )?;
        let wo = linear_no_bias(config.intermediate_size, config.hidden_size, vb.pp("Wo"))?;
        Ok(Self { wi, wo })
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.apply(&self.wi)?;
        let chunks = xs.chunk(2, D::Minus1)?;
        (&chunks[0].gelu_erf()? * &chunks[1])?.apply(&self.wo)
    }
}

#[derive(Debug, Clone)]
struct TransformerLayer {
    attention: Attention,
    feed_forward: FeedForward,
    // Layer 0 has no attention norm; the embedding norm plays that role.
    attention_norm: Option<LayerNorm>,
    ffn_norm: LayerNorm,
    uses_local_attention: bool,
}

impl TransformerLayer {
    fn load(
        vb: VarBuilder,
        config: &Config,
        rope: Arc<RoPE>,
        uses_local_attention: bool,
    ) -> Result<Self> {
        let attention = Attention::load(vb.pp("attn"), config, rope)?;
        let feed_forward = FeedForward::load(vb.pp("mlp"), config)?;

        let attention_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("attn_norm"),
        )
        .ok();

        let ffn_norm =
            layer_norm_no_bias(config.hidden_size, config.layer_norm_eps, vb.pp("mlp_norm"))?;

        Ok(Self {
            attention,
            feed_forward,
            attention_norm,
            ffn_norm,
            uses_local_attention,
        })
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        global_attention_mask: &Tensor,
        local_attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let normed = match &self.attention_norm {
            Some(norm) => hidden_states.apply(norm)?,
            None => hidden_states.clone(),
        };

        let attention_mask = if self.uses_local_attention {
            &global_attention_mask.broadcast_add(local_attention_mask)?
        } else {
            global_attention_mask
        };

        let attention_output = self.attention.forward(&normed, attention_mask)?;
        let hidden_states = (hidden_states + attention_output)?;

        let ffn_output = hidden_states
            .apply(&self.ffn_norm)?
            .apply(&self.feed_forward)?;
        hidden_states + ffn_output
    }
}

#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    norm: LayerNorm,
    classifier: Linear,
    pooling: ClassifierPooling,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dense = linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("head.dense"))?;
        let norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("head.norm"),
        )?;

        let num_labels = config
            .classifier_config
            .as_ref()
            .map_or(0, |c| c.id2label.len());
        let classifier = linear(config.hidden_size, num_labels, vb.pp("classifier"))?;

        let pooling = config
            .classifier_config
            .as_ref()
            .map_or(ClassifierPooling::CLS, |c| c.classifier_pooling);

        Ok(Self {
            dense,
            norm,
            classifier,
            pooling,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let pooled = match self.pooling {
            ClassifierPooling::CLS => hidden_states.i((.., 0, ..))?,
            ClassifierPooling::MEAN => {
                let mask = attention_mask.unsqueeze(D::Minus1)?.to_dtype(DType::F32)?;
                let sum_hidden = hidden_states.broadcast_mul(&mask)?.sum(1)?;
                let sum_mask = attention_mask.sum_keepdim(1)?.to_dtype(DType::F32)?;
                sum_hidden.broadcast_div(&sum_mask)?
            }
        };

        pooled
            .apply(&self.dense)?
            .gelu_erf()?
            .apply(&self.norm)?
            .apply(&self.classifier)
    }
}

/// Encoder weights shared by every clone of a loaded model.
#[derive(Debug, Clone)]
struct ModelWeights {
    embeddings: Embedding,
    embedding_norm: LayerNorm,
    layers: Vec<TransformerLayer>,
    final_norm: LayerNorm,
    local_attention_size: usize,
    device: Device,
    dtype: DType,
}

impl ModelWeights {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("model.embeddings.tok_embeddings"),
        )?;

        let embedding_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("model.embeddings.norm"),
        )?;

        let global_rope = Arc::new(RoPE::new(
            vb.dtype(),
            config,
            config.global_rope_theta,
            vb.device(),
        )?);
        let local_rope = Arc::new(RoPE::new(
            vb.dtype(),
            config,
            config.local_rope_theta,
            vb.device(),
        )?);

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for layer_idx in 0..config.num_hidden_layers {
            let uses_local_attention = layer_idx % config.global_attn_every_n_layers != 0;
            let rope = if uses_local_attention {
                local_rope.clone()
            } else {
                global_rope.clone()
            };

            layers.push(TransformerLayer::load(
                vb.pp(format!("model.layers.{layer_idx}")),
                config,
                rope,
                uses_local_attention,
            )?);
        }

        let final_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("model.final_norm"),
        )?;

        Ok(Self {
            embeddings,
            embedding_norm,
            layers,
            final_norm,
            local_attention_size: config.local_attention,
            device: vb.device().clone(),
            dtype: vb.dtype(),
        })
    }

    /// Additive mask hiding padded positions.
    fn create_global_attention_mask(&self, mask: &Tensor) -> Result<Tensor> {
        let (batch_size, seq_len) = mask.dims2()?;

        let expanded_mask = mask
            .unsqueeze(1)?
            .unsqueeze(2)?
            .expand((batch_size, 1, seq_len, seq_len))?
            .to_dtype(self.dtype)?;

        let inverted_mask = (1.0 - expanded_mask)?;
        (inverted_mask * MIN_VALUE_F64)?.to_dtype(self.dtype)
    }

    /// Additive mask restricting attention to the sliding window.
    fn create_local_attention_mask(&self, seq_len: usize) -> Result<Tensor> {
        let max_distance = self.local_attention_size / 2;
        let mask: Vec<f32> = (0..seq_len)
            .flat_map(|i| {
                (0..seq_len).map(move |j| {
                    if i.abs_diff(j) > max_distance {
                        NEG_INF
                    } else {
                        0.0
                    }
                })
            })
            .collect();

        Tensor::from_slice(&mask, (seq_len, seq_len), &self.device)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;

        let global_attention_mask = self.create_global_attention_mask(attention_mask)?;
        let local_attention_mask = self.create_local_attention_mask(seq_len)?;

        let mut hidden_states = input_ids
            .apply(&self.embeddings)?
            .apply(&self.embedding_norm)?;

        for layer in &self.layers {
            hidden_states = layer.forward(
                &hidden_states,
                &global_attention_mask,
                &local_attention_mask,
            )?;
        }

        hidden_states.apply(&self.final_norm)
    }
}

/// ModernBERT model for sequence classification.
#[derive(Debug, Clone)]
pub struct ModernBertForSequenceClassification {
    weights: Arc<ModelWeights>,
    head: ClassificationHead,
}

impl ModernBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let weights = Arc::new(ModelWeights::load(vb.clone(), config)?);
        let head = ClassificationHead::load(vb, config)?;
        Ok(Self { weights, head })
    }

    /// Forward pass for sequence classification.
    ///
    /// # Arguments
    /// * `input_ids` - Token IDs with shape `(batch_size, sequence_length)`
    /// * `attention_mask` - Attention mask with shape `(batch_size, sequence_length)` (1 for unmasked, 0 for padded)
    ///
    /// # Returns
    /// Classification logits with shape `(batch_size, num_labels)`
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.weights.forward(input_ids, attention_mask)?;
        self.head.forward(&hidden_states, attention_mask)
    }

    pub fn num_layers(&self) -> usize {
        self.weights.layers.len()
    }
}

/*
Zero-shot model
*/

use crate::core::{InspectError, ModelOptions, Result as InspectResult};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;

/// Available zero-shot ModernBERT checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModernBertSize {
    Base,
    Large,
}

impl ModernBertSize {
    pub fn repo_id(&self) -> &'static str {
        match self {
            ModernBertSize::Base => "MoritzLaurer/ModernBERT-base-zeroshot-v2.0",
            ModernBertSize::Large => "MoritzLaurer/ModernBERT-large-zeroshot-v2.0",
        }
    }
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base-zeroshot",
            ModernBertSize::Large => "modernbert-large-zeroshot",
        };
        write!(f, "{name}")
    }
}

impl ModelOptions for ModernBertSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// NLI model scoring whether a premise entails each hypothesis.
#[derive(Clone)]
pub struct ZeroShotModernBertModel {
    model: ModernBertForSequenceClassification,
    device: Device,
    entailment_index: usize,
}

impl ZeroShotModernBertModel {
    pub fn new(size: ModernBertSize, device: Device) -> InspectResult<Self> {
        let model_id = size.repo_id();
        tracing::info!(model = model_id, device = ?device.location(), "loading zero-shot model");

        let api = Api::new()?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_filename = repo.get("config.json")?;
        let weights_filename = match repo.get("model.safetensors") {
            Ok(safetensors) => safetensors,
            Err(_) => repo.get("pytorch_model.bin").map_err(|e| {
                InspectError::Download(format!(
                    "Model weights not found in repo {model_id}. Expected `model.safetensors` or `pytorch_model.bin`. Error: {e}"
                ))
            })?,
        };

        let config_content = std::fs::read_to_string(&config_filename).map_err(|e| {
            InspectError::Config(format!("Failed to read config file {config_filename:?}: {e}"))
        })?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| InspectError::Config(format!("Failed to parse model config: {e}")))?;

        let entailment_index = config
            .classifier_config
            .as_ref()
            .and_then(ClassifierConfig::entailment_index)
            .ok_or_else(|| {
                InspectError::Config(format!(
                    "{model_id}: label2id has no `entailment` label, not an NLI checkpoint"
                ))
            })?;

        let dtype = DType::F32;
        let vb = if weights_filename
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_filename], dtype, &device)? }
        } else {
            VarBuilder::from_pth(&weights_filename, dtype, &device)?
        };

        let model = ModernBertForSequenceClassification::load(vb, &config)?;
        tracing::info!(
            model = model_id,
            layers = model.num_layers(),
            "zero-shot model ready"
        );

        Ok(Self {
            model,
            device,
            entailment_index,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn get_tokenizer(size: ModernBertSize) -> InspectResult<Tokenizer> {
        let api = Api::new()?;
        let repo = api.repo(Repo::new(size.repo_id().to_string(), RepoType::Model));
        let tokenizer_filename = repo.get("tokenizer.json")?;

        Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| InspectError::Tokenization(format!("Failed to load tokenizer: {e}")))
    }

    /// Entailment probability of `(premise, hypothesis)` for each hypothesis, in input order.
    pub fn entailment_scores(
        &self,
        tokenizer: &Tokenizer,
        premise: &str,
        hypotheses: &[String],
    ) -> InspectResult<Vec<f32>> {
        if hypotheses.is_empty() {
            return Ok(vec![]);
        }

        let encodings = hypotheses
            .iter()
            .map(|hypothesis| {
                tokenizer
                    .encode((premise, hypothesis.as_str()), true)
                    .map_err(|e| InspectError::Tokenization(format!("Tokenization error: {e}")))
            })
            .collect::<InspectResult<Vec<_>>>()?;

        let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let pad_token_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);

        let mut all_token_ids: Vec<u32> = Vec::with_capacity(hypotheses.len() * max_len);
        let mut all_attention_masks: Vec<u32> = Vec::with_capacity(hypotheses.len() * max_len);

        for encoding in encodings {
            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();

            token_ids.resize(max_len, pad_token_id);
            attention_mask.resize(max_len, 0);

            all_token_ids.extend(token_ids);
            all_attention_masks.extend(attention_mask);
        }

        let input_ids = Tensor::from_vec(all_token_ids, (hypotheses.len(), max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(
            all_attention_masks,
            (hypotheses.len(), max_len),
            &self.device,
        )?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probabilities = softmax(&logits, D::Minus1)?;
        let scores = probabilities
            .i((.., self.entailment_index))?
            .to_vec1::<f32>()?;

        Ok(scores)
    }
}

impl crate::pipelines::zero_shot_classification_pipeline::ZeroShotClassificationModel
    for ZeroShotModernBertModel
{
    type Options = ModernBertSize;

    fn new(options: Self::Options, device: Device) -> InspectResult<Self> {
        ZeroShotModernBertModel::new(options, device)
    }

    fn entailment_scores(
        &self,
        tokenizer: &Tokenizer,
        premise: &str,
        hypotheses: &[String],
    ) -> InspectResult<Vec<f32>> {
        self.entailment_scores(tokenizer, premise, hypotheses)
    }

    fn get_tokenizer(options: Self::Options) -> InspectResult<Tokenizer> {
        Self::get_tokenizer(options)
    }

    fn device(&self) -> &Device {
        self.device()
    }
}
