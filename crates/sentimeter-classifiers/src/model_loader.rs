//! Candle-backed transformer sentiment classifier
//!
//! Loads a fine-tuned sequence-classification model from a local directory
//! containing `config.json`, `tokenizer.json` (or `vocab.txt`) and
//! `model.safetensors`. Nothing is fetched over the network.

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::config::{ClassifierConfig, DeviceSpec};
use crate::model_config::{Architecture, ModelHeader, SENTIMENT_LABELS};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Module, Tensor, D};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use sentimeter_core::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationDirection};

fn classifier_err(context: &'static str) -> impl FnOnce(candle_core::Error) -> Error {
    move |e| Error::classifier(format!("{}: {}", context, e))
}

fn model_err(context: &'static str) -> impl FnOnce(candle_core::Error) -> Error {
    move |e| Error::model(format!("{}: {}", context, e))
}

enum Backbone {
    Bert {
        model: BertModel,
        pooler: Option<Linear>,
    },
    DistilBert {
        model: DistilBertModel,
        pre_classifier: Option<Linear>,
    },
}

/// Fine-tuned transformer with a three-way classification head
pub struct TransformerClassifier {
    name: String,
    tokenizer: Tokenizer,
    backbone: Backbone,
    classifier: Linear,
    device: Device,
    max_length: usize,
}

impl TransformerClassifier {
    /// Load the model described by `config`
    pub fn load(config: &ClassifierConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();
        if !model_path.is_dir() {
            return Err(Error::model(format!(
                "Model directory does not exist: {}",
                model_path.display()
            )));
        }

        let header = ModelHeader::from_dir(model_path)?;
        header.ensure_sentiment_head()?;
        let architecture = header.architecture()?;

        let device = get_device(config.device)?;
        let tokenizer = load_tokenizer(model_path)?;
        let vb = load_var_builder(model_path, &device)?;
        let hidden_size = header.hidden_size();

        tracing::info!(
            "Loading {:?} sentiment model from {} on {:?} (labels: {:?})",
            architecture,
            model_path.display(),
            device,
            header.labels()
        );

        let backbone = match architecture {
            Architecture::Bert => {
                let bert_config: BertConfig = parse_json_config(&model_path.join("config.json"))?;
                let (model, prefix) = load_bert_backbone(&vb, &bert_config)?;
                let pooler_vb = if prefix.is_empty() {
                    vb.pp("pooler")
                } else {
                    vb.pp(prefix).pp("pooler")
                };
                let pooler = candle_nn::linear(hidden_size, hidden_size, pooler_vb.pp("dense")).ok();
                if pooler.is_some() {
                    tracing::debug!("Loaded BERT pooler (hidden_size={})", hidden_size);
                }
                Backbone::Bert { model, pooler }
            }
            Architecture::DistilBert => {
                let distil_config: DistilBertConfig =
                    parse_json_config(&model_path.join("config.json"))?;
                let model = DistilBertModel::load(vb.pp("distilbert"), &distil_config)
                    .map_err(model_err("Failed to load DistilBERT model"))?;
                let pre_classifier =
                    candle_nn::linear(hidden_size, hidden_size, vb.pp("pre_classifier")).ok();
                if pre_classifier.is_some() {
                    tracing::debug!("Loaded pre_classifier layer (hidden_size={})", hidden_size);
                }
                Backbone::DistilBert {
                    model,
                    pre_classifier,
                }
            }
        };

        let classifier = candle_nn::linear(hidden_size, SENTIMENT_LABELS, vb.pp("classifier"))
            .map_err(model_err("Failed to load classification head"))?;

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transformer".to_string());

        tracing::info!("Sentiment model '{}' ready", name);

        Ok(Self {
            name,
            tokenizer,
            backbone,
            classifier,
            device,
            max_length: config.max_length,
        })
    }

    fn encode(&self, text: &str) -> Result<tokenizers::Encoding> {
        let mut encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))?;
        encoding.truncate(self.max_length, 0, TruncationDirection::Right);

        if encoding.get_ids().is_empty() {
            return Err(Error::classifier("Tokenizer produced no tokens"));
        }
        Ok(encoding)
    }

    fn row_tensor<T: candle_core::WithDType>(&self, values: &[T]) -> Result<Tensor> {
        Tensor::new(values, &self.device)
            .map_err(classifier_err("Failed to create input tensor"))?
            .unsqueeze(0)
            .map_err(classifier_err("Failed to unsqueeze"))
    }

    /// Pooled sentence representation, shape (1, hidden)
    fn pooled_output(&self, encoding: &tokenizers::Encoding) -> Result<Tensor> {
        match &self.backbone {
            Backbone::Bert { model, pooler } => {
                let input_ids = self.row_tensor(encoding.get_ids())?;
                let token_type_ids = self.row_tensor(encoding.get_type_ids())?;
                let attention_mask = self.row_tensor(encoding.get_attention_mask())?;

                let hidden_states = model
                    .forward(&input_ids, &token_type_ids, Some(&attention_mask))
                    .map_err(classifier_err("Model forward pass failed"))?;
                let cls = cls_embedding(&hidden_states)?;

                match pooler {
                    Some(pooler) => pooler
                        .forward(&cls)
                        .and_then(|t| t.tanh())
                        .map_err(classifier_err("Pooler failed")),
                    None => Ok(cls),
                }
            }
            Backbone::DistilBert {
                model,
                pre_classifier,
            } => {
                let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
                let input_ids = self.row_tensor(&input_ids)?;

                // DistilBERT expects 1 where attention is masked out
                let mask: Vec<u8> = encoding
                    .get_attention_mask()
                    .iter()
                    .map(|&x| u8::from(x == 0))
                    .collect();
                let mask = self.row_tensor(&mask)?;

                let hidden_states = model
                    .forward(&input_ids, &mask)
                    .map_err(classifier_err("Model forward pass failed"))?;
                let cls = cls_embedding(&hidden_states)?;

                match pre_classifier {
                    Some(layer) => layer
                        .forward(&cls)
                        .and_then(|t| t.relu())
                        .map_err(classifier_err("Pre-classifier failed")),
                    None => Ok(cls),
                }
            }
        }
    }
}

#[async_trait]
impl Classifier for TransformerClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let encoding = self.encode(text)?;
        let pooled = self.pooled_output(&encoding)?;

        let logits = self
            .classifier
            .forward(&pooled)
            .map_err(classifier_err("Classification head failed"))?;
        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(classifier_err("Softmax failed"))?;

        Ok(ClassificationResult {
            probabilities,
            metadata: ClassificationMetadata {
                model: Some(self.name.clone()),
                input_tokens: Some(encoding.get_ids().len()),
                ..Default::default()
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn cls_embedding(hidden_states: &Tensor) -> Result<Tensor> {
    hidden_states
        .i((0, 0, ..))
        .and_then(|t| t.unsqueeze(0))
        .map_err(classifier_err("Failed to get CLS token"))
}

/// Resolve the configured device; `Auto` prefers CUDA and falls back to CPU
pub fn get_device(spec: DeviceSpec) -> Result<Device> {
    match spec {
        DeviceSpec::Cpu => Ok(Device::Cpu),
        DeviceSpec::Cuda => Device::new_cuda(0).map_err(model_err("Failed to initialize CUDA")),
        DeviceSpec::Metal => Device::new_metal(0).map_err(model_err("Failed to initialize Metal")),
        DeviceSpec::Auto => {
            if candle_core::utils::cuda_is_available() {
                match Device::new_cuda(0) {
                    Ok(device) => return Ok(device),
                    Err(e) => tracing::warn!("CUDA reported available but failed: {}", e),
                }
            }
            Ok(Device::Cpu)
        }
    }
}

fn parse_json_config<T: serde::de::DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::model(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::model(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_path.join("model.safetensors");
    if !weights_path.exists() {
        return Err(Error::model(format!(
            "model.safetensors not found in {}",
            model_path.display()
        )));
    }

    // SAFETY: the weights file is memory-mapped read-only and is not modified
    // while the process runs.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            .map_err(model_err("Failed to load weights"))?
    };

    Ok(vb)
}

/// Try the usual weight prefixes; returns the model and the prefix that worked
fn load_bert_backbone(vb: &VarBuilder, config: &BertConfig) -> Result<(BertModel, &'static str)> {
    let mut errors = Vec::new();

    for prefix in ["bert", "roberta", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match BertModel::load(vb_prefix, config) {
            Ok(model) => {
                tracing::debug!(
                    "Loaded BERT backbone from '{}'",
                    if prefix.is_empty() { "<root>" } else { prefix }
                );
                return Ok((model, prefix));
            }
            Err(e) => errors.push(format!(
                "{}: {}",
                if prefix.is_empty() { "<root>" } else { prefix },
                e
            )),
        }
    }

    Err(Error::model(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_path.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::model(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = model_path.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::model(format!("Failed to build WordPiece model: {}", e)))?;

        let cls_id = wordpiece_id(&wordpiece, "[CLS]", 101);
        let sep_id = wordpiece_id(&wordpiece, "[SEP]", 102);

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), sep_id),
            ("[CLS]".to_string(), cls_id),
        )));

        return Ok(tokenizer);
    }

    Err(Error::model(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        model_path.display()
    )))
}

fn wordpiece_id(wordpiece: &tokenizers::models::wordpiece::WordPiece, token: &str, fallback: u32) -> u32 {
    use tokenizers::Model;
    wordpiece.token_to_id(token).unwrap_or(fallback)
}
