use anyhow::{anyhow, ensure, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::{Encoding, Tokenizer};

use ragsearch_core::traits::Embedder;

const BGE_M3_DIM: usize = 1024;
/// Longest token sequence fed to the model; longer chunks are truncated.
const MAX_TOKENS: usize = 256;
/// XLM-RoBERTa `<pad>` id.
const PAD_ID: u32 = 1;

/// BGE-M3 (XLM-RoBERTa) sentence embedder.
///
/// A whole batch is tokenized, padded to its longest member, run through the
/// model in one forward pass, then mean-pooled over real tokens and
/// L2-normalized.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BgeM3Embedder {
    pub fn new(model_dir: Option<&Path>) -> Result<Self> {
        let device = pick_device();
        let model_dir = resolve_model_dir(model_dir)?;
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let vb = VarBuilder::from_tensors(weights.into_iter().collect(), DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        Ok(Self { model, tokenizer, device })
    }

    /// `[B, T]` id and mask tensors, padded to the longest encoding in the batch.
    fn batch_tensors(&self, encodings: &[Encoding]) -> Result<(Tensor, Tensor)> {
        let width = encodings.iter().map(|e| e.get_ids().len().min(MAX_TOKENS)).max().unwrap_or(0).max(1);
        let mut ids = Vec::with_capacity(encodings.len() * width);
        let mut mask = Vec::with_capacity(encodings.len() * width);
        for enc in encodings {
            let n = enc.get_ids().len().min(MAX_TOKENS);
            ids.extend_from_slice(&enc.get_ids()[..n]);
            mask.extend_from_slice(&enc.get_attention_mask()[..n]);
            ids.resize(ids.len() + width - n, PAD_ID);
            mask.resize(mask.len() + width - n, 0);
        }
        let shape = (encodings.len(), width);
        Ok((Tensor::from_vec(ids, shape, &self.device)?, Tensor::from_vec(mask, shape, &self.device)?))
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize { BGE_M3_DIM }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| anyhow!("tokenization failed: {e}"))?;
        let (input_ids, attention_mask) = self.batch_tensors(&encodings)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled: Vec<Vec<f32>> = mean_pool_normalized(&hidden, &attention_mask)?.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(pooled.iter().all(|v| v.len() == BGE_M3_DIM), "model produced vectors of the wrong width");
        tracing::debug!(batch = texts.len(), ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(pooled)
    }
}

/// `[B, T, H]` hidden states → `[B, H]` unit vectors, averaging only positions where `mask` is 1.
pub fn mean_pool_normalized(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let (b, _, h) = hidden.dims3()?;
    let weights = mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
    let counts = weights.sum(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12f64)?;
    let out = mean.broadcast_div(&norms)?;
    ensure!(out.dims() == [b, h], "pooled shape {:?}", out.dims());
    Ok(out)
}

fn pick_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => {
            tracing::info!("embedding on Metal");
            return dev;
        }
        Err(e) => tracing::warn!(error = %e, "Metal unavailable, falling back to CPU"),
    }
    Device::Cpu
}

fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(["APP_MODEL_DIR", "MODEL_DIR"].iter().filter_map(|var| std::env::var(var).ok().map(PathBuf::from)))
        .chain(["models/bge-m3", "../models/bge-m3"].iter().map(PathBuf::from));
    for dir in candidates {
        if dir.join("tokenizer.json").exists() { return Ok(dir); }
    }
    Err(anyhow!("could not locate a BGE-M3 model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
