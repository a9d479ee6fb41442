//! ONNX Runtime encoder.
//!
//! Implements [`Encoder`] via `ort`. The session is not safe for concurrent
//! `run()` calls, so it sits behind a `Mutex`: one inference at a time.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ndarray::Array3;
use ort::session::Session;
use ort::value::Tensor;

use super::{Encoder, TokenizedInput};
use crate::error::EmbedError;

/// Sentence encoder loaded from an `.onnx` file.
pub struct OnnxEncoder {
    session: Mutex<Session>,
}

// Safety: Session is behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for OnnxEncoder {}
unsafe impl Sync for OnnxEncoder {}

impl OnnxEncoder {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self> {
        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `embedd model download` first.",
            model_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn run(&self, input: &TokenizedInput) -> Result<Array3<f32>> {
        let seq_len = input.len();
        let shape = vec![1i64, seq_len as i64];

        let input_ids_tensor =
            Tensor::from_array((shape.clone(), input.input_ids.clone().into_boxed_slice()))?;
        let attention_mask_tensor = Tensor::from_array((
            shape.clone(),
            input.attention_mask.clone().into_boxed_slice(),
        ))?;
        let token_type_ids_tensor =
            Tensor::from_array((shape, input.token_type_ids.clone().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        // The output name varies by ONNX export. Try common names, fall back to index 0.
        let token_emb_value = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (shape, data) = token_emb_value
            .try_extract_tensor::<f32>()
            .context("failed to extract token_embeddings tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1 && dims[1] == seq_len as i64,
            "unexpected token_embeddings shape: {dims:?}, expected [1, {seq_len}, hidden]"
        );
        let hidden_dim = dims[2] as usize;

        Array3::from_shape_vec((1, seq_len, hidden_dim), data.to_vec())
            .context("token_embeddings data does not match its shape")
    }
}

impl Encoder for OnnxEncoder {
    fn infer(&self, input: &TokenizedInput) -> Result<Array3<f32>, EmbedError> {
        self.run(input)
            .map_err(|e| EmbedError::Inference(format!("{e:#}")))
    }
}
