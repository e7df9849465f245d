use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assemble::ReceiptAssembler;
use crate::correct::TextCorrector;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ReceiptRecord;

/// OCR.Space rejects uploads above 1 MiB on the free tier.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Raw OCR text output.
    pub ocr_text: String,
    /// The text after the correction pass; equal to `ocr_text` when no
    /// vocabulary is in play.
    pub corrected_text: String,
    pub record: ReceiptRecord,
}

/// Orchestrates: temp file → compress → OCR → correct → assemble.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    assembler: ReceiptAssembler,
    upload_dir: PathBuf,
    max_image_bytes: u64,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R, assembler: ReceiptAssembler, upload_dir: PathBuf) -> Self {
        Self {
            recognizer,
            assembler,
            upload_dir,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: u64) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    /// Process a file on disk. The file itself is left untouched.
    pub async fn process_file(
        &self,
        path: &Path,
        corrector: &dyn TextCorrector,
    ) -> Result<ParseOutcome, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        self.process_bytes(&bytes, &ext, corrector).await
    }

    /// Process an uploaded image.
    ///
    /// The bytes are staged in a temp file under the upload dir, which is
    /// removed when this returns, whether it succeeds or not.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
        corrector: &dyn TextCorrector,
    ) -> Result<ParseOutcome, PipelineError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let temp = tempfile::Builder::new()
            .prefix("receipt-")
            .suffix(&format!(".{}", sanitize_ext(ext)))
            .tempfile_in(&self.upload_dir)?;
        tokio::fs::write(temp.path(), data).await?;

        let path = temp.path().to_path_buf();
        let max = self.max_image_bytes;
        tokio::task::spawn_blocking(move || preprocess::compress(&path, max)).await??;

        let image_bytes = tokio::fs::read(temp.path()).await?;
        let ocr_text = self.recognizer.recognize(&image_bytes).await?;
        temp.close()?;

        let outcome = self.interpret(ocr_text, corrector);
        tracing::info!(
            provider = self.recognizer.provider_name(),
            upload_bytes = data.len(),
            items = outcome.record.items.len(),
            items_total = %outcome.record.items_total(),
            "Receipt processed"
        );
        Ok(outcome)
    }

    /// Interpret OCR text that is already in hand.
    pub fn interpret(&self, ocr_text: String, corrector: &dyn TextCorrector) -> ParseOutcome {
        let corrected_text = corrector.correct(&ocr_text);
        let record = self.assembler.assemble_text(&corrected_text);
        ParseOutcome { ocr_text, corrected_text, record }
    }
}

/// Keep client-supplied extensions to short alphanumerics.
fn sanitize_ext(ext: &str) -> String {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "bin".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
