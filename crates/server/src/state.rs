use std::sync::Arc;

use anyhow::{bail, Context};
use tillroll_ocr::{
    corrector_for, MockRecognizer, OcrBackend, OcrSpaceRecognizer, ReceiptAssembler,
    ReceiptPipeline, TextCorrector,
};
use tillroll_storage::VocabularyStore;

use crate::config::{OcrBackendKind, OcrConfig, ServerConfig, VocabularyConfig};

pub type DynPipeline = ReceiptPipeline<Box<dyn OcrBackend>>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DynPipeline>,
    pub vocabulary: Arc<VocabularyStore>,
    pub correction: Arc<VocabularyConfig>,
}

impl AppState {
    pub fn new(pipeline: DynPipeline, vocabulary: VocabularyStore, correction: VocabularyConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            vocabulary: Arc::new(vocabulary),
            correction: Arc::new(correction),
        }
    }

    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let recognizer = build_recognizer(&config.ocr)?;
        tracing::info!(provider = recognizer.provider_name(), "OCR backend ready");

        let pipeline = ReceiptPipeline::new(
            recognizer,
            ReceiptAssembler::new(&config.parser),
            config.upload_dir.clone(),
        )
        .with_max_image_bytes(config.ocr.max_image_bytes);

        let vocabulary = VocabularyStore::open(config.vocabulary.path.clone())
            .await
            .context("Failed to open vocabulary")?;

        Ok(Self::new(pipeline, vocabulary, config.vocabulary.clone()))
    }

    /// Corrector over the vocabulary as it stands right now. A commit that
    /// lands mid-request does not affect it.
    pub fn corrector(&self) -> Box<dyn TextCorrector> {
        let snapshot = self.vocabulary.snapshot();
        corrector_for(&snapshot, self.correction.threshold, self.correction.match_mode)
    }
}

fn build_recognizer(config: &OcrConfig) -> anyhow::Result<Box<dyn OcrBackend>> {
    match config.backend {
        OcrBackendKind::OcrSpace => {
            let Some(api_key) = config.api_key.as_deref() else {
                bail!("OCR_API_KEY is not set; configure it or use the mock backend");
            };
            Ok(Box::new(
                OcrSpaceRecognizer::new(api_key)
                    .with_endpoint(config.endpoint.as_str())
                    .with_language(config.language.as_str()),
            ))
        }
        OcrBackendKind::Mock => {
            tracing::warn!("Using mock OCR backend; uploads will not be read");
            Ok(Box::new(MockRecognizer::new(config.mock_text.as_str())))
        }
    }
}
