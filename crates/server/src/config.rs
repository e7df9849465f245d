use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tillroll_ocr::correct::DEFAULT_THRESHOLD;
use tillroll_ocr::pipeline::DEFAULT_MAX_IMAGE_BYTES;
use tillroll_ocr::recognizer::OCR_SPACE_ENDPOINT;
use tillroll_ocr::{MatchMode, ParserConfig};

/// Server settings. Every field has a default, so an empty (or absent)
/// config file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Where uploads are staged while they are processed.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub ocr: OcrConfig,
    pub vocabulary: VocabularyConfig,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    OcrSpace,
    /// Answers every upload with `mock_text`; for offline runs.
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub language: String,
    /// Uploads above this are recompressed before they go to the provider.
    pub max_image_bytes: u64,
    pub mock_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub path: PathBuf,
    /// Minimum partial-ratio score (0–100) for a correction.
    pub threshold: f64,
    pub match_mode: MatchMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
            ocr: OcrConfig::default(),
            vocabulary: VocabularyConfig::default(),
            parser: ParserConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::OcrSpace,
            api_key: None,
            endpoint: OCR_SPACE_ENDPOINT.to_string(),
            language: "eng".to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            mock_text: String::new(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("items.txt"),
            threshold: DEFAULT_THRESHOLD,
            match_mode: MatchMode::WholeRow,
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `TILLROLL_CONFIG` (if set), then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os("TILLROLL_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// `OCR_API_KEY`, `TILLROLL_BIND` and `TILLROLL_VOCABULARY` win over the file.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("OCR_API_KEY").filter(|k| !k.is_empty()) {
            self.ocr.api_key = Some(key);
        }
        if let Some(bind) = var("TILLROLL_BIND") {
            self.bind = bind;
        }
        if let Some(path) = var("TILLROLL_VOCABULARY") {
            self.vocabulary.path = PathBuf::from(path);
        }
    }
}
