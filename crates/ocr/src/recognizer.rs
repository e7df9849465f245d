use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR provider error: {0}")]
    Provider(String),
    #[error("OCR provider returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Abstraction over an OCR backend.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized text.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;

    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, for exercising the parsing pipeline
/// without a network connection or an OCR engine.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl OcrBackend for MockRecognizer {
    async fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ── OCR.Space backend ─────────────────────────────────────────────────────────

pub const OCR_SPACE_ENDPOINT: &str = "https://api.ocr.space/parse/image";

pub struct OcrSpaceRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl OcrSpaceRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: OCR_SPACE_ENDPOINT.to_string(),
            api_key: api_key.into(),
            language: "eng".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[async_trait]
impl OcrBackend for OcrSpaceRecognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let file_name = format!("receipt.{}", image_extension(image_bytes));
        let part = reqwest::multipart::Part::bytes(image_bytes.to_vec()).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", self.language.clone())
            .text("OCREngine", "2")
            .text("scale", "true")
            .text("isTable", "true")
            .text("detectOrientation", "true")
            .part("file", part);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, bytes = body.len(), "OCR.Space responded");

        parse_ocr_space_response(&body)
    }

    fn provider_name(&self) -> &'static str {
        "ocr_space"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
    #[serde(default)]
    parsed_results: Option<Vec<OcrSpaceParsedResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceParsedResult {
    #[serde(default)]
    parsed_text: String,
}

/// Text of the first parsed result; empty when the provider found none.
fn parse_ocr_space_response(body: &str) -> Result<String, OcrError> {
    let response: OcrSpaceResponse = serde_json::from_str(body).map_err(|e| {
        let snippet: String = body.chars().take(200).collect();
        OcrError::MalformedResponse(format!("{e}: {snippet}"))
    })?;

    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(parts)) => parts
                .iter()
                .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        };
        return Err(OcrError::Provider(message));
    }

    Ok(response
        .parsed_results
        .and_then(|results| results.into_iter().next())
        .map(|r| r.parsed_text)
        .unwrap_or_default())
}

/// File extension matching the encoded image, `jpg` when unrecognised.
fn image_extension(image_bytes: &[u8]) -> &'static str {
    image::guess_format(image_bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("jpg")
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use async_trait::async_trait;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    #[async_trait]
    impl OcrBackend for TesseractRecognizer {
        async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let prepared = crate::preprocess::prepare_for_ocr_from_bytes(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let data_path = self.data_path.clone();
            let lang = self.lang.clone();

            tokio::task::spawn_blocking(move || {
                let mut lt = LepTess::new(data_path.as_deref(), &lang)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                lt.set_image_from_mem(&prepared)
                    .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?
        }

        fn provider_name(&self) -> &'static str {
            "tesseract"
        }
    }
}
