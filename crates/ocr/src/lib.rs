// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod assemble;
pub mod classify;
pub mod correct;
pub mod learn;
pub mod merge;
pub mod metadata;
pub mod pipeline;
pub mod preprocess;
pub mod price;
pub mod recognizer;
pub mod similarity;
pub mod types;

pub use assemble::{assemble, ParserConfig, ReceiptAssembler, TotalPolicy};
pub use classify::{LineClass, LineClassifier, TotalVocabulary};
pub use correct::{correct, corrector_for, MatchMode, NoCorrection, TextCorrector, VocabularyCorrector};
pub use learn::learnable_names;
pub use merge::MergedLines;
pub use metadata::{extract_metadata, Metadata, MetadataExtractor, StoreNameStrategy, StoreStrategy};
pub use pipeline::{ParseOutcome, PipelineError, ReceiptPipeline};
pub use preprocess::{compress, PreprocessError};
pub use price::normalize;
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, OcrSpaceRecognizer};
pub use types::{LineItem, RawText, ReceiptRecord};
