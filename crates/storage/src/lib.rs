pub mod vocabulary;

pub use vocabulary::{CommitOutcome, VocabularyError, VocabularyStore};
