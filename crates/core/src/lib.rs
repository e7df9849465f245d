pub mod money;
pub mod vocabulary;

pub use money::Money;
pub use vocabulary::Vocabulary;
