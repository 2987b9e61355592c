//! Feature extraction from attribute mappings into numeric matrices.

pub mod vectorizer;

pub use vectorizer::DictVectorizer;
