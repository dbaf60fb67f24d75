//! Provider implementations for contextmill.
//!
//! One HTTP client covers the OpenAI wire shape, which nearly every
//! hosted and self-hosted model service exposes. It implements both
//! collaborator traits from `contextmill_core`: `Embedder` over
//! `/embeddings` and `Generator` over `/chat/completions`.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;
