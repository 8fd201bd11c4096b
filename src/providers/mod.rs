//! Generation backends.
//!
//! Remote chat completion goes through [`CompletionBackend`] (implemented by
//! [`OpenAiClient`]); local inference goes through [`LocalPipeline`]
//! (implemented by [`OllamaPipeline`]) held in [`LocalModels`].
//! [`BackendSelector`] picks between them per model.

pub mod local;
pub mod ollama;
pub mod openai;
pub mod selector;
pub mod traits;

pub use local::LocalModels;
pub use ollama::OllamaPipeline;
pub use openai::OpenAiClient;
pub use selector::{BackendKind, BackendSelector, Invocation};
pub use traits::{CompletionBackend, LocalPipeline};
