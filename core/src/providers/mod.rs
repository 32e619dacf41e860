pub mod factory;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
