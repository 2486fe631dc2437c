//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod extractor;
pub mod jobs;
pub mod telegram_notify;
pub mod test_dependencies;
pub mod traits;
pub mod unsplash_client;

/// GPT-4o mini — fast, cheap model for rewriting, translation and prompts.
pub const GPT_4O_MINI: &str = "gpt-4o-mini";

/// DALL-E 3 — generative image model.
pub const DALL_E_3: &str = "dall-e-3";

pub use ai::{DallEImageGenerator, OpenAiAdapter};
pub use deps::ServerDeps;
pub use extractor::{parse_article, HttpExtractor};
pub use telegram_notify::TelegramNotifier;
pub use test_dependencies::TestDependencies;
pub use traits::*;
pub use unsplash_client::{UnsplashClient, DEFAULT_IMAGE_BASE};
