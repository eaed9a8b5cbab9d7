pub mod config;
pub mod currency;
pub mod error;
pub mod llm;
pub mod logging;
pub mod paths;

pub use config::*;
pub use currency::*;
pub use error::*;
pub use llm::{extract_json_object, CompletionClient, CompletionResponse};
pub use logging::*;
pub use paths::*;
