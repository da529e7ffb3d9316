pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::DictumConfig;
pub use error::{DictumError, Result};
pub use events::EditorEvent;
pub use types::*;
