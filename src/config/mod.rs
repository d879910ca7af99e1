pub mod constants;
pub mod settings;

pub use settings::{load_dotenv, ConfigError, FailurePolicy, ImportConfig, RecordDefaults, SourceLocation};
