//! Layered service configuration: defaults, optional TOML file, environment.

pub mod settings;

pub use settings::{
    AppConfig, FileConfig, LogFormat, LoggingConfig, RunMode, ServerConfig, StaticConfig,
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES,
};
