use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 12] = [
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "zip", "rar",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: RunMode,
    pub service_name: String,
    pub server: ServerConfig,
    pub files: FileConfig,
    pub static_files: StaticConfig,
    pub logging: LoggingConfig,
}

/// Development serves the upload API only; production adds `/health` and
/// the rotating log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    pub root: PathBuf,
    pub index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub dir: PathBuf,
    pub max_bytes: u64,
    pub backups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Development,
            service_name: "file-intake".to_string(),
            server: ServerConfig::default(),
            files: FileConfig::default(),
            static_files: StaticConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            index: "index.html".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            dir: PathBuf::from("logs"),
            max_bytes: 10 * 1024,
            backups: 10,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let default_file = Path::new("config.toml");
        if default_file.exists() {
            Self::load_from(Some(default_file))
        } else {
            Self::load_from(None)
        }
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        if app_config.is_production() {
            if let Ok(port) = std::env::var("PORT") {
                app_config.server.port = port
                    .parse()
                    .map_err(|_| ConfigError::Message(format!("Invalid PORT value: {}", port)))?;
            }
        }

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Service name cannot be empty".to_string(),
            ));
        }

        if self.files.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "Max upload size must be greater than 0".to_string(),
            ));
        }

        if self.files.allowed_extensions.is_empty() {
            return Err(ConfigError::Message(
                "At least one allowed extension is required".to_string(),
            ));
        }

        if self
            .files
            .allowed_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.contains('.'))
        {
            return Err(ConfigError::Message(
                "Allowed extensions must be non-empty and given without a dot".to_string(),
            ));
        }

        if self.logging.max_bytes == 0 {
            return Err(ConfigError::Message(
                "Log file max size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.mode == RunMode::Production
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.files.upload_dir)?;
        if self.is_production() {
            std::fs::create_dir_all(&self.logging.dir)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.logging.dir.join(format!("{}.log", self.service_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.files.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.files.allowed_extensions.len(), 12);
        assert_eq!(config.mode, RunMode::Development);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.files.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.files.allowed_extensions.clear();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.files.allowed_extensions.push(".exe".to_string());
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.logging.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");

        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_log_file_path_uses_service_name() {
        let mut config = AppConfig::default();
        config.service_name = "animal-detector".to_string();
        assert_eq!(
            config.log_file_path(),
            PathBuf::from("logs").join("animal-detector.log")
        );
    }

    #[test]
    fn test_config_loading_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut expected = AppConfig::default();
        expected.mode = RunMode::Production;
        expected.service_name = "intake-test".to_string();
        expected.files.max_upload_bytes = 2048;
        expected.files.allowed_extensions = vec!["txt".to_string(), "csv".to_string()];
        std::fs::write(&path, toml::to_string(&expected).unwrap()).unwrap();

        let config = AppConfig::load_from(Some(&path)).expect("Should load configuration file");

        assert!(config.is_production());
        assert_eq!(config.service_name, "intake-test");
        assert_eq!(config.files.max_upload_bytes, 2048);
        assert_eq!(config.files.allowed_extensions, vec!["txt", "csv"]);
        assert_eq!(config.logging.backups, 10);
    }

    #[test]
    fn test_directory_creation() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.files.upload_dir = dir.path().join("uploads");
        config.logging.dir = dir.path().join("logs");

        assert!(config.create_directories().is_ok());
        assert!(config.files.upload_dir.exists());
        assert!(!config.logging.dir.exists());

        config.mode = RunMode::Production;
        assert!(config.create_directories().is_ok());
        assert!(config.logging.dir.exists());
    }
}
