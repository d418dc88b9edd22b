use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const APP_DIR_NAME: &str = "vocab-trainer";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub log_level: String,
    /// Set when ENABLE_FILE_LOGS is on.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let api_base_url = env_string("API_BASE_URL")
            .map(|value| value.trim_end_matches('/').to_string());

        let request_timeout = Duration::from_millis(
            env_string("REQUEST_TIMEOUT_MS")
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let data_dir = env_string("DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env_flag("ENABLE_FILE_LOGS").then(|| {
            env_string("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./logs"))
        });

        Self {
            api_base_url,
            request_timeout,
            data_dir,
            log_level,
            log_dir,
        }
    }

    pub fn words_path(&self) -> PathBuf {
        self.data_dir.join("words.json")
    }

    pub fn client_config(&self) -> Option<ClientConfig> {
        self.api_base_url.as_ref().map(|base_url| ClientConfig {
            base_url: base_url.clone(),
            request_timeout: self.request_timeout,
        })
    }
}

/// Settings for one `ApiClient` instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> bool {
    env_string(key).is_some_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
