use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_SUMMARIZER_URL: &str =
    "https://api-inference.huggingface.co/models/sshleifer/distilbart-cnn-12-6";
pub const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_NEWS_SEARCH_URL: &str = "https://gnews.io/api/v4/search";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub summarizer_url: String,
    pub summarizer_api_token: Option<String>,
    pub summarizer_timeout_secs: u64,
    pub tokenizer_path: Option<PathBuf>,
    pub wordnet_dir: Option<PathBuf>,
    pub news_api_key: Option<String>,
    pub news_search_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = var("SBOT_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("SBOT_BIND_ADDR: {}", e))?;

        let summarizer_url = var("SUMMARIZER_URL").unwrap_or_else(|| DEFAULT_SUMMARIZER_URL.to_string());
        url::Url::parse(&summarizer_url).map_err(|e| format!("SUMMARIZER_URL: {}", e))?;

        let summarizer_timeout_secs = match var("SUMMARIZER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("SUMMARIZER_TIMEOUT_SECS: {}", e))?,
            None => DEFAULT_SUMMARIZER_TIMEOUT_SECS,
        };

        let news_search_url =
            var("NEWS_SEARCH_URL").unwrap_or_else(|| DEFAULT_NEWS_SEARCH_URL.to_string());
        url::Url::parse(&news_search_url).map_err(|e| format!("NEWS_SEARCH_URL: {}", e))?;

        Ok(Self {
            bind_addr,
            summarizer_url,
            summarizer_api_token: var("SUMMARIZER_API_TOKEN"),
            summarizer_timeout_secs,
            tokenizer_path: var("SUMMARIZER_TOKENIZER_PATH").map(PathBuf::from),
            wordnet_dir: var("WORDNET_DIR").map(PathBuf::from),
            news_api_key: var("NEWS_API_KEY"),
            news_search_url,
        })
    }
}
