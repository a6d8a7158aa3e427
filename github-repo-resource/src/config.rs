use crate::error::Error;
use reqwest::Url;
use std::env::var;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    /// E.g. https://api.github.com or https://github.example.com/api/v3 for GitHub Enterprise.
    /// Request paths are appended to it as escaped segments.
    pub github_api_url: Url,
    /// GitHub rejects requests without a User-Agent header
    pub user_agent: String,
}

impl Config {
    /// Creates a new Config instance from the environment variables.
    /// Uses default values where possible.
    /// Returns an error if GITHUB_API_URL is set, but is not a valid http(s) URL.
    pub fn from_env() -> Result<Self, Error> {
        let github_api_url = match var("GITHUB_API_URL") {
            Ok(v) => v,
            Err(_) => DEFAULT_GITHUB_API_URL.to_owned(),
        };

        let user_agent = var("GITHUB_USER_AGENT").unwrap_or_else(|_e| default_user_agent());

        Self::new(&github_api_url, user_agent)
    }

    /// Validates the API URL. Exposed for tests that point the client at a local server.
    pub fn new(github_api_url: &str, user_agent: String) -> Result<Self, Error> {
        let url = Url::parse(github_api_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid GITHUB_API_URL {github_api_url}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!("GITHUB_API_URL must be http or https: {github_api_url}")));
        }

        Ok(Self {
            github_api_url: url,
            user_agent,
        })
    }
}

pub fn default_user_agent() -> String {
    [env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")].concat()
}
