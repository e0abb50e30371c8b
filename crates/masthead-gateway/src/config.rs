use std::env;

/// Where the backend and the asset host live.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub asset_base_url: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, asset_base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            asset_base_url: trim_trailing_slash(asset_base_url.into()),
        }
    }

    /// Read configuration from the environment, loading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let base_url =
            env::var("MASTHEAD_API_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let asset_base_url =
            env::var("MASTHEAD_ASSET_URL").unwrap_or_else(|_| "http://localhost:3900".into());

        Self::new(base_url, asset_base_url)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
