use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_DB_PATH: &str = "blush.db";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub db_path: PathBuf,
}

impl ClientConfig {
    /// Read `BLUSH_API_URL` and `BLUSH_DB_PATH`, picking up a `.env` file
    /// first if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let api_url = std::env::var("BLUSH_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let db_path = std::env::var("BLUSH_DB_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());

        Self {
            api_url,
            db_path: PathBuf::from(db_path),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}
