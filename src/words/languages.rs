use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{ApiClient, RequestOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("de", "German"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("zh", "Chinese"),
    ("ko", "Korean"),
];

pub fn default_languages() -> Vec<Language> {
    DEFAULT_LANGUAGES
        .iter()
        .map(|(code, name)| Language {
            code: (*code).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

/// Fetches the language catalog. The catalog is auxiliary data, so any
/// failure or an empty answer falls back to the built-in list.
pub async fn fetch_languages(client: &ApiClient) -> Vec<Language> {
    match client
        .request_json::<Vec<Language>>("/api/languages", RequestOptions::get().public())
        .await
    {
        Ok(languages) if !languages.is_empty() => languages,
        Ok(_) => default_languages(),
        Err(err) => {
            warn!(error = %err, code = err.code.as_str(), "language catalog unavailable, using defaults");
            default_languages()
        }
    }
}
