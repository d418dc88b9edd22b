use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::client::{parse_token_pair, ApiClient, ApiError, RequestOptions, ResponseKind, TokenPair};
use crate::words::{NewWord, Word, WordPatch, WordsSnapshot};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const GUEST_PATH: &str = "/api/auth/guest";
const LOGOUT_PATH: &str = "/api/auth/logout";
const CURRENT_USER_PATH: &str = "/api/users/me";
const WORDS_PATH: &str = "/api/words";
const SNAPSHOT_PATH: &str = "/api/words/snapshot";
const RECORDINGS_PATH: &str = "/api/recordings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    invite_code: Option<&'a str>,
}

fn word_path(id: &str) -> String {
    format!("{WORDS_PATH}/{}", urlencoding::encode(id))
}

fn recording_path(word_id: &str) -> String {
    format!("{RECORDINGS_PATH}/{}", urlencoding::encode(word_id))
}

/// Wire form of a [`WordPatch`]: absent keys are left alone, `null` clears.
fn patch_body(patch: &WordPatch) -> Value {
    let mut body = Map::new();
    if let Some(text) = &patch.text {
        body.insert("text".to_string(), Value::from(text.as_str()));
    }
    if let Some(translation) = &patch.translation {
        body.insert("translation".to_string(), json!(translation));
    }
    if let Some(example) = &patch.example {
        body.insert("example".to_string(), json!(example));
    }
    if let Some(topic) = &patch.topic {
        body.insert("topic".to_string(), json!(topic));
    }
    if let Some(language) = &patch.language {
        body.insert("language".to_string(), Value::from(language.as_str()));
    }
    Value::Object(body)
}

impl ApiClient {
    async fn authenticate(&self, path: &str, body: Value) -> Result<TokenPair, ApiError> {
        let value = self
            .request(path, RequestOptions::post().public().json(body))
            .await?
            .into_json()?;
        let tokens = parse_token_pair(&value).ok_or_else(|| {
            ApiError::decode("auth response is missing accessToken or refreshToken")
        })?;
        self.session().init(tokens.clone());
        Ok(tokens)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let body = serde_json::to_value(Credentials {
            username,
            password,
            invite_code: None,
        })
        .map_err(|err| ApiError::decode(err.to_string()))?;
        let tokens = self.authenticate(LOGIN_PATH, body).await?;
        info!(username, "signed in");
        Ok(tokens)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<TokenPair, ApiError> {
        let body = serde_json::to_value(Credentials {
            username,
            password,
            invite_code: Some(invite_code),
        })
        .map_err(|err| ApiError::decode(err.to_string()))?;
        let tokens = self.authenticate(REGISTER_PATH, body).await?;
        info!(username, "registered");
        Ok(tokens)
    }

    pub async fn guest(&self) -> Result<TokenPair, ApiError> {
        let tokens = self.authenticate(GUEST_PATH, json!({})).await?;
        info!("entered as guest");
        Ok(tokens)
    }

    /// Tells the server (best effort) and drops local credentials.
    pub async fn logout(&self) {
        if self.session().access_token().is_some() {
            let options = RequestOptions::post().response_kind(ResponseKind::Text);
            if let Err(err) = self.request(LOGOUT_PATH, options).await {
                debug!(error = %err, "server logout failed, clearing local session anyway");
            }
        }
        self.session().dispose();
        info!("signed out");
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.request_json(CURRENT_USER_PATH, RequestOptions::get())
            .await
    }

    pub async fn list_words(&self) -> Result<Vec<Word>, ApiError> {
        self.request_json(WORDS_PATH, RequestOptions::get()).await
    }

    pub async fn create_word(&self, word: &NewWord) -> Result<Word, ApiError> {
        self.request_json(WORDS_PATH, RequestOptions::post().json_body(word)?)
            .await
    }

    pub async fn update_word(&self, id: &str, patch: &WordPatch) -> Result<Word, ApiError> {
        self.request_json(&word_path(id), RequestOptions::patch().json(patch_body(patch)))
            .await
    }

    pub async fn delete_word(&self, id: &str) -> Result<(), ApiError> {
        self.request(
            &word_path(id),
            RequestOptions::delete().response_kind(ResponseKind::Text),
        )
        .await?;
        Ok(())
    }

    pub async fn fetch_snapshot(&self) -> Result<WordsSnapshot, ApiError> {
        let words = self.list_words().await?;
        Ok(WordsSnapshot {
            words,
            ..WordsSnapshot::default()
        })
    }

    pub async fn put_snapshot(&self, snapshot: &WordsSnapshot) -> Result<(), ApiError> {
        self.request(
            SNAPSHOT_PATH,
            RequestOptions::put()
                .json_body(snapshot)?
                .response_kind(ResponseKind::Text),
        )
        .await?;
        Ok(())
    }

    pub async fn save_recording(
        &self,
        word_id: &str,
        audio: Bytes,
        content_type: &str,
    ) -> Result<(), ApiError> {
        let size = audio.len();
        self.request(
            &recording_path(word_id),
            RequestOptions::put()
                .raw(audio, content_type)
                .response_kind(ResponseKind::Text),
        )
        .await?;
        debug!(word_id, size, "recording uploaded");
        Ok(())
    }

    pub async fn fetch_recording(&self, word_id: &str) -> Result<Bytes, ApiError> {
        let body = self
            .request(
                &recording_path(word_id),
                RequestOptions::get().response_kind(ResponseKind::Binary),
            )
            .await?;
        Ok(body.into_bytes())
    }

    pub async fn delete_recording(&self, word_id: &str) -> Result<(), ApiError> {
        self.request(
            &recording_path(word_id),
            RequestOptions::delete().response_kind(ResponseKind::Text),
        )
        .await?;
        Ok(())
    }
}
