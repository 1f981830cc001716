//! Gemini generative backends.
//!
//! Two REST surfaces behind the same [`ImageProvider`] contract:
//!
//! - **Developer API** — `generativelanguage.googleapis.com`, keyed by
//!   `GEMINI_API_KEY`.
//! - **Vertex AI** — regional `aiplatform.googleapis.com` endpoint, scoped
//!   by `GOOGLE_CLOUD_PROJECT` / `GOOGLE_CLOUD_LOCATION` and authorized by
//!   a `GOOGLE_CLOUD_ACCESS_TOKEN` bearer token.
//!
//! Both merge the negative prompt and a size hint into the text prompt
//! (the generateContent surface has no dedicated fields for either) and
//! decode the first `inlineData` image part of the response.

use super::{ImageProvider, ProviderError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use serde_json::{Value, json};

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn merged_prompt(prompt: &str, size: (u32, u32), negative_prompt: Option<&str>) -> String {
    let mut merged = prompt.to_string();
    if let Some(negative) = negative_prompt.filter(|n| !n.is_empty()) {
        merged.push_str(&format!("\nAvoid: {negative}"));
    }
    merged.push_str(&format!(
        "\nRequired output size target: {}x{}",
        size.0, size.1
    ));
    merged
}

/// Pull the first inline image out of a generateContent response.
fn decode_inline_image(payload: &Value, model: &str) -> Result<DynamicImage, ProviderError> {
    let parts = payload["candidates"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|candidate| {
            candidate["content"]["parts"]
                .as_array()
                .cloned()
                .unwrap_or_default()
        });

    for part in parts {
        let encoded = part["inlineData"]["data"]
            .as_str()
            .or_else(|| part["inline_data"]["data"].as_str());
        if let Some(encoded) = encoded {
            let bytes = BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            return image::load_from_memory(&bytes)
                .map_err(|e| ProviderError::Decode(e.to_string()));
        }
    }

    Err(ProviderError::NoImageData {
        model: model.to_string(),
    })
}

fn post_generate(
    http: &reqwest::blocking::Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &Value,
    model: &str,
) -> Result<Value, ProviderError> {
    let mut request = http.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json::<Value>())
        .map_err(|e| ProviderError::Request {
            model: model.to_string(),
            message: e.to_string(),
        })
}

/// Developer-API backend (`GEMINI_API_KEY`).
pub struct GeminiDeveloperProvider {
    model: String,
    api_key: String,
    api_base: String,
    http: reqwest::blocking::Client,
}

impl GeminiDeveloperProvider {
    pub const API_KEY_ENV: &'static str = "GEMINI_API_KEY";

    pub fn new(model: &str) -> Result<Self, ProviderError> {
        let api_key = non_empty_env(Self::API_KEY_ENV)
            .ok_or_else(|| ProviderError::MissingEnv(Self::API_KEY_ENV.to_string()))?;
        let api_base = non_empty_env("GEMINI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());
        Ok(Self {
            model: model.to_string(),
            api_key,
            api_base,
            http: reqwest::blocking::Client::new(),
        })
    }
}

impl ImageProvider for GeminiDeveloperProvider {
    fn generate_hero(
        &self,
        prompt: &str,
        size: (u32, u32),
        negative_prompt: Option<&str>,
    ) -> Result<DynamicImage, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": merged_prompt(prompt, size, negative_prompt) }] }],
        });
        let payload = post_generate(
            &self.http,
            &url,
            &[("x-goog-api-key", self.api_key.as_str())],
            &body,
            &self.model,
        )?;
        decode_inline_image(&payload, &self.model)
    }
}

/// Vertex AI backend (`GOOGLE_CLOUD_PROJECT` + access token).
pub struct GeminiVertexProvider {
    model: String,
    project: String,
    location: String,
    access_token: String,
    http: reqwest::blocking::Client,
}

impl GeminiVertexProvider {
    pub const PROJECT_ENV: &'static str = "GOOGLE_CLOUD_PROJECT";
    pub const LOCATION_ENV: &'static str = "GOOGLE_CLOUD_LOCATION";
    pub const TOKEN_ENV: &'static str = "GOOGLE_CLOUD_ACCESS_TOKEN";

    pub fn new(model: &str) -> Result<Self, ProviderError> {
        let project = non_empty_env(Self::PROJECT_ENV)
            .ok_or_else(|| ProviderError::MissingEnv(Self::PROJECT_ENV.to_string()))?;
        let access_token = non_empty_env(Self::TOKEN_ENV)
            .ok_or_else(|| ProviderError::MissingEnv(Self::TOKEN_ENV.to_string()))?;
        let location =
            non_empty_env(Self::LOCATION_ENV).unwrap_or_else(|| "us-central1".to_string());
        Ok(Self {
            model: model.to_string(),
            project,
            location,
            access_token,
            http: reqwest::blocking::Client::new(),
        })
    }
}

impl ImageProvider for GeminiVertexProvider {
    fn generate_hero(
        &self,
        prompt: &str,
        size: (u32, u32),
        negative_prompt: Option<&str>,
    ) -> Result<DynamicImage, ProviderError> {
        let url = format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent",
            location = self.location,
            project = self.project,
            model = self.model,
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": merged_prompt(prompt, size, negative_prompt) }] }],
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] },
        });
        let bearer = format!("Bearer {}", self.access_token);
        let payload = post_generate(
            &self.http,
            &url,
            &[("authorization", bearer.as_str())],
            &body,
            &self.model,
        )?;
        decode_inline_image(&payload, &self.model)
    }
}
