use anyhow::{anyhow, Context, Result};
use reqwest::blocking::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;

// --- Provider trait ---

pub trait AIProvider: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAI,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
    pub short_name: String,
}

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    match name {
        // Google Gemini (requires GEMINI_API_KEY or API_KEY)
        "gemini" | "gemini-flash" => Ok(ModelSpec {
            provider: ProviderKind::Gemini,
            model_id: "gemini-2.5-flash".to_string(),
            short_name: "gemini-flash".to_string(),
        }),
        "gemini-pro" => Ok(ModelSpec {
            provider: ProviderKind::Gemini,
            model_id: "gemini-2.5-pro".to_string(),
            short_name: "gemini-pro".to_string(),
        }),
        // Anthropic API (requires ANTHROPIC_API_KEY)
        "claude-sonnet" | "sonnet" => Ok(ModelSpec {
            provider: ProviderKind::Anthropic,
            model_id: "claude-sonnet-4-5-20250929".to_string(),
            short_name: "claude-sonnet".to_string(),
        }),
        "claude-haiku" | "haiku" => Ok(ModelSpec {
            provider: ProviderKind::Anthropic,
            model_id: "claude-haiku-4-5-20251001".to_string(),
            short_name: "claude-haiku".to_string(),
        }),
        // OpenAI (requires OPENAI_API_KEY)
        "gpt-4o" => Ok(ModelSpec {
            provider: ProviderKind::OpenAI,
            model_id: "gpt-4o".to_string(),
            short_name: "gpt-4o".to_string(),
        }),
        "gpt-4o-mini" => Ok(ModelSpec {
            provider: ProviderKind::OpenAI,
            model_id: "gpt-4o-mini".to_string(),
            short_name: "gpt-4o-mini".to_string(),
        }),
        _ => Err(anyhow!(
            "Unknown model '{}'. Available: gemini (default), gemini-pro, claude-sonnet, \
             claude-haiku, gpt-4o, gpt-4o-mini",
            name
        )),
    }
}

/// Build the provider for `spec`. Fails before any network activity when the
/// provider's credential is not configured.
pub fn create_provider(spec: &ModelSpec) -> Result<Box<dyn AIProvider>> {
    match spec.provider {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(spec.model_id.clone())?)),
        ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(spec.model_id.clone())?)),
        ProviderKind::OpenAI => Ok(Box::new(OpenAIProvider::new(spec.model_id.clone())?)),
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

// --- Shared HTTP plumbing ---

/// Credential, model id and client behind every hosted provider.
#[derive(Debug)]
struct Endpoint {
    vendor: &'static str,
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl Endpoint {
    /// `key_vars` are tried in order; the first non-empty one wins.
    fn new(vendor: &'static str, key_vars: &[&str], model_id: String) -> Result<Self> {
        let api_key = first_env(key_vars).with_context(|| {
            format!(
                "{} environment variable not set. Set it with: export {}=your-key-here",
                key_vars.join(" or "),
                key_vars.first().copied().unwrap_or("API_KEY")
            )
        })?;
        Ok(Self {
            vendor,
            api_key,
            model_id,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Send `body` as JSON and decode a 2xx reply as `R`.
    fn post<B: Serialize, R: DeserializeOwned>(&self, request: RequestBuilder, body: &B) -> Result<R> {
        let response = request
            .header("content-type", "application/json")
            .json(body)
            .send()
            .with_context(|| format!("Failed to send request to {} API", self.vendor))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("{} API request failed with status {}: {}", self.vendor, status, error_text));
        }

        response
            .json()
            .with_context(|| format!("Failed to parse {} API response", self.vendor))
    }
}

/// Single-turn user message, as both the Anthropic and OpenAI chat APIs take it.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn user(prompt: &str) -> Vec<ChatMessage> {
        vec![ChatMessage { role: "user", content: prompt.to_string() }]
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

// --- Gemini provider ---

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Text of the first candidate, its parts joined.
    fn into_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .ok_or_else(|| anyhow!("No candidates in Gemini API response"))
    }
}

#[derive(Debug)]
pub struct GeminiProvider(Endpoint);

impl GeminiProvider {
    pub fn new(model_id: String) -> Result<Self> {
        Endpoint::new("Gemini", &["GEMINI_API_KEY", "API_KEY"], model_id).map(Self)
    }
}

impl AIProvider for GeminiProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let endpoint = &self.0;
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: GeminiGenerationConfig { max_output_tokens: max_tokens },
        };
        let request = endpoint
            .client
            .post(format!("{}/{}:generateContent", GEMINI_API_URL, endpoint.model_id))
            .header("x-goog-api-key", &endpoint.api_key);

        endpoint.post::<_, GeminiResponse>(request, &body)?.into_text()
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

impl AnthropicResponse {
    fn into_text(self) -> Result<String> {
        self.content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| anyhow!("No content in Anthropic API response"))
    }
}

#[derive(Debug)]
pub struct AnthropicProvider(Endpoint);

impl AnthropicProvider {
    pub fn new(model_id: String) -> Result<Self> {
        Endpoint::new("Anthropic", &["ANTHROPIC_API_KEY"], model_id).map(Self)
    }
}

impl AIProvider for AnthropicProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let endpoint = &self.0;
        let body = ChatRequest {
            model: &endpoint.model_id,
            max_tokens,
            messages: ChatMessage::user(prompt),
        };
        let request = endpoint
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &endpoint.api_key)
            .header("anthropic-version", "2023-06-01");

        endpoint.post::<_, AnthropicResponse>(request, &body)?.into_text()
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

// --- OpenAI provider ---

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

impl OpenAIResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| anyhow!("No choices in OpenAI API response"))
    }
}

#[derive(Debug)]
pub struct OpenAIProvider(Endpoint);

impl OpenAIProvider {
    pub fn new(model_id: String) -> Result<Self> {
        Endpoint::new("OpenAI", &["OPENAI_API_KEY"], model_id).map(Self)
    }
}

impl AIProvider for OpenAIProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let endpoint = &self.0;
        let body = ChatRequest {
            model: &endpoint.model_id,
            max_tokens,
            messages: ChatMessage::user(prompt),
        };
        let request = endpoint.client.post(OPENAI_API_URL).bearer_auth(&endpoint.api_key);

        endpoint.post::<_, OpenAIResponse>(request, &body)?.into_text()
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_gemini() {
        let spec = resolve_model("gemini").unwrap();
        assert_eq!(spec.model_id, "gemini-2.5-flash");
        assert_eq!(spec.provider, ProviderKind::Gemini);

        let spec = resolve_model("gemini-pro").unwrap();
        assert_eq!(spec.short_name, "gemini-pro");
    }

    #[test]
    fn test_resolve_model_anthropic_and_openai() {
        let spec = resolve_model("sonnet").unwrap();
        assert_eq!(spec.short_name, "claude-sonnet");
        assert_eq!(spec.provider, ProviderKind::Anthropic);

        let spec = resolve_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.provider, ProviderKind::OpenAI);
    }

    #[test]
    fn test_resolve_model_unknown() {
        let err = resolve_model("gpt-3").unwrap_err();
        assert!(err.to_string().contains("Unknown model"));
    }

    #[test]
    fn test_anthropic_provider_requires_api_key() {
        let original = env::var("ANTHROPIC_API_KEY").ok();
        unsafe { env::remove_var("ANTHROPIC_API_KEY"); }

        let result = AnthropicProvider::new("claude-sonnet-4-5-20250929".to_string());

        if let Some(val) = original {
            unsafe { env::set_var("ANTHROPIC_API_KEY", val); }
        }

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_openai_provider_with_api_key() {
        let original = env::var("OPENAI_API_KEY").ok();
        unsafe { env::set_var("OPENAI_API_KEY", "test-key"); }

        let result = OpenAIProvider::new("gpt-4o".to_string());

        match original {
            Some(val) => unsafe { env::set_var("OPENAI_API_KEY", val) },
            None => unsafe { env::remove_var("OPENAI_API_KEY") },
        }

        assert_eq!(result.unwrap().model_name(), "gpt-4o");
    }

    #[test]
    fn test_gemini_reply_joins_parts_of_first_candidate() {
        let raw = r#"{"candidates": [
            {"content": {"parts": [{"text": "[{\"id\": "}, {"text": "\"pms\"}]"}]}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]}"#;
        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_text().unwrap(), r#"[{"id": "pms"}]"#);

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_err());
    }

    #[test]
    fn test_chat_replies() {
        let anthropic: AnthropicResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "Well structured."}]}"#).unwrap();
        assert_eq!(anthropic.into_text().unwrap(), "Well structured.");

        let openai: OpenAIResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#).unwrap();
        assert_eq!(openai.into_text().unwrap(), "");

        let body = serde_json::to_value(ChatRequest {
            model: "gpt-4o",
            max_tokens: 64,
            messages: ChatMessage::user("Hi"),
        })
        .unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
    }

    #[test]
    fn test_gemini_provider_accepts_fallback_key() {
        let gemini = env::var("GEMINI_API_KEY").ok();
        let api = env::var("API_KEY").ok();
        unsafe {
            env::remove_var("GEMINI_API_KEY");
            env::set_var("API_KEY", "fallback-key");
        }

        let result = GeminiProvider::new("gemini-2.5-flash".to_string());

        unsafe {
            match gemini {
                Some(val) => env::set_var("GEMINI_API_KEY", val),
                None => env::remove_var("GEMINI_API_KEY"),
            }
            match api {
                Some(val) => env::set_var("API_KEY", val),
                None => env::remove_var("API_KEY"),
            }
        }

        assert_eq!(result.unwrap().model_name(), "gemini-2.5-flash");
    }
}
