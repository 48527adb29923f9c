use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};

const SYSTEM_INSTRUCTION: &str =
    "You are a supportive self-improvement coach. Always respond with valid JSON only.";

/// What came back from the provider. `Degraded` is still a success: the
/// model answered, just not in the requested shape, and the caller gets
/// the raw text to persist instead of losing the interaction. Hard
/// failures (transport, non-2xx, incomplete fields) are `AppError::Provider`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Generated { summary: String, feedback: String },
    Degraded { summary: String, feedback: String },
}

impl FeedbackOutcome {
    pub fn into_parts(self) -> (String, String) {
        match self {
            FeedbackOutcome::Generated { summary, feedback }
            | FeedbackOutcome::Degraded { summary, feedback } => (summary, feedback),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FeedbackOutcome::Degraded { .. })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct FeedbackPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    feedback: String,
}

/// Client for the external feedback model. Constructed once in `main` and
/// handed around through `AppState`; the round-trip timeout lives on the
/// inner `reqwest::Client`.
#[derive(Clone)]
pub struct FeedbackClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl FeedbackClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.feedback_base_url.clone(),
            config.feedback_api_key.clone(),
            config.feedback_model.clone(),
            Duration::from_secs(config.feedback_timeout_secs),
        )
    }

    /// Ask the model for a (summary, feedback) pair over the given journal
    /// content. Empty content is rejected before any network traffic.
    pub async fn generate(&self, content: &str) -> AppResult<FeedbackOutcome> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Journal content cannot be empty".into(),
            ));
        }

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.7,
            max_tokens: 500,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.into(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(content),
                },
            ],
        };

        tracing::debug!(model = %self.model, "Requesting journal feedback");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!("HTTP {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("invalid response body: {e}")))?;

        let raw = chat
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::Provider("no choices in response".into()))?;

        interpret(&raw)
    }
}

fn build_prompt(content: &str) -> String {
    format!(
        r#"Analyze the user's journal entry and provide:
1. A brief, encouraging summary (2-3 sentences)
2. Constructive feedback with actionable insights

Return ONLY valid JSON in this exact format:
{{
  "summary": "Brief summary here",
  "feedback": "Constructive feedback with specific suggestions"
}}

User's Journal Entry:
{content}"#
    )
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("```json").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix("```").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

fn interpret(raw: &str) -> AppResult<FeedbackOutcome> {
    let cleaned = strip_code_fence(raw);

    match serde_json::from_str::<FeedbackPayload>(cleaned) {
        Ok(payload) => {
            if payload.summary.is_empty() || payload.feedback.is_empty() {
                return Err(AppError::Provider(
                    "incomplete response: missing summary or feedback".into(),
                ));
            }
            Ok(FeedbackOutcome::Generated {
                summary: payload.summary,
                feedback: payload.feedback,
            })
        }
        Err(_) => Ok(FeedbackOutcome::Degraded {
            summary: "Unable to parse AI response".into(),
            feedback: format!("AI provided feedback but in unexpected format: {cleaned}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat_body(content: &str) -> String {
        json!({
            "choices": [{
                "message": { "role": "assistant", "content": content }
            }]
        })
        .to_string()
    }

    fn test_client(base_url: String) -> FeedbackClient {
        FeedbackClient::new(base_url, "test-key", "gpt-4o-mini", Duration::from_secs(5))
    }

    #[test]
    fn interpret_accepts_plain_json() {
        let outcome =
            interpret(r#"{"summary": "Good day.", "feedback": "Keep at it."}"#).unwrap();
        assert_eq!(
            outcome,
            FeedbackOutcome::Generated {
                summary: "Good day.".into(),
                feedback: "Keep at it.".into(),
            }
        );
    }

    #[test]
    fn interpret_treats_fenced_json_like_plain() {
        let plain = r#"{"summary": "Good day.", "feedback": "Keep at it."}"#;
        let fenced = format!("```json\n{plain}\n```");
        assert_eq!(interpret(plain).unwrap(), interpret(&fenced).unwrap());
    }

    #[test]
    fn interpret_degrades_on_non_json() {
        let outcome = interpret("Here are my thoughts on your entry...").unwrap();
        assert!(outcome.is_degraded());
        let (summary, feedback) = outcome.into_parts();
        assert_eq!(summary, "Unable to parse AI response");
        assert!(feedback.contains("Here are my thoughts"));
    }

    #[test]
    fn interpret_rejects_empty_fields() {
        let err = interpret(r#"{"summary": "", "feedback": "something"}"#).unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));

        let err = interpret(r#"{"summary": "something"}"#).unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[test]
    fn strip_code_fence_handles_bare_fences() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn generate_returns_parsed_feedback() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(
                r#"{"summary": "A productive day.", "feedback": "Try a morning routine."}"#,
            ))
            .create_async()
            .await;

        let client = test_client(server.url());
        let outcome = client.generate("Today I finished the report.").await.unwrap();

        assert_eq!(
            outcome,
            FeedbackOutcome::Generated {
                summary: "A productive day.".into(),
                feedback: "Try a morning routine.".into(),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_degrades_on_prose_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body("Sounds like a rough week, hang in there!"))
            .create_async()
            .await;

        let client = test_client(server.url());
        let outcome = client.generate("Rough week.").await.unwrap();

        assert!(outcome.is_degraded());
        let (_, feedback) = outcome.into_parts();
        assert!(!feedback.is_empty());
    }

    #[tokio::test]
    async fn generate_fails_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.generate("Some entry.").await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[tokio::test]
    async fn generate_fails_when_unreachable() {
        // Nothing listens here; the connection is refused immediately.
        let client = test_client("http://127.0.0.1:9".into());
        let err = client.generate("Some entry.").await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[tokio::test]
    async fn generate_rejects_empty_content_without_calling_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.generate("   \n\t").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        mock.assert_async().await;
    }
}
