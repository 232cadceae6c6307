//! Shared fixtures for unit tests that talk to a mocked API.

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::config::OpenAiConfig;

/// Keywords mapped to one axis each; the last axis is a constant bias
pub const KEYWORDS: [&str; 3] = ["alpha", "beta", "gamma"];

/// Deterministic embedding: one axis per keyword present in the text
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = KEYWORDS
        .iter()
        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
        .collect();
    vector.push(0.1);
    vector
}

/// Answers `/embeddings` with one keyword vector per input, in order
pub struct KeywordEmbedder;

impl Respond for KeywordEmbedder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let inputs: Vec<String> = body["input"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .map(|(index, text)| json!({"index": index, "embedding": keyword_vector(text)}))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": data}))
    }
}

pub async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(KeywordEmbedder)
        .mount(server)
        .await;
}

pub fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

pub fn openai_config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig {
        api_base: format!("{}/v1/", server.uri()),
        batch_size: 2,
        ..OpenAiConfig::default()
    }
}
