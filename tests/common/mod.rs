//! Mocked web pages and API endpoints shared by the integration tests.
#![allow(dead_code)]

use serde_json::{Value, json};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use seek::config::{Config, OpenAiConfig};

pub const KEYWORDS: [&str; 3] = ["alpha", "beta", "gamma"];

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = KEYWORDS
        .iter()
        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
        .collect();
    vector.push(0.1);
    vector
}

pub struct KeywordEmbedder;

impl Respond for KeywordEmbedder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let data: Vec<Value> = body["input"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        json!({
                            "index": index,
                            "embedding": keyword_vector(item.as_str().unwrap_or_default())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

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

pub async fn mount_chat(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": reply}}]
        })))
        .mount(server)
        .await;
}

pub async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
        .mount(server)
        .await;
}

/// Defaults rooted at `base_dir`, talking to the mock API
pub fn test_config(base_dir: &Path, api: &MockServer) -> Config {
    Config {
        base_dir: base_dir.to_path_buf(),
        openai: OpenAiConfig {
            api_base: format!("{}/v1/", api.uri()),
            api_key: Some("sk-test".to_string()),
            ..OpenAiConfig::default()
        },
        ..Config::default()
    }
}

pub fn write_file(base_dir: &Path, relative: &str, content: &str) {
    let path = base_dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("should create parent dirs");
    }
    std::fs::write(path, content).expect("should write file");
}

/// Request bodies received on `route`, decoded as JSON
pub async fn bodies_for(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|r| r.url.path() == route)
        .map(|r| serde_json::from_slice(&r.body).expect("json body"))
        .collect()
}
