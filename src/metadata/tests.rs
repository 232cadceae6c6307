use super::*;
use crate::test_support::{chat_reply, openai_config};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generator_for(server: &MockServer) -> MetadataGenerator {
    let chat = ChatClient::from_config(&openai_config(server), "sk-test").expect("client");
    MetadataGenerator::new(chat)
}

async fn mount_replies(server: &MockServer, description: &str, tags: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Describe the following text"))
        .respond_with(chat_reply(description))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Give tags for the following text"))
        .respond_with(chat_reply(tags))
        .mount(server)
        .await;
}

#[test]
fn tag_splitting() {
    assert_eq!(split_tags("a, b, c"), vec!["a", "b", "c"]);
    assert_eq!(split_tags("single"), vec!["single"]);
    assert_eq!(split_tags("  html,  docs \n"), vec!["html", "docs"]);
}

#[test]
fn excerpt_counts_characters() {
    let short = "short text";
    assert_eq!(excerpt(short), short);

    let long = "x".repeat(250);
    assert_eq!(excerpt(&long).len(), EXCERPT_CHARS);

    let multibyte = "é".repeat(150);
    assert_eq!(excerpt(&multibyte).chars().count(), EXCERPT_CHARS);
}

#[test]
fn rendered_layout() {
    let rendered = render_metadata(
        "index.html",
        "A landing page.",
        &["web".to_string(), "landing".to_string()],
    );

    assert_eq!(
        rendered,
        "## index.html\n\n**Description:** A landing page.\n\n**Tags:**\n\n- web\n- landing\n"
    );
}

#[test]
fn html_files_are_direct_children_only() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let dir = temp_dir.path();
    fs::write(dir.join("b.html"), "b").expect("write");
    fs::write(dir.join("a.html"), "a").expect("write");
    fs::write(dir.join("style.css"), "css").expect("write");
    fs::create_dir_all(dir.join("nested")).expect("mkdir");
    fs::write(dir.join("nested/c.html"), "c").expect("write");

    let files = html_files(dir).expect("should list files");
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().expect("name").to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["a.html", "b.html"]);
}

#[test]
fn missing_directory_is_an_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    assert!(html_files(&temp_dir.path().join("missing")).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn writes_metadata_file() {
    let server = MockServer::start().await;
    mount_replies(&server, "  A page about widgets.  ", "widgets, html , docs").await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let page = temp_dir.path().join("widgets.html");
    fs::write(&page, "<html><body>Widgets everywhere</body></html>").expect("write");

    let written = generator_for(&server)
        .process_directory(temp_dir.path())
        .expect("generation should succeed");

    assert_eq!(written, vec![temp_dir.path().join("widgets.html-metadata.md")]);
    let content = fs::read_to_string(&written[0]).expect("read metadata");
    assert_eq!(
        content,
        "## widgets.html\n\n**Description:** A page about widgets.\n\n**Tags:**\n\n- widgets\n- html\n- docs\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn prompts_use_excerpt() {
    let server = MockServer::start().await;
    mount_replies(&server, "desc", "tag").await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let body = format!("{}{}", "a".repeat(EXCERPT_CHARS), "TAIL");
    fs::write(temp_dir.path().join("long.html"), &body).expect("write");

    generator_for(&server)
        .process_directory(temp_dir.path())
        .expect("generation should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(&format!("{}...", "a".repeat(EXCERPT_CHARS))));
        assert!(!body.contains("TAIL"));
        assert!(body.contains("You are a helpful assistant."));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn api_failure_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("a.html"), "a").expect("write");

    let result = generator_for(&server).process_directory(temp_dir.path());

    assert!(result.is_err());
    assert!(!temp_dir.path().join("a.html-metadata.md").exists());
}
