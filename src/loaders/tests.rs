use super::*;
use crate::database::sqlite::{Database, NewConversation};
use std::fs;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("should create parent dirs");
    }
    fs::write(&path, content).expect("should write file");
    path
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[tokio::test]
async fn text_loader_reads_whole_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write(temp_dir.path(), "notes.md", "# Notes\n\nSome text.");

    let loader = TextLoader::new(&path);
    let documents = loader.load().await.expect("load should succeed");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].content, "# Notes\n\nSome text.");
    assert_eq!(documents[0].source(), Some(path.display().to_string().as_str()));

    // Re-reading picks up changes
    fs::write(&path, "changed").expect("should rewrite file");
    let documents = loader.load().await.expect("load should succeed");
    assert_eq!(documents[0].content, "changed");
}

#[tokio::test]
async fn text_loader_missing_file_fails() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let loader = TextLoader::new(temp_dir.path().join("missing.txt"));

    assert!(loader.load().await.is_err());
}

#[tokio::test]
async fn html_loader_extracts_visible_text() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write(
        temp_dir.path(),
        "index.html",
        "<html><head><script>var x = 1;</script></head><body><h1>Title</h1><p>Body  text</p></body></html>",
    );

    let documents = HtmlLoader::new(&path)
        .load()
        .await
        .expect("load should succeed");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].content, "Title\nBody text");
    assert!(documents[0].source().is_some_and(|s| s.ends_with("index.html")));
}

#[tokio::test]
async fn directory_loader_reads_in_sorted_order() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write(temp_dir.path(), "page1.txt", "one");
    write(temp_dir.path(), "page0.txt", "zero");
    write(temp_dir.path(), "nested/page2.txt", "two");
    write(temp_dir.path(), "ignored.md", "not a txt file");

    let loader = DirectoryLoader::new(temp_dir.path(), "txt", 2);
    let documents = loader.load().await.expect("load should succeed");

    let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["two", "zero", "one"]);
}

#[tokio::test]
async fn directory_loader_missing_dir_is_empty() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let documents = DirectoryLoader::new(temp_dir.path().join("web_content"), "txt", 4)
        .load()
        .await
        .expect("load should succeed");

    assert!(documents.is_empty());
}

#[tokio::test]
async fn conversation_loader_maps_rows() {
    let database = Database::in_memory().await.expect("should open database");
    for text in ["What is this?", "It is a project."] {
        database
            .insert_conversation(&NewConversation {
                date: "2024-01-01 12:00:00".to_string(),
                tags: "example".to_string(),
                title: "Example Conversation".to_string(),
                vector_id: text.to_string(),
            })
            .await
            .expect("should insert row");
    }

    let documents = ConversationLoader::new(database)
        .load()
        .await
        .expect("load should succeed");

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].content, "What is this?");
    assert_eq!(documents[1].content, "It is a project.");
    assert_eq!(
        documents[0].metadata.get(TAGS_KEY).map(String::as_str),
        Some("example")
    );
    assert_eq!(documents[0].source(), Some("conversations"));
}

#[tokio::test]
async fn conversation_loader_empty_table() {
    let database = Database::in_memory().await.expect("should open database");

    let documents = ConversationLoader::new(database)
        .load()
        .await
        .expect("load should succeed");

    assert!(documents.is_empty());
}

#[test]
fn discover_skips_excluded_directories() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let root = temp_dir.path();
    write(root, "src/index.html", "<p>hi</p>");
    write(root, "src/app.js", "console.log(1);");
    write(root, "node_modules/lib/index.js", "module.exports = {};");
    write(root, "src/node_modules/deep.js", "nested");
    write(root, "package.json", "{}");

    let loaders = discover_project_loaders(
        root,
        &strings(&["html", "js", "json"]),
        "node_modules",
        &strings(&["html"]),
    );

    let descriptions: Vec<String> = loaders.iter().map(|l| l.describe()).collect();
    assert_eq!(descriptions.len(), 3);
    assert!(descriptions.iter().all(|d| !d.contains("node_modules")));
    assert!(descriptions[0].starts_with("html:"));
    assert!(descriptions[0].ends_with("index.html"));
    assert!(descriptions[1].starts_with("text:"));
    assert!(descriptions[1].ends_with("app.js"));
    assert!(descriptions[2].ends_with("package.json"));
}

#[test]
fn exclusion_matches_whole_components() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let root = temp_dir.path();
    write(root, "my_node_modules_notes/readme.md", "kept");
    write(root, "node_modules/readme.md", "skipped");

    let files = find_files(root, "md", Some("node_modules"));

    assert_eq!(files.len(), 1);
    assert!(files[0].to_string_lossy().contains("my_node_modules_notes"));
}

#[test]
fn project_dir_inside_excluded_directory_yields_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let project = temp_dir.path().join("node_modules").join("pkg");
    write(&project, "readme.md", "vendored");
    write(&project, "docs/guide.md", "vendored guide");

    let loaders = discover_project_loaders(&project, &strings(&["md"]), "node_modules", &[]);

    assert!(loaders.is_empty());
    assert_eq!(find_files(&project, "md", None).len(), 2);
}

#[test]
fn discover_missing_project_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let loaders = discover_project_loaders(
        &temp_dir.path().join("project"),
        &strings(&["md"]),
        "node_modules",
        &[],
    );

    assert!(loaders.is_empty());
}

#[tokio::test]
async fn loader_set_concatenates_in_order() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let a = write(temp_dir.path(), "a.txt", "first");
    let b = write(temp_dir.path(), "b.txt", "second");

    let mut set = LoaderSet::new();
    assert!(set.is_empty());
    set.push(Box::new(TextLoader::new(&b)));
    set.extend([Box::new(TextLoader::new(&a)) as Box<dyn DocumentLoader>]);
    assert_eq!(set.len(), 2);

    let documents = set.load_all().await.expect("load should succeed");
    let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
}

#[tokio::test]
async fn loader_set_fails_fast() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut set = LoaderSet::new();
    set.push(Box::new(TextLoader::new(temp_dir.path().join("missing.txt"))));

    assert!(set.load_all().await.is_err());
}
