use super::parse_url_list as parse_url_list_impl;
use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn parse_url_list() {
    let content = "https://example.com/a\n  https://example.com/b  \n\nhttps://example.com/c\n";
    assert_eq!(
        parse_url_list_impl(content),
        vec![
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c"
        ]
    );
}

#[test]
fn parse_url_list_keeps_duplicates_and_order() {
    let content = "b\na\nb";
    assert_eq!(parse_url_list_impl(content), vec!["b", "a", "b"]);
}

#[test]
fn read_url_list_from_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("urls.txt");
    fs::write(&path, "https://one.example\r\nhttps://two.example\r\n").expect("should write");

    let urls = read_url_list(&path).expect("should read url list");
    assert_eq!(urls, vec!["https://one.example", "https://two.example"]);
}

#[test]
fn read_missing_url_list_fails() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let result = read_url_list(temp_dir.path().join("missing.txt"));
    assert!(result.is_err());
}

#[test]
fn crawler_config_defaults() {
    let config = CrawlerConfig::default();
    assert!(config.user_agent.starts_with("seek/"));
    assert_eq!(config.timeout_seconds, None);
}

#[test]
fn scrape_empty_list() {
    let scraper = WebScraper::default();
    let pages = scraper.scrape(&[]).expect("empty scrape should succeed");
    assert!(pages.is_empty());
}
