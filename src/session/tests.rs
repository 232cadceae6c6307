use super::*;
use crate::config::HistoryConfig;
use crate::database::sqlite::Database;
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Mutex;

/// Echoes queries back and remembers what it was asked
#[derive(Default)]
struct EchoEngine {
    asked: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryEngine for EchoEngine {
    async fn answer(&self, query: &str) -> Result<String> {
        self.asked
            .lock()
            .expect("lock is not poisoned")
            .push(query.to_string());
        Ok(format!("echo: {query}"))
    }
}

struct FailingEngine;

#[async_trait]
impl QueryEngine for FailingEngine {
    async fn answer(&self, _query: &str) -> Result<String> {
        Err(anyhow::anyhow!("API unavailable"))
    }
}

async fn run_session(
    engine: &dyn QueryEngine,
    history: Option<&ConversationLog>,
    initial: Option<&str>,
    input: &str,
) -> (usize, String) {
    let mut output = Vec::new();
    let answered = ChatSession::new(engine, history)
        .run(initial, Cursor::new(input.to_string()), &mut output)
        .await
        .expect("session should succeed");
    (answered, String::from_utf8(output).expect("utf8 output"))
}

#[test]
fn exit_command_detection() {
    assert!(is_exit_command("exit"));
    assert!(is_exit_command("  EXIT \n"));
    assert!(is_exit_command("Exit"));
    assert!(!is_exit_command("exit now"));
    assert!(!is_exit_command(""));
}

#[tokio::test]
async fn initial_query_is_answered_first() {
    let engine = EchoEngine::default();

    let (answered, output) = run_session(&engine, None, Some("first"), "second\nexit\n").await;

    assert_eq!(answered, 2);
    assert_eq!(
        *engine.asked.lock().expect("lock is not poisoned"),
        vec!["first".to_string(), "second".to_string()]
    );
    assert!(output.starts_with("echo: first\n>>> "));
    assert!(output.contains("echo: second\n"));
}

#[tokio::test]
async fn exit_stops_before_remaining_input() {
    let engine = EchoEngine::default();

    let (answered, _) = run_session(&engine, None, None, " Exit \nnever asked\n").await;

    assert_eq!(answered, 0);
    assert!(engine.asked.lock().expect("lock is not poisoned").is_empty());
}

#[tokio::test]
async fn end_of_input_ends_session() {
    let engine = EchoEngine::default();

    let (answered, output) = run_session(&engine, None, None, "only question").await;

    assert_eq!(answered, 1);
    assert!(output.contains("echo: only question"));
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    let engine = EchoEngine::default();

    let (answered, _) = run_session(&engine, None, None, "\n   \nreal\n").await;

    assert_eq!(answered, 1);
    assert_eq!(
        *engine.asked.lock().expect("lock is not poisoned"),
        vec!["real".to_string()]
    );
}

#[tokio::test]
async fn exchanges_are_logged_when_history_enabled() {
    let database = Database::in_memory().await.expect("should open database");
    let log = ConversationLog::new(database, &HistoryConfig::default());
    let engine = EchoEngine::default();

    run_session(&engine, Some(&log), Some("q1"), "q2\nexit\n").await;

    let rows = log
        .database()
        .list_conversations()
        .await
        .expect("should list rows");
    let texts: Vec<&str> = rows.iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["q1", "echo: q1", "q2", "echo: q2"]);
    assert_eq!(rows[0].date, rows[1].date);
    assert_eq!(rows[2].date, rows[3].date);
}

#[tokio::test]
async fn engine_errors_abort_the_session() {
    let database = Database::in_memory().await.expect("should open database");
    let log = ConversationLog::new(database, &HistoryConfig::default());

    let mut output = Vec::new();
    let result = ChatSession::new(&FailingEngine, Some(&log))
        .run(Some("q"), Cursor::new(String::new()), &mut output)
        .await;

    assert!(result.is_err());
    assert_eq!(
        log.database()
            .count_conversations()
            .await
            .expect("should count"),
        0
    );
}

#[tokio::test]
async fn ask_answers_without_prompting() {
    let database = Database::in_memory().await.expect("should open database");
    let log = ConversationLog::new(database, &HistoryConfig::default());
    let engine = EchoEngine::default();

    let mut output = Vec::new();
    ChatSession::new(&engine, Some(&log))
        .ask("only", &mut output)
        .await
        .expect("ask should succeed");

    let output = String::from_utf8(output).expect("utf8 output");
    assert_eq!(output, "echo: only\n");
    assert!(!output.contains(PROMPT));
    assert_eq!(
        log.database()
            .count_conversations()
            .await
            .expect("should count"),
        2
    );
}
