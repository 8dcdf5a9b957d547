//! End-to-end question answering against the in-memory database.

use std::sync::Arc;

use datawhisperer::app::{InputResult, Orchestrator};
use datawhisperer::config::ConnectionConfig;
use datawhisperer::db::{MockConnector, MockDatabaseClient};
use datawhisperer::error::WhisperError;
use datawhisperer::llm::MockLlmClient;
use datawhisperer::pipeline::PipelineOutcome;
use datawhisperer::safety::REFUSAL_MESSAGE;
use datawhisperer::session::{Turn, GREETING};
use pretty_assertions::assert_eq;

fn chinook() -> ConnectionConfig {
    ConnectionConfig {
        database: Some("chinook".to_string()),
        ..ConnectionConfig::form_defaults()
    }
}

async fn connected(db: MockDatabaseClient, llm: MockLlmClient) -> Orchestrator {
    let connector = MockConnector::new(db).with_databases(&["chinook"]);
    let mut orchestrator = Orchestrator::with_connector(Arc::new(connector), Box::new(llm));
    let status = orchestrator.connect(&chinook()).await;
    assert!(status.is_connected(), "{status}");
    orchestrator
}

#[tokio::test]
async fn test_name_ten_artists() {
    let db = MockDatabaseClient::chinook();
    let recorded_db = db.clone();
    let llm = MockLlmClient::new().with_replies([
        "SELECT Name FROM Artist LIMIT 10;",
        "Here are 10 artists: AC/DC, Accept, Aerosmith, ...",
    ]);
    let recorded_llm = llm.clone();
    let mut orchestrator = connected(db, llm).await;

    let result = orchestrator.handle_input("Name 10 artists").await.unwrap();

    assert_eq!(
        result,
        InputResult::Reply(PipelineOutcome::Answered {
            sql: "SELECT Name FROM Artist LIMIT 10;".to_string(),
            answer: "Here are 10 artists: AC/DC, Accept, Aerosmith, ...".to_string(),
        })
    );
    assert_eq!(recorded_db.executed(), vec!["SELECT Name FROM Artist LIMIT 10;"]);

    let prompts = recorded_llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Table: Artist"));
    assert!(prompts[1].contains("<SQL>SELECT Name FROM Artist LIMIT 10;</SQL>"));
    assert!(prompts[1].contains("SQL Response: Name\nAC/DC\nAccept\nAerosmith"));

    assert_eq!(
        orchestrator.transcript().all(),
        &[
            Turn::assistant(GREETING),
            Turn::human("Name 10 artists"),
            Turn::assistant("Here are 10 artists: AC/DC, Accept, Aerosmith, ..."),
        ]
    );
}

#[tokio::test]
async fn test_unanswerable_question_is_refused() {
    let db = MockDatabaseClient::chinook();
    let recorded_db = db.clone();
    let llm = MockLlmClient::new().with_replies(["I don't know"]);
    let recorded_llm = llm.clone();
    let mut orchestrator = connected(db, llm).await;

    let result = orchestrator.handle_input("What's the weather?").await.unwrap();

    match result {
        InputResult::Reply(outcome) => assert_eq!(outcome.reply(), REFUSAL_MESSAGE),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(recorded_db.executed().is_empty());
    assert_eq!(recorded_llm.call_count(), 1);
    assert_eq!(
        orchestrator.transcript().last(),
        Some(&Turn::assistant(REFUSAL_MESSAGE))
    );
}

#[tokio::test]
async fn test_follow_up_question_includes_history() {
    let llm = MockLlmClient::new().with_replies([
        "SELECT Name FROM Artist LIMIT 3;",
        "AC/DC, Accept and Aerosmith.",
        "SELECT Title FROM Album LIMIT 2;",
        "For Those About To Rock We Salute You and Balls to the Wall.",
    ]);
    let recorder = llm.clone();
    let mut orchestrator = connected(MockDatabaseClient::chinook(), llm).await;

    orchestrator.handle_input("Name 3 artists").await.unwrap();
    orchestrator.handle_input("And two of their albums?").await.unwrap();

    let prompts = recorder.prompts();
    let history = "AI: Hello! I'm a SQL assistant. Ask me anything about your database.\n\
                   Human: Name 3 artists\n\
                   AI: AC/DC, Accept and Aerosmith.\n\
                   Human: And two of their albums?";
    assert!(prompts[2].contains(history));
    assert!(prompts[3].contains(history));
    assert_eq!(orchestrator.transcript().len(), 5);
}

#[tokio::test]
async fn test_nonexistent_database_then_question() {
    let connector = MockConnector::new(MockDatabaseClient::chinook()).with_databases(&["chinook"]);
    let llm = MockLlmClient::new();
    let recorder = llm.clone();
    let mut orchestrator = Orchestrator::with_connector(Arc::new(connector), Box::new(llm));

    let status = orchestrator
        .connect(&ConnectionConfig {
            database: Some("nonexistent".to_string()),
            ..ConnectionConfig::form_defaults()
        })
        .await;

    assert_eq!(
        status.user_message(),
        "The database 'nonexistent' does not exist. Please create the database and try again."
    );
    assert!(!orchestrator.is_connected());

    let result = orchestrator.handle_input("Name 10 artists").await.unwrap();
    assert_eq!(result, InputResult::NotConnected);
    assert_eq!(recorder.call_count(), 0);
    assert_eq!(orchestrator.transcript().len(), 1);
}

#[tokio::test]
async fn test_mock_llm_answers_from_schema() {
    let mut orchestrator = connected(MockDatabaseClient::chinook(), MockLlmClient::new()).await;

    let result = orchestrator
        .handle_input("How many artists are there?")
        .await
        .unwrap();

    assert_eq!(
        result,
        InputResult::Reply(PipelineOutcome::Answered {
            sql: "SELECT COUNT(*) AS total FROM Artist;".to_string(),
            answer: "Here is what I found for \"How many artists are there?\":\ntotal\n12"
                .to_string(),
        })
    );
}

#[tokio::test]
async fn test_destructive_statement_is_not_blocked() {
    let db = MockDatabaseClient::chinook();
    let recorder = db.clone();
    let llm = MockLlmClient::new().with_replies(["DELETE FROM Track;", "All tracks were deleted."]);
    let mut orchestrator = connected(db, llm).await;

    let result = orchestrator.handle_input("Remove every track").await.unwrap();

    assert!(matches!(
        result,
        InputResult::Reply(PipelineOutcome::Answered { .. })
    ));
    assert_eq!(recorder.executed(), vec!["DELETE FROM Track;"]);
}

#[tokio::test]
async fn test_llm_failure_is_reported() {
    let llm = MockLlmClient::new().with_failure("Invalid API key. Check OPENAI_API_KEY.");
    let mut orchestrator = connected(MockDatabaseClient::chinook(), llm).await;

    let err = orchestrator
        .handle_input("Name 10 artists")
        .await
        .unwrap_err();

    assert!(matches!(err, WhisperError::Llm(_)));
    assert_eq!(orchestrator.transcript().len(), 1);
}
