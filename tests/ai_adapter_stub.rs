// tests/ai_adapter_stub.rs
use std::time::Duration;

use knowledge_curator::ai_adapter::{
    build_client_from_config, GeminiProvider, MockProvider, NotesClient, OpenAiProvider, Provider,
    Summarizer,
};
use knowledge_curator::config::SummarizerConfig;
use knowledge_curator::error::SummaryError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cfg(provider: &str, api_key: &str) -> SummarizerConfig {
    SummarizerConfig {
        provider: provider.to_string(),
        api_key: api_key.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn gemini_notes_are_cleaned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash-latest:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("Intro to Testing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "```markdown\n### Core Concepts\n" },
                    { "text": "*   **Fixtures:** Shared setup.\n```" }
                ]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(
        Some("test-key".into()),
        None,
        &server.uri(),
        Duration::from_secs(5),
    )
    .unwrap();
    let client = NotesClient::new(provider, 10_000);

    let notes = client.summarize("we talk about fixtures", "Intro to Testing").await.unwrap();
    assert_eq!(notes, "### Core Concepts\n*   **Fixtures:** Shared setup.");
    assert_eq!(client.provider_name(), "gemini");
}

#[tokio::test]
async fn gemini_http_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(
        Some("k".into()),
        Some("gemini-pro"),
        &server.uri(),
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(provider.generate("p").await, Err(SummaryError::Status(429)));
}

#[tokio::test]
async fn gemini_without_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider =
        GeminiProvider::new(Some("k".into()), None, &server.uri(), Duration::from_secs(5)).unwrap();
    let client = NotesClient::new(provider, 10_000);
    assert_eq!(
        client.summarize("t", "x").await,
        Err(SummaryError::EmptyResponse)
    );
}

#[tokio::test]
async fn openai_uses_bearer_and_chat_completions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("gpt-4o-mini"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "### Key Takeaways\n* done" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(
        Some("sk-test".into()),
        None,
        &server.uri(),
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(provider.generate("prompt").await.unwrap(), "### Key Takeaways\n* done");
}

#[tokio::test]
async fn openai_without_key_never_calls_out() {
    let provider =
        OpenAiProvider::new(None, None, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    assert_eq!(
        provider.generate("p").await,
        Err(SummaryError::MissingCredentials("OPENAI_API_KEY"))
    );
}

#[tokio::test]
async fn mock_provider_yields_all_sections() {
    let client = NotesClient::new(MockProvider::default(), 100);
    let notes = client.summarize("anything", "Title").await.unwrap();
    for h in ["Core Concepts", "Key Takeaways", "Notable Examples or Analogies"] {
        assert!(notes.contains(h), "missing {h}");
    }
}

#[serial_test::serial]
#[tokio::test]
async fn factory_honors_test_mode_and_unknown_providers() {
    std::env::set_var("AI_TEST_MODE", "mock");
    let client = build_client_from_config(&cfg("gemini", "ENV")).unwrap();
    assert_eq!(client.provider_name(), "mock");
    assert!(client.summarize("t", "x").await.is_ok());
    std::env::remove_var("AI_TEST_MODE");

    let client = build_client_from_config(&cfg("mock", "")).unwrap();
    assert_eq!(client.provider_name(), "mock");

    let client = build_client_from_config(&cfg("llama", "k")).unwrap();
    assert_eq!(client.provider_name(), "disabled");
    assert_eq!(client.summarize("t", "x").await, Err(SummaryError::Disabled));
}

#[serial_test::serial]
#[tokio::test]
async fn factory_without_key_degrades_per_call() {
    std::env::remove_var("AI_TEST_MODE");
    std::env::remove_var("GEMINI_API_KEY");

    let client = build_client_from_config(&cfg("gemini", "ENV")).unwrap();
    assert_eq!(client.provider_name(), "gemini");
    assert_eq!(
        client.summarize("t", "x").await,
        Err(SummaryError::MissingCredentials("GEMINI_API_KEY"))
    );
}
