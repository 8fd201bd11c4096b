//! Wiremock integration tests for Ollama-backed local pipelines.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scriptorium::providers::LocalModels;
use scriptorium::{GenerationRequest, LocalPipeline, LocalTask, OllamaPipeline, Scriptorium};

fn pipeline(server: &MockServer, model: &str) -> Arc<OllamaPipeline> {
    Arc::new(OllamaPipeline::with_base_url(server.uri(), model, 5).unwrap())
}

async fn mount_show(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn probe_success_installs_pipeline() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;

    let models = LocalModels::new();
    assert!(
        models
            .initialize(LocalTask::Code, pipeline(&server, "codellama"))
            .await
    );
    assert!(models.status().code);
}

#[tokio::test]
async fn missing_model_leaves_task_unavailable() {
    let server = MockServer::start().await;
    mount_show(&server, 404).await;

    let models = LocalModels::new();
    assert!(
        !models
            .initialize(LocalTask::Summary, pipeline(&server, "bart"))
            .await
    );
    assert!(!models.status().summary);
}

#[tokio::test]
async fn generate_sends_system_prompt_and_options() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "codellama",
            "prompt": "fizzbuzz in rust",
            "system": "You are a code generation assistant. Generate clean, well-commented code.",
            "stream": false,
            "options": {"num_predict": 500}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"model": "codellama", "response": "fn main() {}", "done": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generator = Scriptorium::builder()
        .local_pipeline(LocalTask::Code, pipeline(&server, "codellama"))
        .build()
        .unwrap();

    let result = generator
        .generate(&GenerationRequest::new("fizzbuzz in rust", "code").model("local-code"))
        .await
        .unwrap();

    assert_eq!(result.content, "fn main() {}");
    assert_eq!(result.model, "codellama");
}

#[tokio::test]
async fn init_probes_and_degrades_to_placeholder() {
    let server = MockServer::start().await;
    mount_show(&server, 500).await;

    let generator = Scriptorium::builder()
        .local_pipeline(LocalTask::Text, pipeline(&server, "llama3"))
        .init()
        .await
        .unwrap();

    assert!(!generator.local_status().text);

    let result = generator
        .generate(&GenerationRequest::new("hello", "email").model("llama3"))
        .await
        .unwrap();
    assert_eq!(result.content, "Text generation model not available");
}

#[tokio::test]
async fn empty_response_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": ""})))
        .mount(&server)
        .await;

    let err = pipeline(&server, "llama3")
        .generate(&scriptorium::prompt::BuiltPrompt {
            content_type: scriptorium::ContentType::Text,
            system_prompt: "s".into(),
            user_message: "u".into(),
            max_tokens: 10,
            temperature: 0.1,
            local_task: LocalTask::Text,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, scriptorium::ScriptoriumError::EmptyResponse));
}
