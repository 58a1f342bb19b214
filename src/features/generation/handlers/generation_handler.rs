use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::generation::dtos::GenerateReportDto;
use crate::features::generation::services::GenerationService;
use crate::shared::constants::SSE_KEEP_ALIVE_SECS;

/// Generate a report from findings, streamed as Server-Sent Events.
///
/// Frames are `data: {"content": ...}` per delta, `data: {"report_id": ...}`
/// once saved, `data: {"error": ...}` on failure, and finally `data: [DONE]`.
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateReportDto,
    responses(
        (status = 200, description = "Event stream of report deltas", content_type = "text/event-stream", body = String),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found"),
        (status = 429, description = "LLM provider rate limit"),
        (status = 502, description = "LLM provider error")
    ),
    tag = "generation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_report(
    user: AuthenticatedUser,
    State(service): State<Arc<GenerationService>>,
    ValidatedJson(dto): ValidatedJson<GenerateReportDto>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let events = service
        .start(&user, dto)
        .await?
        .map(|event| Ok(event.into_sse()));

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generation::routes;
    use crate::features::generation::services::generation_service::tests::{
        FixedPrompt, MemorySink, RateLimitedLlm, ScriptedLlm,
    };
    use crate::modules::llm::ChatCompletionProvider;
    use crate::shared::test_helpers::{regular_user, with_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn server(llm: Arc<dyn ChatCompletionProvider>) -> TestServer {
        let service = Arc::new(GenerationService::new(
            Arc::new(FixedPrompt(None)),
            llm,
            Arc::new(MemorySink::default()),
        ));
        TestServer::new(with_user(routes::routes(service), regular_user())).unwrap()
    }

    #[tokio::test]
    async fn test_streams_deltas_then_report_id_then_done() {
        let llm = Arc::new(ScriptedLlm {
            chunks: vec!["# Chest X-ray\n", "Lungs clear."],
            ..Default::default()
        });

        let response = server(llm)
            .post("/api/generate")
            .json(&serde_json::json!({
                "findings": "lungs clear",
                "specialty": "radiology"
            }))
            .await;

        response.assert_status_ok();
        assert!(response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let body = response.text();
        let frames: Vec<&str> = body
            .lines()
            .filter_map(|l| l.strip_prefix("data: "))
            .collect();
        assert_eq!(
            frames,
            vec![
                r##"{"content":"# Chest X-ray\n"}"##,
                r#"{"content":"Lungs clear."}"#,
                r#"{"report_id":"00000000-0000-0000-0000-000000000063"}"#,
                "[DONE]",
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_before_stream_is_json() {
        let response = server(Arc::new(RateLimitedLlm))
            .post("/api/generate")
            .json(&serde_json::json!({
                "findings": "lungs clear",
                "specialty": "radiology"
            }))
            .await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "slow down");
    }

    #[tokio::test]
    async fn test_unknown_specialty_rejected() {
        let response = server(Arc::new(ScriptedLlm::default()))
            .post("/api/generate")
            .json(&serde_json::json!({
                "findings": "lungs clear",
                "specialty": "astrology"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
