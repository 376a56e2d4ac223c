pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/reset", post(handlers::handle_reset))
        // Input + oracle passes
        .route("/api/v1/sessions/:id/upload", post(handlers::handle_upload))
        .route("/api/v1/sessions/:id/format", post(handlers::handle_format))
        .route(
            "/api/v1/sessions/:id/reoptimize",
            post(handlers::handle_reoptimize),
        )
        // Presentation
        .route(
            "/api/v1/sessions/:id/preferences",
            patch(handlers::handle_preferences),
        )
        .route("/api/v1/sessions/:id/pages", get(handlers::handle_pages))
        .route("/api/v1/sessions/:id/preview", get(handlers::handle_preview))
        .route("/api/v1/sessions/:id/export", post(handlers::handle_export))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tokio::sync::Semaphore;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::oracle::tests::ScriptedOracle;
    use crate::analysis::Oracle;
    use crate::analysis::tests::{analysis_reply, resume_reply};
    use crate::config::tests::test_config;
    use crate::export::tests::encode_png;
    use crate::llm_client::LlmError;
    use crate::session::handlers::PDF_UPLOAD_MESSAGE;

    const BOUNDARY: &str = "formatter-test-boundary";

    fn app(oracle: Arc<ScriptedOracle>) -> Router {
        app_with(oracle)
    }

    fn app_with(oracle: Arc<dyn Oracle>) -> Router {
        build_router(AppState::new(oracle, test_config()))
    }

    /// Holds every oracle call until the test adds permits.
    struct GatedOracle {
        gate: Semaphore,
        inner: ScriptedOracle,
    }

    #[async_trait]
    impl Oracle for GatedOracle {
        async fn generate_json(&self, prompt: &str, system: &str) -> Result<Value, LlmError> {
            let _permit = self.gate.acquire().await.unwrap();
            self.inner.generate_json(prompt, system).await
        }
    }

    fn happy_oracle() -> Arc<ScriptedOracle> {
        Arc::new(ScriptedOracle::new(vec![
            Ok(resume_reply()),
            Ok(analysis_reply()),
            Ok(resume_reply()),
            Ok(analysis_reply()),
        ]))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    /// `(field name, file name, content type, bytes)` per part.
    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str, Vec<u8>)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, content_type, bytes) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(file_name) => {
                    format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n")
                }
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let response = send(app, empty_request("POST", "/api/v1/sessions")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["id"].as_str().unwrap().to_string()
    }

    async fn formatted_session(app: &Router) -> String {
        let id = create_session(app).await;
        let response = send(
            app,
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/format"),
                json!({ "raw_text": "Ada Lovelace\nAl Engineer\n1842-1843" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(ScriptedOracle::default()));
        let response = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "formatter");
    }

    #[tokio::test]
    async fn test_list_templates() {
        let app = app(Arc::new(ScriptedOracle::default()));
        let response = send(&app, empty_request("GET", "/api/v1/templates")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            [
                "minimalist-tech",
                "executive-elegance",
                "creative-portfolio",
                "modern-hybrid"
            ]
        );
        assert_eq!(body[3]["display_name"], "Modern Hybrid");
    }

    #[tokio::test]
    async fn test_create_get_delete_session() {
        let app = app(Arc::new(ScriptedOracle::default()));
        let id = create_session(&app).await;

        let response = send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["view"], "input");
        assert_eq!(body["page_size"], "letter");

        let response = send(&app, empty_request("DELETE", &format!("/api/v1/sessions/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_format_blank_input_is_field_error() {
        let oracle = Arc::new(ScriptedOracle::default());
        let app = app(oracle.clone());
        let id = create_session(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/format"),
                json!({ "raw_text": "   " }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["field"], "raw_text");
        assert_eq!(
            body["error"]["message"],
            "Please provide your résumé content."
        );
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_format_then_present() {
        let oracle = happy_oracle();
        let app = app(oracle.clone());
        let id = formatted_session(&app).await;
        assert_eq!(oracle.calls(), 2);

        let snapshot = json_body(
            send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}"))).await,
        )
        .await;
        assert_eq!(snapshot["view"], "results");
        assert_eq!(snapshot["content"]["personalInfo"]["title"], "AI Engineer");
        assert_eq!(snapshot["analysis"]["after"]["score"], 87);

        let response = send(
            &app,
            empty_request(
                "GET",
                &format!("/api/v1/sessions/{id}/pages?template=minimalist-tech"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let pages = json_body(response).await;
        assert_eq!(pages["template"], "minimalist-tech");
        assert!(pages["page_count"].as_u64().unwrap() >= 1);
        assert_eq!(pages["pages"][0]["is_first_page"], true);

        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/api/v1/sessions/{id}/preferences"),
                json!({ "template": "creative-portfolio", "page_size": "a4", "tab": "analysis" }),
            ),
        )
        .await;
        let prefs = json_body(response).await;
        assert_eq!(prefs["template"], "creative-portfolio");
        assert_eq!(prefs["container_id"], "resume-container-creative-portfolio");
        assert_eq!(prefs["page_size"], "a4");
        assert_eq!(prefs["tab"], "analysis");

        let response = send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}/preview"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("id=\"resume-container-creative-portfolio\""));
        assert!(html.contains("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_reoptimize_blank_jd_makes_no_oracle_call() {
        let oracle = happy_oracle();
        let app = app(oracle.clone());
        let id = formatted_session(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/reoptimize"),
                json!({ "job_description": "  " }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["field"], "job_description");
        assert_eq!(oracle.calls(), 2);

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/reoptimize"),
                json!({ "job_description": "Staff Rust engineer" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["job_description"], "Staff Rust engineer");
        assert_eq!(oracle.calls(), 4);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_bad_gateway_with_retry_message() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(LlmError::EmptyContent)]));
        let app = app(oracle);
        let id = create_session(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/format"),
                json!({ "raw_text": "Ada Lovelace" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "An error occurred while formatting your résumé. Please try again."
        );

        let snapshot = json_body(
            send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}"))).await,
        )
        .await;
        assert_eq!(snapshot["view"], "input");
        assert_eq!(snapshot["is_formatting"], false);
        assert_eq!(snapshot["raw_text"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_pages_before_format_is_conflict() {
        let app = app(Arc::new(ScriptedOracle::default()));
        let id = create_session(&app).await;
        let response = send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}/pages"))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_upload_text_and_reject_pdf() {
        let app = app(Arc::new(ScriptedOracle::default()));
        let id = create_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/upload");

        let response = send(
            &app,
            multipart_request(
                &uri,
                &[("file", Some("resume.pdf"), "application/pdf", b"%PDF-1.7".to_vec())],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["message"], PDF_UPLOAD_MESSAGE);

        let response = send(
            &app,
            multipart_request(
                &uri,
                &[(
                    "file",
                    Some("resume.txt"),
                    "text/plain",
                    "Grace Hopper\nRear Admiral".as_bytes().to_vec(),
                )],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["raw_text"],
            "Grace Hopper\nRear Admiral"
        );
    }

    #[tokio::test]
    async fn test_export_pdf_download() {
        let app = app(happy_oracle());
        let id = formatted_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/export");

        let response = send(
            &app,
            multipart_request(&uri, &[("page_size", None, "text/plain", b"letter".to_vec())]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "EXPORT_ERROR");

        let response = send(
            &app,
            multipart_request(
                &uri,
                &[
                    ("page", Some("page-1.png"), "image/png", encode_png(8, 10)),
                    ("page", Some("page-2.png"), "image/png", encode_png(8, 10)),
                    ("page_size", None, "text/plain", b"a4".to_vec()),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("filename=\"Ada Lovelace-formatted.pdf\""));

        let pdf = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(pdf.windows(8).any(|w| w == b"/Count 2"));
    }

    #[tokio::test]
    async fn test_reset_returns_to_input() {
        let app = app(happy_oracle());
        let id = formatted_session(&app).await;

        let response = send(&app, empty_request("POST", &format!("/api/v1/sessions/{id}/reset"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["view"], "input");
        assert!(body["content"].is_null());
        assert_eq!(body["template"], "modern-hybrid");
    }

    #[tokio::test]
    async fn test_format_survives_client_disconnect() {
        let oracle = Arc::new(GatedOracle {
            gate: Semaphore::new(0),
            inner: ScriptedOracle::new(vec![
                Err(LlmError::EmptyContent),
                Ok(resume_reply()),
                Ok(analysis_reply()),
            ]),
        });
        let app = app_with(oracle.clone());
        let id = create_session(&app).await;
        let format = || {
            json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/format"),
                json!({ "raw_text": "Ada Lovelace\nAl Engineer" }),
            )
        };

        // The client gives up while the oracle is still working.
        let abandoned = tokio::time::timeout(Duration::from_millis(50), send(&app, format())).await;
        assert!(abandoned.is_err(), "format answered before the oracle replied");
        oracle.gate.add_permits(8);

        let mut settled = None;
        for _ in 0..100 {
            let snapshot = json_body(
                send(&app, empty_request("GET", &format!("/api/v1/sessions/{id}"))).await,
            )
            .await;
            if snapshot["is_formatting"] == false {
                settled = Some(snapshot);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let settled = settled.expect("abandoned format never cleared its in-flight flag");
        assert_eq!(settled["view"], "input");
        assert!(settled["error"].is_string());

        let response = send(&app, format()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["view"], "results");
        assert_eq!(oracle.inner.calls(), 3);
    }
}
