use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_macros::{FromRequest, FromRequestParts, debug_handler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    dto::{
        CreateNoteRequest, ErrorResponse, SummarizeNote, SummarizeRequest, SummarizeResponse,
        UpdateNoteRequest, UploadResponse,
    },
    extractor::ExtractError,
    models::Note,
    service::{NoteService, ServiceError, SummaryService},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        create_note,
        update_note,
        delete_note,
        get_one_note,
        get_all_notes,
        upload_note,
        summarize_notes
    ),
    components(schemas(
        Note,
        CreateNoteRequest,
        UpdateNoteRequest,
        UploadForm,
        UploadResponse,
        SummarizeNote,
        SummarizeRequest,
        SummarizeResponse,
        ErrorResponse
    )),
    tags(
        (name = "notes", description = "Notes management API"),
        (name = "summaries", description = "AI study summaries")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NoteService>,
    pub summaries: Arc<SummaryService>,
}

/// Multipart upload form
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Plain text, PDF or DOCX file
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// JSON body extractor whose rejections are answered with an `ErrorResponse`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections are answered with an `ErrorResponse`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("rejected request body: {}", rejection.body_text());
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!("rejected request path: {}", rejection.body_text());
        Self::Validation(rejection.body_text())
    }
}

pub fn router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/notes", post(create_note).get(get_all_notes))
        .route(
            "/notes/{id}",
            get(get_one_note).put(update_note).delete(delete_note),
        )
        .route(
            "/upload",
            post(upload_note).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/summarize", post(summarize_notes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            detail: None,
        }),
    )
        .into_response()
}

fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => json_error(StatusCode::BAD_REQUEST, message),
            Self::NotFound => json_error(StatusCode::NOT_FOUND, "Note not found"),
            Self::Extraction(ExtractError::UnsupportedFormat(_)) => {
                json_error(StatusCode::BAD_REQUEST, "Unsupported file format.")
            }
            Self::Extraction(_) => json_error(StatusCode::BAD_REQUEST, "Failed to process file"),
            Self::NoNotes => json_error(StatusCode::BAD_REQUEST, "No notes provided"),
            Self::EmptyInput => json_error(StatusCode::BAD_REQUEST, "Notes had no text"),
            Self::Summarization(e) => (
                upstream_status(e.status),
                Json(ErrorResponse {
                    error: "Failed to summarize notes".to_string(),
                    detail: Some(e.message),
                }),
            )
                .into_response(),
            Self::Storage(_) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save notes")
            }
        }
    }
}

// Client mistakes are logged as warnings, everything else as errors.
fn failure(action: &str, e: ServiceError) -> Response {
    match &e {
        ServiceError::Validation(_)
        | ServiceError::NotFound
        | ServiceError::Extraction(_)
        | ServiceError::NoNotes
        | ServiceError::EmptyInput => tracing::warn!("failed to {}: {}", action, e),
        ServiceError::Summarization(_) | ServiceError::Storage(_) => {
            tracing::error!("failed to {}: {}", action, e);
        }
    }
    e.into_response()
}

async fn root() -> Response {
    (StatusCode::OK, "StudyBuddy server started!").into_response()
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = Note),
        (status = 400, description = "Note text is missing", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateNoteRequest>,
) -> Response {
    match state.notes.create_note(payload).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => failure("create note", e),
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = Note),
        (status = 400, description = "Note text is missing", body = ErrorResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateNoteRequest>,
) -> Response {
    match state.notes.update_note(id, payload).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => failure("update note", e),
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted, the removed note is returned", body = Note),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match state.notes.delete_note(id).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => failure("delete note", e),
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = Note),
        (status = 404, description = "Note not found", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match state.notes.get_one_note(id).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => failure("get note", e),
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "List of all notes", body = Vec<Note>)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(state): State<AppState>) -> Response {
    match state.notes.get_all_notes().await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => failure("get notes", e),
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded and note created", body = UploadResponse),
        (status = 400, description = "No file, unsupported format or unreadable file", body = ErrorResponse),
        (status = 413, description = "File too large")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn upload_note(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::warn!("rejected upload: {}", e.body_text());
            return json_error(StatusCode::BAD_REQUEST, e.body_text());
        }
    };
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("failed to read multipart upload: {}", e);
                return json_error(e.status(), "Failed to process file");
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        match field.bytes().await {
            Ok(data) => upload = Some((filename, content_type, data.to_vec())),
            Err(e) => {
                tracing::warn!("failed to read uploaded file: {}", e);
                return json_error(e.status(), "Failed to process file");
            }
        }
    }

    let Some((filename, content_type, data)) = upload else {
        return json_error(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    match state
        .notes
        .create_note_from_upload(filename.as_deref(), &content_type, data)
        .await
    {
        Ok(note) => (
            StatusCode::OK,
            Json(UploadResponse {
                message: "File uploaded and note created!".to_string(),
                note,
            }),
        )
            .into_response(),
        Err(e) => failure("create note from upload", e),
    }
}

#[utoipa::path(
    post,
    path = "/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary of the given notes", body = SummarizeResponse),
        (status = 400, description = "No notes, or no note text to summarize", body = ErrorResponse),
        (status = 500, description = "Summarization service failure; upstream status is passed through when known", body = ErrorResponse)
    ),
    tag = "summaries"
)]
#[debug_handler]
pub async fn summarize_notes(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SummarizeRequest>,
) -> Response {
    match state.summaries.summarize(&payload.notes).await {
        Ok(summary) => (StatusCode::OK, Json(SummarizeResponse { summary })).into_response(),
        Err(e) => failure("summarize notes", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DEFAULT_CHUNK_PROMPT, SummarizerConfig},
        llm::{SummarizationError, testing::ScriptedClient},
        repository::{JsonFileRepository, NoteRepository},
    };
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt; // for `oneshot`

    const BOUNDARY: &str = "studybuddy-test-boundary";

    async fn test_app(client: Arc<ScriptedClient>) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("notes.json"))
            .await
            .unwrap();
        let repo: Box<dyn NoteRepository> = Box::new(repo);

        let state = AppState {
            notes: Arc::new(NoteService::new(Arc::new(tokio::sync::Mutex::new(repo)))),
            summaries: Arc::new(SummaryService::new(client, SummarizerConfig::default())),
        };

        (dir, router(state, 1024 * 1024))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
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

    fn upload_request(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let response = app.oneshot(empty_request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"StudyBuddy server started!");
    }

    #[tokio::test]
    async fn test_create_and_list_notes() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, created) = send(
            &app,
            json_request("POST", "/notes", &json!({ "title": "Physics", "text": "F = ma" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Physics");
        assert_eq!(created["text"], "F = ma");
        assert!(created["createdAt"].is_string());
        assert!(created.get("updatedAt").is_none());

        let (status, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([created]));
    }

    #[tokio::test]
    async fn test_create_without_text_is_bad_request() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/notes", &json!({ "title": "Only a title" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Note text is required");

        let (_, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_update_get_and_delete_note() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (_, created) = send(
            &app,
            json_request("POST", "/notes", &json!({ "text": "draft" })),
        )
        .await;
        assert_eq!(created["title"], "Untitled Note");
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            json_request(
                "PUT",
                &format!("/notes/{id}"),
                &json!({ "title": "Final", "text": "done" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_eq!(updated["title"], "Final");
        assert!(updated["updatedAt"].is_string());

        let (status, fetched) = send(&app, empty_request("GET", &format!("/notes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);

        let (status, deleted) = send(&app, empty_request("DELETE", &format!("/notes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, updated);

        let (status, _) = send(&app, empty_request("GET", &format!("/notes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(&app, empty_request("DELETE", "/notes/12345")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Note not found");

        let (status, _) = send(
            &app,
            json_request("PUT", "/notes/12345", &json!({ "text": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_text_file_creates_note() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            upload_request("file", "week1.txt", "text/plain", b"Osmosis\n\n moves   water."),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "File uploaded and note created!");
        assert_eq!(body["note"]["title"], "week1");
        assert_eq!(body["note"]["text"], "Osmosis moves water.");

        let (_, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(listed, json!([body["note"]]));
    }

    #[tokio::test]
    async fn test_upload_png_is_unsupported() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            upload_request("file", "diagram.png", "image/png", &[0x89, b'P', b'N', b'G']),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported file format.");

        let (_, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            upload_request("attachment", "a.txt", "text/plain", b"text"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_blank_file_fails_to_process() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(&app, upload_request("file", "a.txt", "text/plain", b"  \n ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Failed to process file");
    }

    #[tokio::test]
    async fn test_summarize_blank_notes_is_bad_request() {
        let client = Arc::new(ScriptedClient::default());
        let (_dir, app) = test_app(client.clone()).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/summarize",
                &json!({ "notes": [{ "text": "" }, { "text": "  " }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Notes had no text");
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_summarize_returns_summary() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(Some("Cells have mitochondria.".to_string())),
            Ok(Some("Mitochondria power cells.".to_string())),
        ]));
        let (_dir, app) = test_app(client.clone()).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/summarize",
                &json!({ "notes": [{ "id": 1, "title": "Bio", "text": "The mitochondria is the powerhouse of the cell." }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "summary": "Mitochondria power cells." }));
        assert_eq!(client.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_summarize_passes_upstream_status_through() {
        let client = Arc::new(ScriptedClient::new(vec![Err(SummarizationError {
            status: Some(429),
            message: "Rate limit exceeded".to_string(),
        })]));
        let (_dir, app) = test_app(client).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/summarize", &json!({ "notes": [{ "text": "a" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Failed to summarize notes");
        assert_eq!(body["detail"], "Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_summarize_transport_failure_is_internal_error() {
        let client = Arc::new(ScriptedClient::new(vec![Err(SummarizationError {
            status: None,
            message: "connection refused".to_string(),
        })]));
        let (_dir, app) = test_app(client).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/summarize", &json!({ "notes": [{ "text": "a" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "connection refused");
    }

    fn raw_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_skips_null_notes() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(Some("Mitosis.".to_string())),
            Ok(Some("Cells split in two.".to_string())),
        ]));
        let (_dir, app) = test_app(client.clone()).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/summarize",
                &json!({ "notes": [null, { "text": "Cells divide." }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "summary": "Cells split in two." }));

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], format!("{DEFAULT_CHUNK_PROMPT}\n\nCells divide."));
    }

    #[tokio::test]
    async fn test_summarize_without_notes_is_bad_request() {
        let client = Arc::new(ScriptedClient::default());
        let (_dir, app) = test_app(client.clone()).await;

        for payload in [json!({ "notes": [] }), json!({})] {
            let (status, body) = send(&app, json_request("POST", "/summarize", &payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "No notes provided");
        }

        let (status, body) = send(
            &app,
            json_request("POST", "/summarize", &json!({ "notes": [null] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Notes had no text");

        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_mistyped_body_is_json_bad_request() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/notes", &json!({ "title": "t", "text": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");

        let (status, body) = send(
            &app,
            json_request("POST", "/summarize", &json!({ "notes": "all of them" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");

        let mut request = json_request("POST", "/notes", &json!({}));
        *request.body_mut() = Body::from("{\"text\": ");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");

        let (_, listed) = send(&app, empty_request("GET", "/notes")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_body_without_content_type_is_json_bad_request() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            raw_request("POST", "/notes", r#"{"title":"t","text":"body"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");

        let (status, body) = send(&app, raw_request("POST", "/upload", "plain body")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_bad_request() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, body) = send(
            &app,
            json_request("PUT", "/notes/abc", &json!({ "text": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");

        for method in ["GET", "DELETE"] {
            let (status, body) = send(&app, empty_request(method, "/notes/abc")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string(), "{body}");
        }
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (_dir, app) = test_app(Arc::new(ScriptedClient::default())).await;

        let (status, doc) = send(&app, empty_request("GET", "/api-doc/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"].get("/summarize").is_some());
        assert!(doc["paths"].get("/notes/{id}").is_some());
    }
}
