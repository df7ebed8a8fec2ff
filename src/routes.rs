use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::{TranslateError, TranslateResult};
use crate::state::AppState;
use crate::translate::{Language, TranslationRequest, TranslationResult};
use crate::views::{self, FormValues, Outcome};

/// Room for multipart framing and the language fields on top of the file itself.
/// Files between the limit and this margin reach the orchestrator and get a
/// proper "too large" message.
const UPLOAD_OVERHEAD: usize = 1024 * 1024;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config.limits.max_document_bytes + UPLOAD_OVERHEAD;

    Router::new()
        // Pages
        .route("/", get(home))
        .route("/article", get(article_form).post(translate_article_form))
        .route("/document", get(document_form).post(translate_document_form))

        // Programmatic API
        .route("/api/health", get(health_check))
        .route("/api/article", post(translate_article_api))
        .route("/api/document", post(translate_document_api))
        .layer(DefaultBodyLimit::max(upload_limit))
}

/// Full application router with middleware and state attached
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
}

#[derive(Debug, Default)]
struct DocumentUpload {
    file: Option<(String, Vec<u8>)>,
    source_language: Option<String>,
    target_language: Option<String>,
}

fn parse_language(value: Option<&str>) -> TranslateResult<Option<Language>> {
    Language::parse_optional(value).map_err(|e| TranslateError::input(e.to_string()))
}

fn form_values(url: &str, source: Option<&str>, target: Option<&str>) -> FormValues {
    FormValues {
        url: url.to_string(),
        source_language: Language::parse_optional(source).ok().flatten(),
        target_language: Language::parse_optional(target).ok().flatten(),
    }
}

fn article_request(form: &ArticleForm) -> TranslateResult<TranslationRequest> {
    let source = parse_language(form.source_language.as_deref())?;
    let target = parse_language(form.target_language.as_deref())?;
    Ok(TranslationRequest::url(form.url.trim(), target).with_source_language(source))
}

fn document_request(upload: DocumentUpload) -> TranslateResult<TranslationRequest> {
    let source = parse_language(upload.source_language.as_deref())?;
    let target = parse_language(upload.target_language.as_deref())?;
    let (name, bytes) = upload
        .file
        .ok_or_else(|| TranslateError::input("please upload a Word file"))?;
    Ok(TranslationRequest::file(name, bytes, target).with_source_language(source))
}

fn upload_error(error: MultipartError, max_bytes: usize) -> TranslateError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TranslateError::UploadTooLarge { limit: max_bytes }
    } else {
        TranslateError::input(format!("could not read the upload: {}", error.body_text()))
    }
}

fn accept_multipart(
    multipart: Result<Multipart, MultipartRejection>,
) -> TranslateResult<Multipart> {
    multipart.map_err(|rejection| {
        TranslateError::input(format!("invalid upload: {}", rejection.body_text()))
    })
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> TranslateResult<DocumentUpload> {
    let mut multipart = accept_multipart(multipart)?;
    let unreadable = |e: MultipartError| upload_error(e, max_bytes);

    let mut upload = DocumentUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(unreadable)?;
                // Browsers send an empty part when no file was chosen
                if !name.is_empty() || !bytes.is_empty() {
                    upload.file = Some((name, bytes.to_vec()));
                }
            }
            Some("source_language") => {
                upload.source_language = Some(field.text().await.map_err(unreadable)?);
            }
            Some("target_language") => {
                upload.target_language = Some(field.text().await.map_err(unreadable)?);
            }
            _ => {}
        }
    }
    Ok(upload)
}

fn download_response(result: TranslationResult) -> Response {
    let headers = [
        (header::CONTENT_TYPE, result.output_format.mime_type().to_string()),
        (header::CONTENT_DISPOSITION, result.content_disposition()),
    ];
    (headers, result.into_bytes()).into_response()
}

async fn home() -> Html<String> {
    Html(views::home_page())
}

async fn article_form() -> Html<String> {
    Html(views::article_page(&FormValues::default(), Outcome::Empty))
}

async fn document_form(State(state): State<AppState>) -> Html<String> {
    Html(views::document_page(
        &FormValues::default(),
        state.documents.max_bytes(),
        Outcome::Empty,
    ))
}

async fn translate_article_form(
    State(state): State<AppState>,
    form: Result<Form<ArticleForm>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            let e = TranslateError::input(format!("invalid form submission: {}", rejection.body_text()));
            warn!("Article form rejected: {}", e);
            let page = views::article_page(&FormValues::default(), Outcome::Failed(&e));
            return (e.status_code(), Html(page));
        }
    };

    let values = form_values(
        &form.url,
        form.source_language.as_deref(),
        form.target_language.as_deref(),
    );

    let outcome = match article_request(&form) {
        Ok(request) => state.articles.translate(&request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Html(views::article_page(&values, Outcome::Translated(&result))),
        ),
        Err(e) => {
            warn!("Article translation failed: {}", e);
            (
                e.status_code(),
                Html(views::article_page(&values, Outcome::Failed(&e))),
            )
        }
    }
}

async fn translate_document_form(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Html<String>) {
    let max_bytes = state.documents.max_bytes();
    let upload = match read_upload(multipart, max_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Document upload failed: {}", e);
            let page = views::document_page(&FormValues::default(), max_bytes, Outcome::Failed(&e));
            return (e.status_code(), Html(page));
        }
    };

    let values = form_values(
        "",
        upload.source_language.as_deref(),
        upload.target_language.as_deref(),
    );
    let outcome = match document_request(upload) {
        Ok(request) => state.documents.translate(request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Html(views::document_page(&values, max_bytes, Outcome::Translated(&result))),
        ),
        Err(e) => {
            warn!("Document translation failed: {}", e);
            (
                e.status_code(),
                Html(views::document_page(&values, max_bytes, Outcome::Failed(&e))),
            )
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn translate_article_api(
    State(state): State<AppState>,
    payload: Result<Json<ArticleForm>, JsonRejection>,
) -> Result<Response, TranslateError> {
    let Json(form) = payload.map_err(|rejection| {
        TranslateError::input(format!("invalid request body: {}", rejection.body_text()))
    })?;
    let request = article_request(&form)?;
    let result = state.articles.translate(&request).await?;
    info!("Serving {} via API", result.file_name);
    Ok(download_response(result))
}

async fn translate_document_api(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, TranslateError> {
    let upload = read_upload(multipart, state.documents.max_bytes()).await?;
    let result = state.documents.translate(document_request(upload)?).await?;
    info!("Serving {} via API", result.file_name);
    Ok(download_response(result))
}
