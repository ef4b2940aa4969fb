use std::sync::Arc;

use axum::{
    Form, Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use html_escape::encode_double_quoted_attribute;
use serde::Deserialize;
use serde_json::{Value, json};
use spoiler_core::{JobQueue, JobSpec, TargetDuration, TaskRegistry};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const DOWNLOAD_NAME: &str = "spoiler_video.mp4";

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub registry: TaskRegistry,
    pub http: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/process", post(process))
        .route("/status/{task_id}", get(status))
        .route("/download", get(download))
        .route("/result", get(result))
        .route("/health", get(health))
        .with_state(state)
}

/// Build a job from raw form pairs. `genre` may repeat.
pub fn parse_process_form(fields: &[(String, String)]) -> ApiResult<JobSpec> {
    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
    };
    let required = |name: &str| {
        field(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("Missing field: {name}")))
    };

    let video_url = required("video_url")?.to_string();
    let title = required("title")?.to_string();
    let duration: f64 = required("duration")?
        .parse()
        .map_err(|_| ApiError::bad_request("duration must be a number"))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ApiError::bad_request("duration must be positive"));
    }

    let target = match field("durationType").unwrap_or("seconds") {
        "seconds" | "" => TargetDuration::seconds(duration),
        "percentage" if duration <= 100.0 => TargetDuration::percentage(duration),
        "percentage" => return Err(ApiError::bad_request("percentage must not exceed 100")),
        other => {
            return Err(ApiError::bad_request(format!(
                "Unknown durationType: {other}"
            )));
        }
    };

    let genres: Vec<String> = fields
        .iter()
        .filter(|(k, v)| k == "genre" && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .collect();

    Ok(JobSpec {
        video_url,
        title,
        genres: JobSpec::resolve_genres(genres, field("otherGenre")),
        target,
    })
}

async fn process(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let spec = parse_process_form(&fields)?;
    let video_url = spec.video_url.clone();
    let task_id = state.queue.submit(spec)?;
    info!("Accepted {video_url} as task {task_id}");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Video accepted. Processing started.",
            "task_id": task_id,
        })),
    ))
}

async fn status(State(state): State<AppState>, Path(task_id): Path<String>) -> Json<Value> {
    let snapshot = Uuid::parse_str(&task_id)
        .ok()
        .and_then(|id| state.registry.get(&id));
    match snapshot {
        Some(snapshot) => Json(json!(snapshot)),
        None => Json(json!({ "status": "not_found" })),
    }
}

#[derive(Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    stream_url: String,
}

async fn download(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Response> {
    let fetch = async {
        let resp = state
            .http
            .get(&query.stream_url)
            .send()
            .await?
            .error_for_status()?;
        resp.bytes().await
    };
    let bytes = fetch.await.map_err(|e| {
        warn!("Failed to download {}: {e}", query.stream_url);
        ApiError::Upstream("Failed to download video".to_string())
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{DOWNLOAD_NAME}\""),
        )
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Upstream(format!("Failed to build response: {e}")))
}

async fn result(Query(query): Query<StreamQuery>) -> Html<String> {
    Html(result_page(&query.stream_url))
}

pub fn result_page(stream_url: &str) -> String {
    let url = encode_double_quoted_attribute(stream_url);
    let href = format!("/download?stream_url={stream_url}");
    let query = encode_double_quoted_attribute(&href);
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Spoiler</title></head>\n<body>\n\
         <video controls src=\"{url}\" style=\"max-width:100%\"></video>\n\
         <p><a href=\"{query}\">Download</a></p>\n</body>\n</html>\n"
    )
}

const GENRES: [&str; 9] = [
    "Action",
    "Comedy",
    "Drama",
    "Horror",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "Documentary",
    "Other",
];

/// Submission form for `/process`.
pub fn index_page() -> String {
    let genres: String = GENRES
        .iter()
        .map(|g| {
            format!("<label><input type=\"checkbox\" name=\"genre\" value=\"{g}\"> {g}</label>\n")
        })
        .collect();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Spoiler</title></head>\n<body>\n\
         <form method=\"post\" action=\"/process\">\n\
         <p><input type=\"url\" name=\"video_url\" placeholder=\"Video URL\" required></p>\n\
         <p><input type=\"text\" name=\"title\" placeholder=\"Title\" required></p>\n\
         <fieldset>\n{genres}<input type=\"text\" name=\"otherGenre\" placeholder=\"Other genre\">\n</fieldset>\n\
         <p><input type=\"number\" name=\"duration\" min=\"1\" required>\n\
         <select name=\"durationType\">\n\
         <option value=\"seconds\">seconds</option>\n\
         <option value=\"percentage\">percentage</option>\n\
         </select></p>\n\
         <p><button type=\"submit\">Create spoiler</button></p>\n\
         </form>\n</body>\n</html>\n"
    )
}

async fn index() -> Html<String> {
    Html(index_page())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
