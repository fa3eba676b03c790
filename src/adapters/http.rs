use crate::core::service::RegService;
use crate::core::token::AUTH_HEADER;
use crate::domain::model::{Credentials, EvaluationYear};
use crate::domain::ports::{Directory, EvaluationStore};
use crate::utils::error::{ErrorCategory, RegError};
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;

pub const AUTH_PATH: &str = "/auth";
pub const EVAL_PATH: &str = "/eval";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn router<D, S>(service: Arc<RegService<D, S>>) -> Router
where
    D: Directory + 'static,
    S: EvaluationStore + 'static,
{
    router_with_timeout(service, DEFAULT_REQUEST_TIMEOUT)
}

/// 每個請求（含讀取主體與整條解析鏈）都受 `request_timeout` 限制，逾時回 408
pub fn router_with_timeout<D, S>(service: Arc<RegService<D, S>>, request_timeout: Duration) -> Router
where
    D: Directory + 'static,
    S: EvaluationStore + 'static,
{
    Router::new()
        .route(AUTH_PATH, post(auth_handler::<D, S>))
        .route(EVAL_PATH, get(evaluations_handler::<D, S>))
        .route("/", get(doc_handler))
        .with_state(service)
        .layer(middleware::from_fn_with_state(request_timeout, limit_request_time))
}

async fn limit_request_time(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("⚠️ Request to {} timed out after {:?}", path, limit);
            (StatusCode::REQUEST_TIMEOUT, "request timed out").into_response()
        }
    }
}

/// 錯誤回應：狀態碼由錯誤種類決定，內容為純文字
pub struct ApiError(RegError);

impl From<RegError> for ApiError {
    fn from(error: RegError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        match self.0.category() {
            ErrorCategory::Authentication | ErrorCategory::Identity => {
                tracing::warn!("⚠️ {} ({})", self.0, status)
            }
            _ => {
                tracing::error!("❌ {} ({})", self.0, status);
                tracing::error!("💡 Recovery suggestion: {}", self.0.recovery_suggestion());
            }
        }
        (status, self.0.user_friendly_message()).into_response()
    }
}

pub fn status_for(error: &RegError) -> StatusCode {
    match error {
        RegError::AuthenticationFailure { .. } | RegError::DecodeFailure(_) => {
            StatusCode::UNAUTHORIZED
        }
        RegError::MissingIdentificationAttribute { .. } | RegError::DirectoryEntryNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        RegError::Directory(_) | RegError::Http(_) | RegError::Api { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn auth_handler<D, S>(State(service): State<Arc<RegService<D, S>>>, body: Bytes) -> Response
where
    D: Directory + 'static,
    S: EvaluationStore + 'static,
{
    // 不檢查 Content-Type，主體一律當 JSON 解析
    let credentials: Credentials = match serde_json::from_slice(&body) {
        Ok(credentials) => credentials,
        Err(e) => {
            let reason = credentials_body_error(&e);
            tracing::warn!("⚠️ Rejected credentials body: {}", reason);
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    };

    match service.authenticate(&credentials).await {
        Ok(token) => (StatusCode::OK, token).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// serde_json 的錯誤訊息會引用出錯的值（可能就是密碼），只回報種類與位置
fn credentials_body_error(error: &serde_json::Error) -> String {
    format!(
        "invalid credentials body ({:?} error at line {} column {})",
        error.classify(),
        error.line(),
        error.column()
    )
}

async fn evaluations_handler<D, S>(
    State(service): State<Arc<RegService<D, S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<EvaluationYear>>, ApiError>
where
    D: Directory + 'static,
    S: EvaluationStore + 'static,
{
    let report = service.evaluations(&headers).await?;
    Ok(Json(report))
}

async fn doc_handler() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>regapi</title></head>
<body>
<h1>regapi</h1>
<h2>POST {auth}</h2>
<p>Body: <code>{{"User": "...", "Pass": "..."}}</code>. Responds with a token as plain text.</p>
<h2>GET {eval}</h2>
<p>Send the token in the <code>{header}</code> header. Responds with the evaluation report:</p>
<pre>[{{"year": "...", "periods": [{{"period": "...", "evs": [{{"subject": "...", "eval": "..."}}]}}]}}]</pre>
<p>Errors are returned as plain text with a non-200 status.</p>
</body>
</html>
"#,
        auth = AUTH_PATH,
        eval = EVAL_PATH,
        header = AUTH_HEADER,
    ))
}
