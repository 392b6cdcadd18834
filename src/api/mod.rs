use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;

use crate::core::{
    LedgerRow, LoanError, LoanParameters, PrepaymentEntry, PrepaymentMode, ScheduleSummary,
    apply_prepayments, check_annual_rate, check_prepayment, check_principal, check_tenure_years,
    coerce_prepayment, generate_schedule, parse_annual_rate, parse_prepayment_list,
    parse_principal, parse_tenure_years, summarize,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPrepaymentMode {
    #[serde(alias = "carryForward", alias = "carry_forward", alias = "carry")]
    CarryForward,
    #[serde(alias = "reamortise", alias = "recalculate")]
    Reamortize,
}

impl From<ApiPrepaymentMode> for PrepaymentMode {
    fn from(value: ApiPrepaymentMode) -> Self {
        match value {
            ApiPrepaymentMode::CarryForward => PrepaymentMode::CarryForward,
            ApiPrepaymentMode::Reamortize => PrepaymentMode::Reamortize,
        }
    }
}

/// A form field as the page sends it: either a JSON number or the raw input text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepaymentPayload {
    month: u32,
    #[serde(default)]
    amount: Option<FieldValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SchedulePayload {
    principal: Option<FieldValue>,
    annual_rate: Option<FieldValue>,
    tenure_years: Option<FieldValue>,
    mode: Option<ApiPrepaymentMode>,
    prepayments: Vec<PrepaymentPayload>,
    /// Query-string form of `prepayments`: `3=5000,12=250`.
    prepay: Option<String>,
}

#[derive(Debug)]
struct ApiRequest {
    parameters: LoanParameters,
    mode: PrepaymentMode,
    prepayments: Vec<PrepaymentEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleResponse<'a> {
    parameters: LoanParameters,
    emi: f64,
    mode: PrepaymentMode,
    summary: ScheduleSummary,
    rows: &'a [LedgerRow],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(bind: IpAddr, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::new(bind, port);
    let listener = TcpListener::bind(addr).await?;
    info!("Home loan calculator listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn schedule_get_handler(Query(payload): Query<SchedulePayload>) -> Response {
    schedule_handler_impl(payload).await
}

async fn schedule_post_handler(Json(payload): Json<SchedulePayload>) -> Response {
    schedule_handler_impl(payload).await
}

async fn schedule_handler_impl(payload: SchedulePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejected schedule request: {err}");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let mut schedule = match generate_schedule(&request.parameters) {
        Ok(schedule) => schedule.with_mode(request.mode),
        Err(err) => {
            warn!("schedule generation failed: {err}");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };
    if let Err(err) = apply_prepayments(&mut schedule, &request.prepayments) {
        warn!("rejected prepayment: {err}");
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    let response = ScheduleResponse {
        parameters: request.parameters,
        emi: schedule.emi(),
        mode: schedule.mode(),
        summary: summarize(&schedule),
        rows: schedule.rows(),
    };
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, LoanError> {
    let payload = serde_json::from_str::<SchedulePayload>(json)?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SchedulePayload) -> Result<ApiRequest, LoanError> {
    let principal = match payload.principal {
        Some(FieldValue::Number(v)) => check_principal(v)?,
        Some(FieldValue::Text(raw)) => parse_principal(&raw)?,
        None => return Err(LoanError::invalid("principal", "is required")),
    };
    let annual_rate = match payload.annual_rate {
        Some(FieldValue::Number(v)) => check_annual_rate(v)?,
        Some(FieldValue::Text(raw)) => parse_annual_rate(&raw)?,
        None => return Err(LoanError::invalid("annual rate", "is required")),
    };
    let tenure_years = match payload.tenure_years {
        Some(FieldValue::Number(v)) => check_tenure_years(v)?,
        Some(FieldValue::Text(raw)) => parse_tenure_years(&raw)?,
        None => return Err(LoanError::invalid("tenure", "is required")),
    };

    let mut prepayments = payload
        .prepayments
        .into_iter()
        .map(|entry| {
            let amount = match entry.amount {
                Some(FieldValue::Number(v)) => check_prepayment(v)?,
                Some(FieldValue::Text(raw)) => coerce_prepayment(&raw)?,
                None => 0.0,
            };
            Ok(PrepaymentEntry {
                month: entry.month,
                amount,
            })
        })
        .collect::<Result<Vec<_>, LoanError>>()?;
    if let Some(raw) = payload.prepay.as_deref() {
        prepayments.extend(parse_prepayment_list(raw)?);
    }

    Ok(ApiRequest {
        parameters: LoanParameters::new(principal, annual_rate, tenure_years)?,
        mode: payload.mode.map(Into::into).unwrap_or_default(),
        prepayments,
    })
}
