use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    AssetWeight, BuyVsRentInputs, ConfidenceLevel, DEFAULT_BUCKETS, DEFAULT_SIMULATIONS,
    Distribution, DownPaymentInputs, FireInputs, LoanInputs, LoanType, MAX_AGE, MAX_LOAN_MONTHS,
    PortfolioMix, SeededRng, amortize, calc_var, compute_fire, finite_or_zero, model_buy_vs_rent,
    project_down_payment, sample_distribution_with,
};
use crate::error::{CalcError, CalcResult};

/// Upper bound on histogram draws accepted over HTTP.
const MAX_SIMULATIONS: u32 = 100_000;
const MAX_BUCKETS: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VarPayload {
    assets: Vec<AssetWeight>,
    horizon_days: Option<f64>,
    confidence: Option<f64>,
    portfolio_value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DistributionPayload {
    assets: Vec<AssetWeight>,
    horizon_days: Option<f64>,
    seed: Option<u64>,
    buckets: Option<usize>,
    simulations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoanPayload {
    amount: Option<f64>,
    months: Option<f64>,
    annual_rate: Option<f64>,
    loan_type: Option<LoanType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BuyVsRentPayload {
    home_price: Option<f64>,
    monthly_rent: Option<f64>,
    appreciation_rate: Option<f64>,
    maintenance_rate: Option<f64>,
    investment_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DownPaymentPayload {
    property_cost: Option<f64>,
    desired_ltv: Option<f64>,
    monthly_savings: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FirePayload {
    annual_expenses: Option<f64>,
    inflation_rate: Option<f64>,
    expected_return: Option<f64>,
    terminal_age: Option<f64>,
    current_age: Option<f64>,
    swr: Option<f64>,
    reinvestment: Option<f64>,
}

#[derive(Debug)]
struct VarRequest {
    mix: PortfolioMix,
    horizon_days: u32,
    confidence: ConfidenceLevel,
    portfolio_value: f64,
}

#[derive(Debug)]
struct DistributionRequest {
    mix: PortfolioMix,
    horizon_days: u32,
    seed: Option<u64>,
    buckets: usize,
    simulations: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/var", post(var_handler))
        .route("/api/distribution", post(distribution_handler))
        .route("/api/loan", get(loan_get_handler).post(loan_post_handler))
        .route(
            "/api/buy-vs-rent",
            get(buy_vs_rent_get_handler).post(buy_vs_rent_post_handler),
        )
        .route(
            "/api/down-payment",
            get(down_payment_get_handler).post(down_payment_post_handler),
        )
        .route("/api/fire", get(fire_get_handler).post(fire_post_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("fincalc HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/");

    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn var_handler(Json(payload): Json<VarPayload>) -> Response {
    let request = match var_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    debug!(
        assets = request.mix.assets.len(),
        horizon_days = request.horizon_days,
        confidence = request.confidence.as_fraction(),
        "var request"
    );
    let result = calc_var(
        &request.mix,
        request.horizon_days,
        request.confidence,
        request.portfolio_value,
    );
    json_response(StatusCode::OK, result)
}

async fn distribution_handler(Json(payload): Json<DistributionPayload>) -> Response {
    let request = match distribution_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    debug!(
        horizon_days = request.horizon_days,
        seeded = request.seed.is_some(),
        "distribution request"
    );
    let distribution = run_distribution(&request);
    debug!(
        simulations = distribution.stats().simulations,
        "distribution sampled"
    );
    json_response(StatusCode::OK, distribution)
}

async fn loan_get_handler(Query(payload): Query<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

async fn loan_post_handler(Json(payload): Json<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

fn loan_handler_impl(payload: LoanPayload) -> Response {
    let inputs = match loan_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    debug!(?inputs, "loan request");
    json_response(StatusCode::OK, amortize(&inputs))
}

async fn buy_vs_rent_get_handler(Query(payload): Query<BuyVsRentPayload>) -> Response {
    buy_vs_rent_handler_impl(payload)
}

async fn buy_vs_rent_post_handler(Json(payload): Json<BuyVsRentPayload>) -> Response {
    buy_vs_rent_handler_impl(payload)
}

fn buy_vs_rent_handler_impl(payload: BuyVsRentPayload) -> Response {
    let inputs = buy_vs_rent_inputs_from_payload(payload);
    debug!(?inputs, "buy-vs-rent request");
    json_response(StatusCode::OK, model_buy_vs_rent(&inputs))
}

async fn down_payment_get_handler(Query(payload): Query<DownPaymentPayload>) -> Response {
    down_payment_handler_impl(payload)
}

async fn down_payment_post_handler(Json(payload): Json<DownPaymentPayload>) -> Response {
    down_payment_handler_impl(payload)
}

fn down_payment_handler_impl(payload: DownPaymentPayload) -> Response {
    let inputs = down_payment_inputs_from_payload(payload);
    debug!(?inputs, "down payment request");
    json_response(StatusCode::OK, project_down_payment(&inputs))
}

async fn fire_get_handler(Query(payload): Query<FirePayload>) -> Response {
    fire_handler_impl(payload)
}

async fn fire_post_handler(Json(payload): Json<FirePayload>) -> Response {
    fire_handler_impl(payload)
}

fn fire_handler_impl(payload: FirePayload) -> Response {
    let inputs = match fire_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    debug!(?inputs, "fire request");
    json_response(StatusCode::OK, compute_fire(&inputs))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Missing or malformed counts become 0; fractional values are truncated.
fn whole_number(value: Option<f64>) -> u32 {
    let v = finite_or_zero(value.unwrap_or(0.0));
    if v <= 0.0 {
        0
    } else {
        v.min(u32::MAX as f64).floor() as u32
    }
}

fn number(value: Option<f64>) -> f64 {
    finite_or_zero(value.unwrap_or(0.0))
}

fn var_request_from_payload(payload: VarPayload) -> CalcResult<VarRequest> {
    let confidence = ConfidenceLevel::try_from(payload.confidence.unwrap_or(0.95))?;
    Ok(VarRequest {
        mix: PortfolioMix::new(payload.assets),
        horizon_days: whole_number(payload.horizon_days),
        confidence,
        portfolio_value: number(payload.portfolio_value),
    })
}

fn distribution_request_from_payload(
    payload: DistributionPayload,
) -> CalcResult<DistributionRequest> {
    let buckets = payload.buckets.unwrap_or(DEFAULT_BUCKETS);
    let simulations = payload.simulations.unwrap_or(DEFAULT_SIMULATIONS);
    if simulations > MAX_SIMULATIONS {
        return Err(CalcError::InvalidPayload(format!(
            "simulations must be <= {MAX_SIMULATIONS}"
        )));
    }
    if buckets > MAX_BUCKETS {
        return Err(CalcError::InvalidPayload(format!(
            "buckets must be <= {MAX_BUCKETS}"
        )));
    }

    Ok(DistributionRequest {
        mix: PortfolioMix::new(payload.assets),
        horizon_days: whole_number(payload.horizon_days),
        seed: payload.seed,
        buckets,
        simulations,
    })
}

fn run_distribution(request: &DistributionRequest) -> Distribution {
    let mut rng = match request.seed {
        Some(seed) => SeededRng::new(seed),
        None => SeededRng::from_time(),
    };
    sample_distribution_with(
        &request.mix,
        request.horizon_days,
        request.buckets,
        request.simulations,
        &mut rng,
    )
}

fn loan_inputs_from_payload(payload: LoanPayload) -> CalcResult<LoanInputs> {
    let months = whole_number(payload.months);
    if months > MAX_LOAN_MONTHS {
        return Err(CalcError::InvalidPayload(format!(
            "months must be <= {MAX_LOAN_MONTHS}"
        )));
    }

    Ok(LoanInputs {
        amount: number(payload.amount),
        months,
        annual_rate: number(payload.annual_rate),
        loan_type: payload.loan_type.unwrap_or(LoanType::Emi),
    })
}

fn buy_vs_rent_inputs_from_payload(payload: BuyVsRentPayload) -> BuyVsRentInputs {
    BuyVsRentInputs {
        home_price: number(payload.home_price),
        monthly_rent: number(payload.monthly_rent),
        appreciation_rate: number(payload.appreciation_rate),
        maintenance_rate: number(payload.maintenance_rate),
        investment_return: number(payload.investment_return),
    }
}

fn down_payment_inputs_from_payload(payload: DownPaymentPayload) -> DownPaymentInputs {
    DownPaymentInputs {
        property_cost: number(payload.property_cost),
        desired_ltv: number(payload.desired_ltv),
        monthly_savings: number(payload.monthly_savings),
    }
}

fn fire_inputs_from_payload(payload: FirePayload) -> CalcResult<FireInputs> {
    let terminal_age = whole_number(payload.terminal_age);
    let current_age = whole_number(payload.current_age);
    if terminal_age > MAX_AGE || current_age > MAX_AGE {
        return Err(CalcError::InvalidPayload(format!(
            "ages must be <= {MAX_AGE}"
        )));
    }

    Ok(FireInputs {
        annual_expenses: number(payload.annual_expenses),
        inflation_rate: number(payload.inflation_rate),
        expected_return: number(payload.expected_return),
        terminal_age,
        current_age,
        swr: number(payload.swr),
        reinvestment: number(payload.reinvestment),
    })
}
