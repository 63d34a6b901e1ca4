pub mod cli;

use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    Clock, DecumulationAssumptions, FinancialSnapshot, FireProjection, MARKET_WEATHER,
    MAX_PROJECTION_YEARS, MarketWeather, MarketWeatherRegime, ProjectionSettings,
    ResilienceCalibration, ResilienceScore, ScenarioPath, SystemClock, WithdrawalResult,
    WithdrawalStrategy, compute_fire_projection, compute_resilience_score, compute_scenarios,
    compute_withdrawal, fire_target, format_fire_age, parse_birth_date,
};
pub use cli::{Cli, Command, PlanArgs, run};

const MAX_AGE: u32 = 120;

/// Every field is optional; missing ones keep the CLI defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    total_assets: Option<f64>,
    total_debts: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    monthly_contributions: Option<f64>,
    yearly_must_expenses: Option<f64>,
    cash_assets: Option<f64>,
    date_of_birth: Option<String>,

    years: Option<u32>,
    market_weather: Option<String>,
    annual_return: Option<f64>,
    safe_withdrawal_rate: Option<f64>,
    fallback_age: Option<f64>,

    starting_portfolio: Option<f64>,
    retirement_age: Option<u32>,
    target_age: Option<u32>,
    strategy: Option<String>,
    yearly_expenses: Option<f64>,
    inflation_rate: Option<f64>,
    index_to_inflation: Option<bool>,
    withdrawal_rate: Option<f64>,
    portfolio_return: Option<f64>,
    aow_age: Option<u32>,
    aow_monthly: Option<f64>,

    emergency_full_months: Option<f64>,
    diversification_full_share: Option<f64>,
    debt_ratio_zero_score: Option<f64>,
    savings_rate_full: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub starting_portfolio: f64,
    pub retirement_age: Option<u32>,
    pub target_age: u32,
    pub strategy: WithdrawalStrategy,
    pub yearly_expenses: f64,
}

/// Validated engine inputs for one call.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub snapshot: FinancialSnapshot,
    pub years: u32,
    pub settings: ProjectionSettings,
    pub calibration: ResilienceCalibration,
    pub assumptions: DecumulationAssumptions,
    pub withdrawal: WithdrawalRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenariosResponse {
    pub market_weather: MarketWeather,
    pub fire_target: Option<f64>,
    pub scenarios: Vec<ScenarioPath>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireResponse {
    #[serde(flatten)]
    pub projection: FireProjection,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    pub retirement_age: u32,
    pub target_age: u32,
    #[serde(flatten)]
    pub result: WithdrawalResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantsResponse {
    pub aow_age: u32,
    pub aow_monthly: f64,
    pub market_weather: &'static [MarketWeatherRegime],
    pub strategies: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn require_finite(name: &str, value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("--{name} must be a finite number"))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<f64, String> {
    let value = require_finite(name, value)?;
    if value < 0.0 {
        return Err(format!("--{name} must be >= 0"));
    }
    Ok(value)
}

fn require_positive(name: &str, value: f64) -> Result<f64, String> {
    let value = require_finite(name, value)?;
    if value <= 0.0 {
        return Err(format!("--{name} must be > 0"));
    }
    Ok(value)
}

fn require_rate(name: &str, percent: f64) -> Result<f64, String> {
    let percent = require_finite(name, percent)?;
    if percent <= -100.0 {
        return Err(format!("--{name} must be > -100"));
    }
    Ok(percent / 100.0)
}

pub fn build_request(args: &PlanArgs, today: NaiveDate) -> Result<PlanRequest, String> {
    let date_of_birth = args
        .date_of_birth
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(parse_birth_date)
        .transpose()
        .map_err(|e| e.to_string())?;

    let cash_assets = args
        .cash_assets
        .map(|v| require_non_negative("cash-assets", v))
        .transpose()?;

    let snapshot = FinancialSnapshot {
        total_assets: require_non_negative("total-assets", args.total_assets)?,
        total_debts: require_non_negative("total-debts", args.total_debts)?,
        monthly_income: require_non_negative("monthly-income", args.monthly_income)?,
        monthly_expenses: require_non_negative("monthly-expenses", args.monthly_expenses)?,
        monthly_contributions: require_non_negative(
            "monthly-contributions",
            args.monthly_contributions,
        )?,
        yearly_must_expenses: require_non_negative(
            "yearly-must-expenses",
            args.yearly_must_expenses,
        )?,
        cash_assets,
        date_of_birth,
    };

    if let Some(cash) = snapshot.cash_assets {
        if cash > snapshot.total_assets {
            return Err("--cash-assets cannot exceed --total-assets".to_string());
        }
    }

    if args.years == 0 || args.years > MAX_PROJECTION_YEARS {
        return Err(format!("--years must be between 1 and {MAX_PROJECTION_YEARS}"));
    }

    let market_weather = args
        .market_weather
        .parse::<MarketWeather>()
        .map_err(|e| e.to_string())?;

    let fallback_age = require_non_negative("fallback-age", args.fallback_age)?;
    if fallback_age > MAX_AGE as f64 {
        return Err(format!("--fallback-age must be <= {MAX_AGE}"));
    }

    let settings = ProjectionSettings {
        base_annual_return: require_rate("annual-return", args.annual_return)?,
        market_weather,
        safe_withdrawal_rate: require_positive("safe-withdrawal-rate", args.safe_withdrawal_rate)?
            / 100.0,
        fallback_age,
        as_of: today,
    };

    let calibration = ResilienceCalibration {
        emergency_full_months: require_positive(
            "emergency-full-months",
            args.emergency_full_months,
        )?,
        diversification_full_share: require_positive(
            "diversification-full-share",
            args.diversification_full_share,
        )? / 100.0,
        debt_ratio_zero_score: require_positive(
            "debt-ratio-zero-score",
            args.debt_ratio_zero_score,
        )? / 100.0,
        savings_rate_full: require_positive("savings-rate-full", args.savings_rate_full)? / 100.0,
    };

    let strategy = args
        .strategy
        .parse::<WithdrawalStrategy>()
        .map_err(|e| e.to_string())?;

    if let Some(age) = args.retirement_age {
        if age > MAX_AGE {
            return Err(format!("--retirement-age must be <= {MAX_AGE}"));
        }
    }
    if args.target_age > MAX_AGE {
        return Err(format!("--target-age must be <= {MAX_AGE}"));
    }
    if args.aow_age > MAX_AGE {
        return Err(format!("--aow-age must be <= {MAX_AGE}"));
    }

    let assumptions = DecumulationAssumptions {
        inflation_rate: require_rate("inflation-rate", args.inflation_rate)?,
        index_to_inflation: !args.no_inflation_index,
        withdrawal_rate: require_non_negative("withdrawal-rate", args.withdrawal_rate)? / 100.0,
        portfolio_return: require_rate("portfolio-return", args.portfolio_return)?,
        aow_age: args.aow_age,
        aow_monthly: require_non_negative("aow-monthly", args.aow_monthly)?,
        ..DecumulationAssumptions::default()
    };

    let starting_portfolio = match args.starting_portfolio {
        Some(v) => require_finite("starting-portfolio", v)?,
        None => snapshot.net_worth().max(0.0),
    };
    let yearly_expenses = match args.yearly_expenses {
        Some(v) => require_non_negative("yearly-expenses", v)?,
        None => snapshot.monthly_expenses * 12.0,
    };

    Ok(PlanRequest {
        snapshot,
        years: args.years,
        settings,
        calibration,
        assumptions,
        withdrawal: WithdrawalRequest {
            starting_portfolio,
            retirement_age: args.retirement_age,
            target_age: args.target_age,
            strategy,
            yearly_expenses,
        },
    })
}

fn args_from_payload(payload: PlanPayload) -> PlanArgs {
    let mut args = PlanArgs::default();

    if let Some(v) = payload.total_assets {
        args.total_assets = v;
    }
    if let Some(v) = payload.total_debts {
        args.total_debts = v;
    }
    if let Some(v) = payload.monthly_income {
        args.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        args.monthly_expenses = v;
    }
    if let Some(v) = payload.monthly_contributions {
        args.monthly_contributions = v;
    }
    if let Some(v) = payload.yearly_must_expenses {
        args.yearly_must_expenses = v;
    }
    args.cash_assets = payload.cash_assets;
    args.date_of_birth = payload.date_of_birth;

    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.market_weather {
        args.market_weather = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.safe_withdrawal_rate {
        args.safe_withdrawal_rate = v;
    }
    if let Some(v) = payload.fallback_age {
        args.fallback_age = v;
    }

    args.starting_portfolio = payload.starting_portfolio;
    args.retirement_age = payload.retirement_age;
    if let Some(v) = payload.target_age {
        args.target_age = v;
    }
    if let Some(v) = payload.strategy {
        args.strategy = v;
    }
    args.yearly_expenses = payload.yearly_expenses;
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.index_to_inflation {
        args.no_inflation_index = !v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }
    if let Some(v) = payload.portfolio_return {
        args.portfolio_return = v;
    }
    if let Some(v) = payload.aow_age {
        args.aow_age = v;
    }
    if let Some(v) = payload.aow_monthly {
        args.aow_monthly = v;
    }

    if let Some(v) = payload.emergency_full_months {
        args.emergency_full_months = v;
    }
    if let Some(v) = payload.diversification_full_share {
        args.diversification_full_share = v;
    }
    if let Some(v) = payload.debt_ratio_zero_score {
        args.debt_ratio_zero_score = v;
    }
    if let Some(v) = payload.savings_rate_full {
        args.savings_rate_full = v;
    }

    args
}

pub fn scenarios_response(request: &PlanRequest) -> ScenariosResponse {
    ScenariosResponse {
        market_weather: request.settings.market_weather,
        fire_target: fire_target(
            request.snapshot.monthly_expenses,
            request.settings.safe_withdrawal_rate,
        ),
        scenarios: compute_scenarios(&request.snapshot, request.years, &request.settings),
    }
}

pub fn fire_response(request: &PlanRequest) -> FireResponse {
    let projection = compute_fire_projection(&request.snapshot, &request.settings);
    FireResponse {
        label: format_fire_age(projection.fire_age),
        projection,
    }
}

pub fn resilience_response(request: &PlanRequest) -> ResilienceScore {
    compute_resilience_score(&request.snapshot, &request.calibration)
}

/// Without an explicit retirement age the projected FIRE age (rounded up) is
/// used, falling back to the AOW age when FIRE is never reached.
pub fn default_retirement_age(request: &PlanRequest) -> u32 {
    compute_fire_projection(&request.snapshot, &request.settings)
        .fire_age
        .map(|age| age.ceil() as u32)
        .unwrap_or(request.assumptions.aow_age)
}

pub fn withdrawal_response(request: &PlanRequest) -> WithdrawalResponse {
    let w = &request.withdrawal;
    let retirement_age = w
        .retirement_age
        .unwrap_or_else(|| default_retirement_age(request));
    let result = compute_withdrawal(
        w.starting_portfolio,
        retirement_age,
        w.target_age,
        w.strategy,
        w.yearly_expenses,
        &request.assumptions,
    );
    WithdrawalResponse {
        retirement_age,
        target_age: w.target_age,
        result,
    }
}

pub fn constants_response() -> ConstantsResponse {
    let assumptions = DecumulationAssumptions::default();
    ConstantsResponse {
        aow_age: assumptions.aow_age,
        aow_monthly: assumptions.aow_monthly,
        market_weather: &MARKET_WEATHER,
        strategies: WithdrawalStrategy::ALL.iter().map(|s| s.key()).collect(),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/constants", get(constants_handler))
        .route(
            "/api/scenarios",
            get(scenarios_get_handler).post(scenarios_post_handler),
        )
        .route("/api/fire", get(fire_get_handler).post(fire_post_handler))
        .route(
            "/api/resilience",
            get(resilience_get_handler).post(resilience_post_handler),
        )
        .route(
            "/api/withdrawal",
            get(withdrawal_get_handler).post(withdrawal_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fireplan HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/health");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    #[derive(Serialize)]
    struct Health {
        status: &'static str,
    }
    json_response(StatusCode::OK, Health { status: "ok" })
}

async fn constants_handler() -> Response {
    json_response(StatusCode::OK, constants_response())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn scenarios_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload, scenarios_response)
}

async fn scenarios_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload, scenarios_response)
}

async fn fire_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload, fire_response)
}

async fn fire_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload, fire_response)
}

async fn resilience_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload, resilience_response)
}

async fn resilience_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload, resilience_response)
}

async fn withdrawal_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload, withdrawal_response)
}

async fn withdrawal_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload, withdrawal_response)
}

fn plan_handler_impl<T: Serialize>(
    payload: PlanPayload,
    compute: fn(&PlanRequest) -> T,
) -> Response {
    let args = args_from_payload(payload);
    let request = match build_request(&args, SystemClock.today()) {
        Ok(request) => request,
        Err(msg) => {
            debug!(%msg, "rejected request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    json_response(StatusCode::OK, compute(&request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
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
