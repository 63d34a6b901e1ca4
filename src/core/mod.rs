mod age;
mod decumulation;
mod engine;
mod error;
mod resilience;
mod types;
mod weather;

pub use age::{
    Clock, DEFAULT_FALLBACK_AGE, FixedClock, SystemClock, age_at_date, parse_birth_date,
    resolve_age,
};
pub use decumulation::{
    BucketBalances, BucketPolicy, ClassicPolicy, DecumulationAssumptions, GuardrailsPolicy,
    NL_AOW_AGE, NL_AOW_MONTHLY, PolicyStep, VariablePolicy, WithdrawalPolicy, YearState,
    compute_withdrawal, policy_for,
};
pub use engine::{
    DEFAULT_ANNUAL_RETURN, FIRE_HORIZON_AGE, MAX_PROJECTION_YEARS, ProfileParams,
    ProjectionSettings, SAFE_WITHDRAWAL_RATE, SCENARIO_PROFILES, compute_fire_projection,
    compute_scenarios, fire_target, format_fire_age,
};
pub use error::EngineError;
pub use resilience::{
    COMPONENT_MAX, ResilienceCalibration, compute_resilience_score, resilience_label,
};
pub use types::{
    FinancialSnapshot, FireProjection, MonthPoint, ResilienceBreakdown, ResilienceScore,
    ScenarioPath, ScenarioProfile, WithdrawalResult, WithdrawalStrategy, WithdrawalYear,
};
pub use weather::{MARKET_WEATHER, MarketWeather, MarketWeatherRegime, market_weather};
