use chrono::NaiveDate;
use tracing::debug;

use super::age::{DEFAULT_FALLBACK_AGE, resolve_age};
use super::decumulation::NL_AOW_AGE;
use super::types::{FinancialSnapshot, FireProjection, MonthPoint, ScenarioPath, ScenarioProfile};
use super::weather::MarketWeather;

pub const DEFAULT_ANNUAL_RETURN: f64 = 0.07;
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;
pub const MAX_PROJECTION_YEARS: u32 = 40;
/// The baseline FIRE search runs until this age.
pub const FIRE_HORIZON_AGE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    pub base_annual_return: f64,
    pub market_weather: MarketWeather,
    pub safe_withdrawal_rate: f64,
    pub fallback_age: f64,
    pub as_of: NaiveDate,
}

impl ProjectionSettings {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            base_annual_return: DEFAULT_ANNUAL_RETURN,
            market_weather: MarketWeather::Normal,
            safe_withdrawal_rate: SAFE_WITHDRAWAL_RATE,
            fallback_age: DEFAULT_FALLBACK_AGE,
            as_of,
        }
    }

    pub fn annual_return(&self) -> f64 {
        self.base_annual_return + self.market_weather.regime().return_adjustment
    }

    fn monthly_return(&self) -> f64 {
        self.annual_return() / 12.0
    }
}

/// Behavioral deltas applied on top of the snapshot for one named profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    pub profile: ScenarioProfile,
    pub label: &'static str,
    pub expense_growth_rate: f64,
    pub expense_multiplier: f64,
    pub contribution_multiplier: f64,
    /// While monthly savings are not positive the balance is held as cash and
    /// earns no market return.
    pub cash_when_dissaving: bool,
}

pub static SCENARIO_PROFILES: [ProfileParams; 3] = [
    ProfileParams {
        profile: ScenarioProfile::Drifter,
        label: "Zonder plan",
        expense_growth_rate: 0.03,
        expense_multiplier: 1.0,
        contribution_multiplier: 1.0,
        cash_when_dissaving: true,
    },
    ProfileParams {
        profile: ScenarioProfile::Current,
        label: "Huidige koers",
        expense_growth_rate: 0.0,
        expense_multiplier: 1.0,
        contribution_multiplier: 1.0,
        cash_when_dissaving: false,
    },
    ProfileParams {
        profile: ScenarioProfile::Optimizer,
        label: "Geoptimaliseerd",
        expense_growth_rate: 0.0,
        expense_multiplier: 0.9,
        contribution_multiplier: 1.2,
        cash_when_dissaving: false,
    },
];

impl ScenarioProfile {
    pub fn params(self) -> &'static ProfileParams {
        match self {
            ScenarioProfile::Drifter => &SCENARIO_PROFILES[0],
            ScenarioProfile::Current => &SCENARIO_PROFILES[1],
            ScenarioProfile::Optimizer => &SCENARIO_PROFILES[2],
        }
    }
}

/// Net worth needed to cover `monthly_expenses` at the given withdrawal rate.
/// `None` when there is nothing (or nothing sensible) to cover.
pub fn fire_target(monthly_expenses: f64, safe_withdrawal_rate: f64) -> Option<f64> {
    let annual = monthly_expenses * 12.0;
    if annual <= 0.0 || safe_withdrawal_rate <= 0.0 {
        return None;
    }
    Some(annual / safe_withdrawal_rate)
}

#[derive(Clone, Copy)]
struct ProfileTrajectory<'a> {
    snapshot: &'a FinancialSnapshot,
    params: &'a ProfileParams,
}

impl ProfileTrajectory<'_> {
    fn monthly_expenses(self, month: u32) -> f64 {
        let growth = (1.0 + self.params.expense_growth_rate).powf(month as f64 / 12.0);
        self.snapshot.monthly_expenses * self.params.expense_multiplier * growth
    }

    fn monthly_savings(self, month: u32) -> f64 {
        let extra_contribution =
            self.snapshot.monthly_contributions * (self.params.contribution_multiplier - 1.0);
        self.snapshot.monthly_income - self.monthly_expenses(month) + extra_contribution
    }
}

fn simulate_profile(
    snapshot: &FinancialSnapshot,
    params: &ProfileParams,
    settings: &ProjectionSettings,
    start_age: f64,
    months: u32,
) -> ScenarioPath {
    let trajectory = ProfileTrajectory { snapshot, params };
    let monthly_return = settings.monthly_return();

    let mut net_worth = snapshot.net_worth();
    let mut fire_age = None;
    let mut points = Vec::with_capacity(months as usize);

    for month in 0..months {
        let savings = trajectory.monthly_savings(month);
        let growth = if params.cash_when_dissaving && savings <= 0.0 {
            0.0
        } else {
            net_worth * monthly_return
        };
        net_worth += growth + savings;
        let month_index = month + 1;
        let age = start_age + month_index as f64 / 12.0;

        if fire_age.is_none() {
            let target = fire_target(
                trajectory.monthly_expenses(month_index),
                settings.safe_withdrawal_rate,
            );
            if target.is_some_and(|target| net_worth >= target) {
                fire_age = Some(age);
            }
        }

        points.push(MonthPoint {
            month_index,
            net_worth,
            age,
        });
    }

    ScenarioPath {
        name: params.profile,
        label: params.label,
        months: points,
        fire_age,
    }
}

/// Projects every behavioral profile forward `years` years, month by month.
pub fn compute_scenarios(
    snapshot: &FinancialSnapshot,
    years: u32,
    settings: &ProjectionSettings,
) -> Vec<ScenarioPath> {
    let start_age = resolve_age(snapshot.date_of_birth, settings.as_of, settings.fallback_age);
    let months = years.saturating_mul(12);
    debug!(
        years,
        start_age,
        weather = settings.market_weather.key(),
        "projecting scenarios"
    );

    SCENARIO_PROFILES
        .iter()
        .map(|params| simulate_profile(snapshot, params, settings, start_age, months))
        .collect()
}

/// Baseline FIRE age on the current trajectory, searched up to age 100.
pub fn compute_fire_projection(
    snapshot: &FinancialSnapshot,
    settings: &ProjectionSettings,
) -> FireProjection {
    let current_age =
        resolve_age(snapshot.date_of_birth, settings.as_of, settings.fallback_age);
    let months = ((FIRE_HORIZON_AGE - current_age).max(0.0) * 12.0).ceil() as u32;
    let params = ScenarioProfile::Current.params();
    let path = simulate_profile(snapshot, params, settings, current_age, months);

    FireProjection {
        fire_age: path.fire_age,
        current_age,
        fire_target: fire_target(
            snapshot.monthly_expenses * params.expense_multiplier,
            settings.safe_withdrawal_rate,
        ),
        years_to_fire: path.fire_age.map(|age| age - current_age),
    }
}

pub fn format_fire_age(age: Option<f64>) -> String {
    match age {
        Some(age) => format!("{} jaar", age.floor() as i64),
        None => format!("Nooit / {NL_AOW_AGE}+"),
    }
}
