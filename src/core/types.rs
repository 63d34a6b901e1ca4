use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Aggregated household position, assembled by the data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub total_assets: f64,
    pub total_debts: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_contributions: f64,
    pub yearly_must_expenses: f64,
    /// Liquid part of `total_assets`. `None` means every asset counts as liquid.
    pub cash_assets: Option<f64>,
    pub date_of_birth: Option<NaiveDate>,
}

impl FinancialSnapshot {
    pub fn net_worth(&self) -> f64 {
        self.total_assets - self.total_debts
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioProfile {
    Drifter,
    Current,
    Optimizer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPoint {
    pub month_index: u32,
    pub net_worth: f64,
    pub age: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPath {
    pub name: ScenarioProfile,
    pub label: &'static str,
    pub months: Vec<MonthPoint>,
    pub fire_age: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProjection {
    pub fire_age: Option<f64>,
    pub current_age: f64,
    pub fire_target: Option<f64>,
    pub years_to_fire: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceBreakdown {
    pub emergency: f64,
    pub diversification: f64,
    pub debt_ratio: f64,
    pub savings_rate: f64,
}

impl ResilienceBreakdown {
    pub fn sum(&self) -> f64 {
        self.emergency + self.diversification + self.debt_ratio + self.savings_rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceScore {
    pub total: f64,
    pub label: &'static str,
    pub breakdown: ResilienceBreakdown,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStrategy {
    Classic,
    Variable,
    Guardrails,
    Bucket,
}

impl WithdrawalStrategy {
    pub const ALL: [WithdrawalStrategy; 4] = [
        WithdrawalStrategy::Classic,
        WithdrawalStrategy::Variable,
        WithdrawalStrategy::Guardrails,
        WithdrawalStrategy::Bucket,
    ];

    pub fn key(self) -> &'static str {
        match self {
            WithdrawalStrategy::Classic => "classic",
            WithdrawalStrategy::Variable => "variable",
            WithdrawalStrategy::Guardrails => "guardrails",
            WithdrawalStrategy::Bucket => "bucket",
        }
    }
}

impl fmt::Display for WithdrawalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for WithdrawalStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(WithdrawalStrategy::Classic),
            "variable" => Ok(WithdrawalStrategy::Variable),
            "guardrails" | "guyton-klinger" | "guyton_klinger" => {
                Ok(WithdrawalStrategy::Guardrails)
            }
            "bucket" => Ok(WithdrawalStrategy::Bucket),
            _ => Err(EngineError::UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalYear {
    pub age: u32,
    pub start_balance: f64,
    pub withdrawal: f64,
    pub aow_income: f64,
    pub growth: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResult {
    pub strategy: WithdrawalStrategy,
    pub monthly_withdrawal: f64,
    pub depleted: bool,
    pub success_years: u32,
    pub total_years: u32,
    pub schedule: Vec<WithdrawalYear>,
}
