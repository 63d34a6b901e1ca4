use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use super::{
    PlanRequest, build_request, constants_response, fire_response, resilience_response,
    run_http_server, scenarios_response, withdrawal_response,
};
use crate::core::{Clock, NL_AOW_AGE, NL_AOW_MONTHLY, SystemClock};

#[derive(Parser, Debug)]
#[command(
    name = "fireplan",
    about = "Net-worth scenarios, resilience score and retirement drawdown for a household"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project the drifter, current and optimizer profiles.
    Scenarios(PlanArgs),
    /// Baseline FIRE age on the current trajectory.
    Fire(PlanArgs),
    /// Financial resilience score.
    Resilience(PlanArgs),
    /// Year-by-year drawdown schedule under a withdrawal policy.
    Withdrawal(PlanArgs),
    /// AOW constants and the market weather table.
    Constants,
}

/// Household snapshot plus every tunable assumption. Rates are in percent.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long, default_value_t = 0.0)]
    pub total_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    pub total_debts: f64,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_income: f64,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_expenses: f64,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_contributions: f64,
    #[arg(long, default_value_t = 0.0)]
    pub yearly_must_expenses: f64,
    #[arg(long, help = "Liquid part of total assets; defaults to all assets")]
    pub cash_assets: Option<f64>,
    #[arg(long, help = "YYYY-MM-DD")]
    pub date_of_birth: Option<String>,

    #[arg(long, default_value_t = 40, help = "Scenario horizon in years (1-40)")]
    pub years: u32,
    #[arg(long, default_value = "normal")]
    pub market_weather: String,
    #[arg(long, default_value_t = 7.0, help = "Base annual return in percent")]
    pub annual_return: f64,
    #[arg(long, default_value_t = 4.0, help = "Safe withdrawal rate in percent")]
    pub safe_withdrawal_rate: f64,
    #[arg(long, default_value_t = 35.0, help = "Age used when no birth date is known")]
    pub fallback_age: f64,

    #[arg(long, help = "Defaults to net worth, floored at zero")]
    pub starting_portfolio: Option<f64>,
    #[arg(long, help = "Defaults to the projected FIRE age, else the AOW age")]
    pub retirement_age: Option<u32>,
    #[arg(long, default_value_t = 90)]
    pub target_age: u32,
    #[arg(long, default_value = "classic")]
    pub strategy: String,
    #[arg(long, help = "Defaults to twelve times monthly expenses")]
    pub yearly_expenses: Option<f64>,
    #[arg(long, default_value_t = 2.0, help = "Assumed inflation in percent")]
    pub inflation_rate: f64,
    #[arg(long, help = "Keep withdrawals flat in nominal terms")]
    pub no_inflation_index: bool,
    #[arg(long, default_value_t = 4.0, help = "Withdrawal rate in percent")]
    pub withdrawal_rate: f64,
    #[arg(long, default_value_t = 7.0, help = "Portfolio return in percent")]
    pub portfolio_return: f64,
    #[arg(long, default_value_t = NL_AOW_AGE)]
    pub aow_age: u32,
    #[arg(long, default_value_t = NL_AOW_MONTHLY, help = "Household AOW per month")]
    pub aow_monthly: f64,

    #[arg(long, default_value_t = 6.0)]
    pub emergency_full_months: f64,
    #[arg(long, default_value_t = 50.0, help = "Percent non-cash for full diversification")]
    pub diversification_full_share: f64,
    #[arg(long, default_value_t = 100.0, help = "Debt/assets percent scoring zero")]
    pub debt_ratio_zero_score: f64,
    #[arg(long, default_value_t = 20.0, help = "Savings rate percent for full score")]
    pub savings_rate_full: f64,
}

impl Default for PlanArgs {
    fn default() -> Self {
        Self {
            total_assets: 0.0,
            total_debts: 0.0,
            monthly_income: 0.0,
            monthly_expenses: 0.0,
            monthly_contributions: 0.0,
            yearly_must_expenses: 0.0,
            cash_assets: None,
            date_of_birth: None,
            years: 40,
            market_weather: "normal".to_string(),
            annual_return: 7.0,
            safe_withdrawal_rate: 4.0,
            fallback_age: 35.0,
            starting_portfolio: None,
            retirement_age: None,
            target_age: 90,
            strategy: "classic".to_string(),
            yearly_expenses: None,
            inflation_rate: 2.0,
            no_inflation_index: false,
            withdrawal_rate: 4.0,
            portfolio_return: 7.0,
            aow_age: NL_AOW_AGE,
            aow_monthly: NL_AOW_MONTHLY,
            emergency_full_months: 6.0,
            diversification_full_share: 50.0,
            debt_ratio_zero_score: 100.0,
            savings_rate_full: 20.0,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{json}");
    Ok(())
}

fn request(args: &PlanArgs) -> Result<PlanRequest, String> {
    build_request(args, SystemClock.today())
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Scenarios(args) => print_json(&scenarios_response(&request(&args)?)),
        Command::Fire(args) => print_json(&fire_response(&request(&args)?)),
        Command::Resilience(args) => print_json(&resilience_response(&request(&args)?)),
        Command::Withdrawal(args) => print_json(&withdrawal_response(&request(&args)?)),
        Command::Constants => print_json(&constants_response()),
    }
}
