use tracing::debug;

use super::types::{WithdrawalResult, WithdrawalStrategy, WithdrawalYear};

/// Statutory AOW (Dutch state pension) start age.
pub const NL_AOW_AGE: u32 = 67;
/// Gross monthly AOW for a single recipient, in today's euros.
pub const NL_AOW_MONTHLY: f64 = 1_450.0;

const DEPLETION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecumulationAssumptions {
    pub inflation_rate: f64,
    /// When false every amount stays flat in nominal terms.
    pub index_to_inflation: bool,
    pub withdrawal_rate: f64,
    pub portfolio_return: f64,
    pub aow_age: u32,
    pub aow_monthly: f64,
    pub guardrail_lower: f64,
    pub guardrail_upper: f64,
    pub guardrail_adjustment: f64,
    pub bucket_cash_years: f64,
    pub bucket_bond_years: f64,
    pub cash_return: f64,
    pub bond_return: f64,
    pub stock_return: f64,
}

impl Default for DecumulationAssumptions {
    fn default() -> Self {
        Self {
            inflation_rate: 0.02,
            index_to_inflation: true,
            withdrawal_rate: 0.04,
            portfolio_return: 0.07,
            aow_age: NL_AOW_AGE,
            aow_monthly: NL_AOW_MONTHLY,
            guardrail_lower: 0.8,
            guardrail_upper: 1.2,
            guardrail_adjustment: 0.10,
            bucket_cash_years: 3.0,
            bucket_bond_years: 7.0,
            cash_return: 0.0,
            bond_return: 0.03,
            stock_return: 0.07,
        }
    }
}

impl DecumulationAssumptions {
    pub fn price_index(&self, year_index: u32) -> f64 {
        if self.index_to_inflation {
            (1.0 + self.inflation_rate).powi(year_index as i32)
        } else {
            1.0
        }
    }

    pub fn aow_income(&self, age: u32, price_index: f64) -> f64 {
        if age >= self.aow_age {
            self.aow_monthly.max(0.0) * 12.0 * price_index
        } else {
            0.0
        }
    }

    fn year_state(
        &self,
        year_index: u32,
        age: u32,
        start_balance: f64,
        yearly_expenses: f64,
    ) -> YearState {
        let price_index = self.price_index(year_index);
        let yearly_need = yearly_expenses * price_index;
        let aow_income = self.aow_income(age, price_index);
        YearState {
            year_index,
            age,
            start_balance,
            price_index,
            yearly_need,
            aow_income,
            needed_from_portfolio: (yearly_need - aow_income).max(0.0),
        }
    }
}

/// Inputs a policy sees at the start of one simulated year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearState {
    pub year_index: u32,
    pub age: u32,
    pub start_balance: f64,
    pub price_index: f64,
    pub yearly_need: f64,
    pub aow_income: f64,
    pub needed_from_portfolio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyStep {
    pub withdrawal: f64,
    pub growth: f64,
}

pub trait WithdrawalPolicy {
    fn strategy(&self) -> WithdrawalStrategy;

    /// What the policy would take out this year before any cap.
    fn proposed_withdrawal(&mut self, year: &YearState) -> f64;

    /// Books the actual withdrawal and returns the year's growth.
    fn settle(&mut self, year: &YearState, withdrawal: f64) -> f64;

    /// One yearly transition. The withdrawal never exceeds the year's need
    /// from the portfolio nor the balance on hand.
    fn step(&mut self, year: &YearState) -> PolicyStep {
        let proposed = self.proposed_withdrawal(year).max(0.0);
        let withdrawal = proposed
            .min(year.needed_from_portfolio)
            .min(year.start_balance)
            .max(0.0);
        let growth = self.settle(year, withdrawal);
        PolicyStep { withdrawal, growth }
    }
}

fn single_pot_growth(year: &YearState, withdrawal: f64, annual_return: f64) -> f64 {
    (year.start_balance - withdrawal).max(0.0) * annual_return
}

/// Fixed share of the initial portfolio, indexed with the price level.
#[derive(Debug, Clone)]
pub struct ClassicPolicy {
    initial_portfolio: f64,
    rate: f64,
    annual_return: f64,
}

impl ClassicPolicy {
    pub fn new(initial_portfolio: f64, assumptions: &DecumulationAssumptions) -> Self {
        Self {
            initial_portfolio,
            rate: assumptions.withdrawal_rate,
            annual_return: assumptions.portfolio_return,
        }
    }
}

impl WithdrawalPolicy for ClassicPolicy {
    fn strategy(&self) -> WithdrawalStrategy {
        WithdrawalStrategy::Classic
    }

    fn proposed_withdrawal(&mut self, year: &YearState) -> f64 {
        self.initial_portfolio * self.rate * year.price_index
    }

    fn settle(&mut self, year: &YearState, withdrawal: f64) -> f64 {
        single_pot_growth(year, withdrawal, self.annual_return)
    }
}

/// Fixed share of whatever the balance is at the start of the year.
#[derive(Debug, Clone)]
pub struct VariablePolicy {
    rate: f64,
    annual_return: f64,
}

impl VariablePolicy {
    pub fn new(assumptions: &DecumulationAssumptions) -> Self {
        Self {
            rate: assumptions.withdrawal_rate,
            annual_return: assumptions.portfolio_return,
        }
    }
}

impl WithdrawalPolicy for VariablePolicy {
    fn strategy(&self) -> WithdrawalStrategy {
        WithdrawalStrategy::Variable
    }

    fn proposed_withdrawal(&mut self, year: &YearState) -> f64 {
        year.start_balance.max(0.0) * self.rate
    }

    fn settle(&mut self, year: &YearState, withdrawal: f64) -> f64 {
        single_pot_growth(year, withdrawal, self.annual_return)
    }
}

/// Guyton-Klinger style guardrails around the indexed initial withdrawal.
///
/// Each year the balance is compared to the inflation-adjusted initial
/// portfolio. Above the upper ratio the withdrawal is raised by the adjustment
/// step, below the lower ratio it is cut. The cumulative multiplier stays
/// inside `[lower, upper]`, so the real withdrawal rate never leaves
/// `[lower, upper] x` the base rate.
#[derive(Debug, Clone)]
pub struct GuardrailsPolicy {
    initial_portfolio: f64,
    rate: f64,
    lower: f64,
    upper: f64,
    adjustment: f64,
    annual_return: f64,
    multiplier: f64,
}

impl GuardrailsPolicy {
    pub fn new(initial_portfolio: f64, assumptions: &DecumulationAssumptions) -> Self {
        let lower = assumptions.guardrail_lower.min(assumptions.guardrail_upper);
        let upper = assumptions.guardrail_upper.max(assumptions.guardrail_lower);
        Self {
            initial_portfolio,
            rate: assumptions.withdrawal_rate,
            lower,
            upper,
            adjustment: assumptions.guardrail_adjustment.max(0.0),
            annual_return: assumptions.portfolio_return,
            multiplier: 1.0_f64.clamp(lower, upper),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl WithdrawalPolicy for GuardrailsPolicy {
    fn strategy(&self) -> WithdrawalStrategy {
        WithdrawalStrategy::Guardrails
    }

    fn proposed_withdrawal(&mut self, year: &YearState) -> f64 {
        let indexed_initial = self.initial_portfolio * year.price_index;
        if indexed_initial > 0.0 {
            let ratio = year.start_balance / indexed_initial;
            if ratio > self.upper {
                self.multiplier *= 1.0 + self.adjustment;
            } else if ratio < self.lower {
                self.multiplier *= 1.0 - self.adjustment;
            }
            self.multiplier = self.multiplier.clamp(self.lower, self.upper);
        }
        indexed_initial * self.rate * self.multiplier
    }

    fn settle(&mut self, year: &YearState, withdrawal: f64) -> f64 {
        single_pot_growth(year, withdrawal, self.annual_return)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketBalances {
    pub cash: f64,
    pub bonds: f64,
    pub stocks: f64,
}

impl BucketBalances {
    pub fn total(&self) -> f64 {
        self.cash + self.bonds + self.stocks
    }
}

/// Three sub-portfolios: cash for the next few years of need, bonds for the
/// middle band, stocks for the rest. Spending is always paid from cash; at the
/// start of each year cash and bonds are topped up from the longer buckets.
#[derive(Debug, Clone)]
pub struct BucketPolicy {
    buckets: BucketBalances,
    cash_years: f64,
    bond_years: f64,
    cash_return: f64,
    bond_return: f64,
    stock_return: f64,
    refill_events: u32,
}

impl BucketPolicy {
    pub fn new(
        initial_portfolio: f64,
        first_year_need: f64,
        assumptions: &DecumulationAssumptions,
    ) -> Self {
        let portfolio = initial_portfolio.max(0.0);
        let need = first_year_need.max(0.0);
        let cash_years = assumptions.bucket_cash_years.max(0.0);
        let bond_years = assumptions.bucket_bond_years.max(0.0);

        let cash = portfolio.min(need * cash_years);
        let bonds = (portfolio - cash).min(need * bond_years);
        let stocks = (portfolio - cash - bonds).max(0.0);

        Self {
            buckets: BucketBalances {
                cash,
                bonds,
                stocks,
            },
            cash_years,
            bond_years,
            cash_return: assumptions.cash_return,
            bond_return: assumptions.bond_return,
            stock_return: assumptions.stock_return,
            refill_events: 0,
        }
    }

    pub fn balances(&self) -> BucketBalances {
        self.buckets
    }

    pub fn refill_events(&self) -> u32 {
        self.refill_events
    }

    fn refill(&mut self, yearly_need: f64) {
        let b = &mut self.buckets;

        let cash_target = yearly_need * self.cash_years;
        if b.cash < cash_target {
            let shortfall = cash_target - b.cash;
            let from_bonds = shortfall.min(b.bonds);
            b.bonds -= from_bonds;
            let from_stocks = (shortfall - from_bonds).min(b.stocks);
            b.stocks -= from_stocks;
            b.cash += from_bonds + from_stocks;
            if from_bonds + from_stocks > 0.0 {
                self.refill_events += 1;
            }
        }

        let bond_target = yearly_need * self.bond_years;
        if b.bonds < bond_target {
            let moved = (bond_target - b.bonds).min(b.stocks);
            b.stocks -= moved;
            b.bonds += moved;
        }
    }
}

impl WithdrawalPolicy for BucketPolicy {
    fn strategy(&self) -> WithdrawalStrategy {
        WithdrawalStrategy::Bucket
    }

    fn proposed_withdrawal(&mut self, year: &YearState) -> f64 {
        self.refill(year.needed_from_portfolio);
        self.buckets.cash
    }

    fn settle(&mut self, _year: &YearState, withdrawal: f64) -> f64 {
        let b = &mut self.buckets;
        b.cash = (b.cash - withdrawal).max(0.0);

        let cash_growth = b.cash * self.cash_return;
        let bond_growth = b.bonds * self.bond_return;
        let stock_growth = b.stocks * self.stock_return;
        b.cash = (b.cash + cash_growth).max(0.0);
        b.bonds = (b.bonds + bond_growth).max(0.0);
        b.stocks = (b.stocks + stock_growth).max(0.0);

        cash_growth + bond_growth + stock_growth
    }
}

pub fn policy_for(
    strategy: WithdrawalStrategy,
    initial_portfolio: f64,
    first_year_need: f64,
    assumptions: &DecumulationAssumptions,
) -> Box<dyn WithdrawalPolicy> {
    match strategy {
        WithdrawalStrategy::Classic => Box::new(ClassicPolicy::new(initial_portfolio, assumptions)),
        WithdrawalStrategy::Variable => Box::new(VariablePolicy::new(assumptions)),
        WithdrawalStrategy::Guardrails => {
            Box::new(GuardrailsPolicy::new(initial_portfolio, assumptions))
        }
        WithdrawalStrategy::Bucket => Box::new(BucketPolicy::new(
            initial_portfolio,
            first_year_need,
            assumptions,
        )),
    }
}

/// Year-by-year drawdown from `retirement_age` up to (not including) `target_age`.
pub fn compute_withdrawal(
    starting_portfolio: f64,
    retirement_age: u32,
    target_age: u32,
    strategy: WithdrawalStrategy,
    yearly_expenses: f64,
    assumptions: &DecumulationAssumptions,
) -> WithdrawalResult {
    let total_years = target_age.saturating_sub(retirement_age);
    let initial = if starting_portfolio.is_finite() {
        starting_portfolio.max(0.0)
    } else {
        0.0
    };
    let yearly_expenses = yearly_expenses.max(0.0);
    debug!(
        %strategy,
        initial,
        retirement_age,
        target_age,
        yearly_expenses,
        "simulating decumulation"
    );

    let first_year = assumptions.year_state(0, retirement_age, initial, yearly_expenses);
    let mut policy = policy_for(
        strategy,
        initial,
        first_year.needed_from_portfolio,
        assumptions,
    );

    let mut schedule = Vec::with_capacity(total_years as usize);
    let mut balance = initial;
    let mut depleted_at: Option<u32> = None;
    let mut success_years = total_years;

    for year_index in 0..total_years {
        let age = retirement_age + year_index;
        let year = assumptions.year_state(year_index, age, balance, yearly_expenses);

        if depleted_at.is_some() {
            schedule.push(WithdrawalYear {
                age,
                start_balance: 0.0,
                withdrawal: 0.0,
                aow_income: year.aow_income,
                growth: 0.0,
                end_balance: 0.0,
            });
            continue;
        }

        let step = policy.step(&year);
        let mut end_balance = (balance - step.withdrawal + step.growth).max(0.0);
        if end_balance <= DEPLETION_EPSILON {
            end_balance = 0.0;
            depleted_at = Some(year_index);
            // The draining year still counts when it paid the full need.
            let funded = step.withdrawal + DEPLETION_EPSILON >= year.needed_from_portfolio;
            success_years = year_index + u32::from(funded);
            debug!(%strategy, age, year_index, "portfolio depleted");
        }

        schedule.push(WithdrawalYear {
            age,
            start_balance: balance,
            withdrawal: step.withdrawal,
            aow_income: year.aow_income,
            growth: step.growth,
            end_balance,
        });
        balance = end_balance;
    }

    WithdrawalResult {
        strategy: policy.strategy(),
        monthly_withdrawal: schedule.first().map_or(0.0, |row| row.withdrawal / 12.0),
        depleted: depleted_at.is_some(),
        success_years,
        total_years,
        schedule,
    }
}
