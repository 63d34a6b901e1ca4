use super::types::{FinancialSnapshot, ResilienceBreakdown, ResilienceScore};

pub const COMPONENT_MAX: f64 = 25.0;

/// Saturation points for the four sub-scores. Each component reaches its
/// full 25 points at the configured reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResilienceCalibration {
    /// Months of expenses covered by liquid assets for a full emergency score.
    pub emergency_full_months: f64,
    /// Non-cash share of total assets for a full diversification score.
    pub diversification_full_share: f64,
    /// Debt-to-assets ratio at which the debt score reaches zero.
    pub debt_ratio_zero_score: f64,
    /// Savings rate for a full savings score.
    pub savings_rate_full: f64,
}

impl Default for ResilienceCalibration {
    fn default() -> Self {
        Self {
            emergency_full_months: 6.0,
            diversification_full_share: 0.5,
            debt_ratio_zero_score: 1.0,
            savings_rate_full: 0.20,
        }
    }
}

fn scaled(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return 0.0;
    }
    (fraction * COMPONENT_MAX).clamp(0.0, COMPONENT_MAX)
}

fn emergency_score(snapshot: &FinancialSnapshot, calibration: &ResilienceCalibration) -> f64 {
    let liquid = snapshot
        .cash_assets
        .unwrap_or(snapshot.total_assets)
        .clamp(0.0, snapshot.total_assets.max(0.0));
    if snapshot.monthly_expenses <= 0.0 {
        return if liquid > 0.0 { COMPONENT_MAX } else { 0.0 };
    }
    let months = liquid / snapshot.monthly_expenses;
    scaled(months / calibration.emergency_full_months)
}

fn diversification_score(snapshot: &FinancialSnapshot, calibration: &ResilienceCalibration) -> f64 {
    if snapshot.total_assets <= 0.0 {
        return 0.0;
    }
    let cash = snapshot
        .cash_assets
        .unwrap_or(snapshot.total_assets)
        .clamp(0.0, snapshot.total_assets);
    let non_cash_share = (snapshot.total_assets - cash) / snapshot.total_assets;
    scaled(non_cash_share / calibration.diversification_full_share)
}

fn debt_ratio_score(snapshot: &FinancialSnapshot, calibration: &ResilienceCalibration) -> f64 {
    let debts = snapshot.total_debts.max(0.0);
    if debts <= 0.0 {
        return COMPONENT_MAX;
    }
    if snapshot.total_assets <= 0.0 {
        return 0.0;
    }
    let ratio = debts / snapshot.total_assets;
    scaled(1.0 - ratio / calibration.debt_ratio_zero_score)
}

fn savings_rate_score(snapshot: &FinancialSnapshot, calibration: &ResilienceCalibration) -> f64 {
    if snapshot.monthly_income <= 0.0 {
        return 0.0;
    }
    let rate = (snapshot.monthly_income - snapshot.monthly_expenses) / snapshot.monthly_income;
    scaled(rate.max(0.0) / calibration.savings_rate_full)
}

pub fn resilience_label(total: f64) -> &'static str {
    if total >= 80.0 {
        "Uitstekend"
    } else if total >= 60.0 {
        "Goed"
    } else if total >= 40.0 {
        "Matig"
    } else {
        "Kwetsbaar"
    }
}

pub fn compute_resilience_score(
    snapshot: &FinancialSnapshot,
    calibration: &ResilienceCalibration,
) -> ResilienceScore {
    let breakdown = ResilienceBreakdown {
        emergency: emergency_score(snapshot, calibration),
        diversification: diversification_score(snapshot, calibration),
        debt_ratio: debt_ratio_score(snapshot, calibration),
        savings_rate: savings_rate_score(snapshot, calibration),
    };
    let total = breakdown.sum();

    ResilienceScore {
        total,
        label: resilience_label(total),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            total_assets: 100_000.0,
            total_debts: 25_000.0,
            monthly_income: 4_000.0,
            monthly_expenses: 2_500.0,
            monthly_contributions: 300.0,
            yearly_must_expenses: 18_000.0,
            cash_assets: Some(7_500.0),
            date_of_birth: None,
        }
    }

    #[test]
    fn components_follow_default_calibration() {
        let score = compute_resilience_score(&snapshot(), &ResilienceCalibration::default());

        // 3 of 6 months
        assert_approx(score.breakdown.emergency, 12.5);
        // 92.5% non-cash saturates the 50% reference
        assert_approx(score.breakdown.diversification, 25.0);
        // debts are a quarter of assets
        assert_approx(score.breakdown.debt_ratio, 18.75);
        // 37.5% savings rate saturates the 20% reference
        assert_approx(score.breakdown.savings_rate, 25.0);
        assert_approx(score.total, 81.25);
        assert_eq!(score.label, "Uitstekend");
    }

    #[test]
    fn missing_cash_split_counts_everything_as_liquid() {
        let mut s = snapshot();
        s.cash_assets = None;
        let score = compute_resilience_score(&s, &ResilienceCalibration::default());
        assert_approx(score.breakdown.emergency, 25.0);
        assert_approx(score.breakdown.diversification, 0.0);
    }

    #[test]
    fn cash_beyond_total_assets_is_capped_for_the_buffer() {
        let mut s = snapshot();
        s.monthly_expenses = 50_000.0;
        s.cash_assets = Some(200_000.0);
        let score = compute_resilience_score(&s, &ResilienceCalibration::default());
        // only the 100k of total assets counts: 2 of 6 months
        assert_approx(score.breakdown.emergency, 25.0 * 2.0 / 6.0);
    }

    #[test]
    fn overspending_scores_zero_savings() {
        let mut s = snapshot();
        s.monthly_expenses = 5_000.0;
        let score = compute_resilience_score(&s, &ResilienceCalibration::default());
        assert_approx(score.breakdown.savings_rate, 0.0);
    }

    #[test]
    fn debts_without_assets_score_zero() {
        let mut s = snapshot();
        s.total_assets = 0.0;
        s.cash_assets = Some(0.0);
        let score = compute_resilience_score(&s, &ResilienceCalibration::default());
        assert_approx(score.breakdown.debt_ratio, 0.0);
        assert_approx(score.breakdown.diversification, 0.0);
        assert_approx(score.breakdown.emergency, 0.0);
    }

    #[test]
    fn calibration_changes_saturation_point() {
        let calibration = ResilienceCalibration {
            emergency_full_months: 3.0,
            ..ResilienceCalibration::default()
        };
        let score = compute_resilience_score(&snapshot(), &calibration);
        assert_approx(score.breakdown.emergency, 25.0);
    }

    #[test]
    fn labels_are_banded() {
        assert_eq!(resilience_label(100.0), "Uitstekend");
        assert_eq!(resilience_label(60.0), "Goed");
        assert_eq!(resilience_label(59.9), "Matig");
        assert_eq!(resilience_label(0.0), "Kwetsbaar");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_breakdown_components_are_bounded_and_sum_to_total(
            assets in -50_000.0f64..2_000_000.0,
            debts in -10_000.0f64..1_000_000.0,
            income in -1_000.0f64..20_000.0,
            expenses in -1_000.0f64..20_000.0,
            cash in proptest::option::of(-10_000.0f64..2_000_000.0),
        ) {
            let s = FinancialSnapshot {
                total_assets: assets,
                total_debts: debts,
                monthly_income: income,
                monthly_expenses: expenses,
                monthly_contributions: 0.0,
                yearly_must_expenses: 0.0,
                cash_assets: cash,
                date_of_birth: None,
            };
            let score = compute_resilience_score(&s, &ResilienceCalibration::default());
            let b = score.breakdown;
            for component in [b.emergency, b.diversification, b.debt_ratio, b.savings_rate] {
                prop_assert!((0.0..=COMPONENT_MAX).contains(&component));
            }
            prop_assert_eq!(score.total, b.sum());
            prop_assert!((0.0..=100.0).contains(&score.total));
        }
    }
}
