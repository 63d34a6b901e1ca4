use chrono::NaiveDate;
use fireplan::api::{PlanArgs, build_request, scenarios_response, withdrawal_response};
use fireplan::core::{
    Clock, DecumulationAssumptions, FinancialSnapshot, FixedClock, ProjectionSettings,
    ResilienceCalibration, ScenarioProfile, WithdrawalStrategy, compute_fire_projection,
    compute_resilience_score, compute_scenarios, compute_withdrawal,
};

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"))
}

fn household() -> FinancialSnapshot {
    FinancialSnapshot {
        total_assets: 150_000.0,
        total_debts: 20_000.0,
        monthly_income: 4_000.0,
        monthly_expenses: 2_500.0,
        monthly_contributions: 500.0,
        yearly_must_expenses: 18_000.0,
        cash_assets: Some(30_000.0),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
    }
}

fn fire_key(age: Option<f64>) -> f64 {
    age.unwrap_or(f64::INFINITY)
}

#[test]
fn household_plan_from_accumulation_to_drawdown() {
    let snapshot = household();
    let settings = ProjectionSettings::new(clock().today());

    let paths = compute_scenarios(&snapshot, 40, &settings);
    assert_eq!(paths.len(), 3);
    let by_name = |profile: ScenarioProfile| {
        paths
            .iter()
            .find(|p| p.name == profile)
            .expect("profile present")
    };
    let optimizer = by_name(ScenarioProfile::Optimizer);
    let current = by_name(ScenarioProfile::Current);
    let drifter = by_name(ScenarioProfile::Drifter);
    for p in &paths {
        assert_eq!(p.months.len(), 480);
        assert!((p.months[0].age - 36.8).abs() < 0.1);
    }
    assert!(fire_key(optimizer.fire_age) <= fire_key(current.fire_age));
    assert!(fire_key(current.fire_age) <= fire_key(drifter.fire_age));

    let projection = compute_fire_projection(&snapshot, &settings);
    assert_eq!(projection.fire_target, Some(750_000.0));
    assert_eq!(projection.fire_age, current.fire_age);
    let fire_age = projection.fire_age.expect("current course reaches FIRE");

    let score = compute_resilience_score(&snapshot, &ResilienceCalibration::default());
    assert!((0.0..=100.0).contains(&score.total));

    let assumptions = DecumulationAssumptions::default();
    let retirement_age = fire_age.ceil() as u32;
    for strategy in WithdrawalStrategy::ALL {
        let result = compute_withdrawal(
            projection.fire_target.expect("target"),
            retirement_age,
            90,
            strategy,
            30_000.0,
            &assumptions,
        );
        assert_eq!(result.strategy, strategy);
        assert_eq!(result.total_years, 90 - retirement_age);
        assert_eq!(result.schedule.len() as u32, result.total_years);
        assert!(result.success_years <= result.total_years);
        for pair in result.schedule.windows(2) {
            assert_eq!(pair[1].age, pair[0].age + 1);
        }
    }
}

#[test]
fn cli_style_arguments_drive_the_same_engine() {
    let args = PlanArgs {
        total_assets: 150_000.0,
        total_debts: 20_000.0,
        monthly_income: 4_000.0,
        monthly_expenses: 2_500.0,
        monthly_contributions: 500.0,
        yearly_must_expenses: 18_000.0,
        date_of_birth: Some("1990-01-01".to_string()),
        years: 10,
        strategy: "guyton-klinger".to_string(),
        starting_portfolio: Some(900_000.0),
        retirement_age: Some(55),
        ..PlanArgs::default()
    };
    let request = build_request(&args, clock().today()).expect("valid arguments");

    let scenarios = scenarios_response(&request);
    assert_eq!(scenarios.fire_target, Some(750_000.0));
    assert!(scenarios.scenarios.iter().all(|p| p.months.len() == 120));

    let withdrawal = withdrawal_response(&request);
    assert_eq!(withdrawal.retirement_age, 55);
    assert_eq!(withdrawal.result.strategy, WithdrawalStrategy::Guardrails);
    assert_eq!(withdrawal.result.total_years, 35);

    // AOW income starts at 67 and is indexed from the first retirement year.
    let aow_row = &withdrawal.result.schedule[12];
    assert_eq!(aow_row.age, 67);
    assert!(aow_row.aow_income > 1_450.0 * 12.0);
    assert_eq!(withdrawal.result.schedule[11].aow_income, 0.0);
}
