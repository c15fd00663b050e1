use hen_pinch::{
    HenSynthesisBuilder, InMemorySource, MinUtilityProblem, ProblemData, Stream, Utility,
    solve_min_utility,
};
use rust_decimal::{Decimal, dec};

fn four_stream_data() -> ProblemData {
    ProblemData {
        streams: vec![
            Stream::new(dec!(150), dec!(60), dec!(2)).unwrap(),
            Stream::new(dec!(90), dec!(60), dec!(4)).unwrap(),
            Stream::new(dec!(20), dec!(125), dec!(1.5)).unwrap(),
            Stream::new(dec!(25), dec!(100), dec!(3)).unwrap(),
        ],
        hot_utility: Utility::new(dec!(180), dec!(179)).unwrap(),
        cold_utility: Utility::new(dec!(20), dec!(30)).unwrap(),
        dt_min: dec!(10),
    }
}

#[test]
fn test_four_stream_reference_case() {
    // Problem-table method by hand for this instance:
    //   shifted breakpoints 145, 130, 105, 85, 55, 30, 25
    //   interval balances   +30, +12.5, -50, +45, -112.5, -7.5
    // so QH = 82.5, QC = 0 and the bottom boundary (25) pinches.
    let source = InMemorySource::new().with_problem("four_stream", four_stream_data());
    let problem = MinUtilityProblem::from_source(&source, "four_stream").unwrap();

    let intervals = problem.temperature_intervals();
    assert_eq!(intervals.len(), 6);
    assert_eq!(intervals[0].upper, dec!(145));
    assert_eq!(intervals[5].lower, dec!(25));

    let report = HenSynthesisBuilder::default()
        .problem(problem)
        .build()
        .unwrap()
        .compute()
        .unwrap();

    assert_eq!(report.hot_utility, dec!(82.5));
    assert_eq!(report.cold_utility, dec!(0));
    assert_eq!(report.pinch_temperatures, vec![dec!(25)]);

    // A positive integer objective no larger than |H| x |C|
    assert!(report.match_count >= 1);
    assert!(report.match_count <= 9);
    assert_eq!(report.match_count, report.matches.len());

    // Every hot stream carries duty, so each needs at least one match
    assert!(report.match_count >= 3);

    // Reported flows stay on or below the temperature diagonal
    for flow in &report.heat_flows {
        assert!(flow.hot_interval <= flow.cold_interval);
        assert!(flow.heat > dec!(0));
    }

    // Total flow equals total heat shipped: process duty plus hot utility
    let total: Decimal = report.heat_flows.iter().map(|f| f.heat).sum();
    assert_eq!(total.round_dp(2), dec!(382.5));
}

#[test]
fn test_cascade_residuals_non_negative_with_exact_pinch() {
    let problem = MinUtilityProblem::new(four_stream_data()).unwrap();
    let targets = solve_min_utility(&problem).unwrap();

    assert!(targets.residuals.iter().all(|r| *r >= Decimal::ZERO));
    assert_eq!(
        targets
            .residuals
            .iter()
            .filter(|r| **r == Decimal::ZERO)
            .count(),
        targets.pinch.len()
    );
    assert!(!targets.pinch.is_empty());
}

#[test]
fn test_tighter_approach_temperature_needs_more_utility() {
    let mut data = four_stream_data();
    data.dt_min = dec!(40);
    let problem = MinUtilityProblem::new(data).unwrap();
    let wide = solve_min_utility(&problem).unwrap();

    let narrow =
        solve_min_utility(&MinUtilityProblem::new(four_stream_data()).unwrap()).unwrap();

    assert!(wide.hot_duty() > narrow.hot_duty());
    assert_eq!(
        wide.hot_duty() - wide.cold_duty(),
        narrow.hot_duty() - narrow.cold_duty()
    );
}
