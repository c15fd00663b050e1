use hen_pinch::{
    HenError, InMemorySource, MinUtilityProblem, ProblemData, Stream, Utility,
};
use rust_decimal::dec;

fn valid_data() -> ProblemData {
    ProblemData {
        streams: vec![
            Stream::new(dec!(150), dec!(60), dec!(2)).unwrap(),
            Stream::new(dec!(20), dec!(125), dec!(1.5)).unwrap(),
        ],
        hot_utility: Utility::new(dec!(180), dec!(179)).unwrap(),
        cold_utility: Utility::new(dec!(20), dec!(30)).unwrap(),
        dt_min: dec!(10),
    }
}

#[test]
fn test_isothermal_stream_is_rejected() {
    let err = Stream::new(dec!(80), dec!(80), dec!(2)).unwrap_err();
    match err {
        HenError::InvalidStream { reason, .. } => {
            assert!(reason.contains("equal"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_nonpositive_fcp_is_rejected() {
    assert!(matches!(
        Stream::new(dec!(150), dec!(60), dec!(0)),
        Err(HenError::InvalidStream { .. })
    ));
    assert!(matches!(
        Stream::new(dec!(150), dec!(60), dec!(-2)),
        Err(HenError::InvalidStream { .. })
    ));
}

#[test]
fn test_unknown_problem_id_propagates() {
    let source = InMemorySource::new().with_problem("known", valid_data());
    let err = MinUtilityProblem::from_source(&source, "unknown").unwrap_err();
    match err {
        HenError::UnknownProblem { id } => assert_eq!(id, "unknown"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_stream_set_is_rejected() {
    let mut data = valid_data();
    data.streams.clear();
    assert!(matches!(
        MinUtilityProblem::new(data),
        Err(HenError::InvalidProblem(_))
    ));
}

#[test]
fn test_nonpositive_dt_min_is_rejected() {
    let mut data = valid_data();
    data.dt_min = dec!(-5);
    assert!(matches!(
        MinUtilityProblem::new(data),
        Err(HenError::InvalidProblem(_))
    ));
}

#[test]
fn test_misdirected_utilities_are_rejected() {
    let mut data = valid_data();
    data.hot_utility = Utility::new(dec!(179), dec!(180)).unwrap();
    assert!(matches!(
        MinUtilityProblem::new(data),
        Err(HenError::InvalidProblem(_))
    ));

    let mut data = valid_data();
    data.cold_utility = Utility::new(dec!(30), dec!(20)).unwrap();
    assert!(matches!(
        MinUtilityProblem::new(data),
        Err(HenError::InvalidProblem(_))
    ));
}
