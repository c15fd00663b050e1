use crate::{
    error::{HenError, Result},
    problem::MinUtilityProblem,
    solver::{LpPrimitives, LpSolver, sparse_from_triplets},
    utils::decimal_to_f64,
};
use faer::sparse::Triplet;
use rust_decimal::Decimal;

pub(crate) const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Maximum allowed gap between the engine's float minimum and the exact
/// Decimal target
const CROSS_CHECK_TOLERANCE: f64 = 1e-6;

/// Solved minimum-utility targets: duties tagged with the interval they
/// enter or leave the cascade at, plus the exact residual profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeSolution {
    /// Hot utility duty per interval (injected at the top interval)
    pub hot_utility: Vec<(usize, Decimal)>,
    /// Cold utility duty per interval (removed at the bottom interval)
    pub cold_utility: Vec<(usize, Decimal)>,
    /// Cumulative cascade residual after each interval, hottest first
    pub residuals: Vec<Decimal>,
    /// Intervals whose residual is exactly zero. Empty when only the
    /// top boundary binds, as for a problem whose streams are all hot:
    /// QH is zero there and every interior residual stays positive.
    pub pinch: Vec<usize>,
}

impl CascadeSolution {
    /// Total minimum hot utility duty
    pub fn hot_duty(&self) -> Decimal {
        self.hot_utility.iter().map(|(_, q)| *q).sum()
    }

    /// Total minimum cold utility duty
    pub fn cold_duty(&self) -> Decimal {
        self.cold_utility.iter().map(|(_, q)| *q).sum()
    }
}

/// Solve the heat-cascade LP for minimum utility targets
pub fn solve_min_utility(problem: &MinUtilityProblem) -> Result<CascadeSolution> {
    solve_min_utility_with_tolerance(problem, DEFAULT_TOLERANCE)
}

/// Heat-cascade LP: minimize QH subject to R_0 = QH and
/// R_t = R_{t-1} + surplus_t with every residual non-negative. The cold
/// utility target is the final residual. Variables are ordered
/// [QH, R_1, .., R_n].
pub fn solve_min_utility_with_tolerance(
    problem: &MinUtilityProblem,
    tolerance: f64,
) -> Result<CascadeSolution> {
    let balance = problem.interval_heat_balance();
    let n = balance.len();
    let n_vars = n + 1;

    // R_t - R_{t-1} = surplus_t, with R_0 standing in for QH
    let mut triplets = Vec::with_capacity(2 * n);
    let mut b_eq = Vec::with_capacity(n);
    for (t, surplus) in balance.iter().enumerate() {
        triplets.push(Triplet::new(t, t, -1.0));
        triplets.push(Triplet::new(t, t + 1, 1.0));
        b_eq.push(decimal_to_f64(*surplus));
    }

    let mut cost = vec![0.0; n_vars];
    cost[0] = 1.0;

    let primitives = LpPrimitives {
        cost,
        a_eq: sparse_from_triplets(n, n_vars, &triplets)?,
        b_eq,
        a_ub: sparse_from_triplets(0, n_vars, &[])?,
        b_ub: vec![],
    };

    let solution = LpSolver::new(&primitives, tolerance)?
        .solve("heat cascade")
        .map_err(|e| match e {
            HenError::SolverFailure { status, .. } if status.contains("primal infeasible") => {
                HenError::InfeasibleCascade {
                    reason: "no non-negative cascade exists for the interval balance".to_string(),
                }
            }
            other => other,
        })?;

    // The feasible set is a chain of prefix-sum bounds on QH, so the
    // exact optimum is available in Decimal arithmetic: QH = max(0,
    // -min prefix). The engine's float answer cross-checks it, and the
    // residual profile stays exact with the pinch a true zero.
    let mut min_prefix = Decimal::ZERO;
    let mut running = Decimal::ZERO;
    for surplus in &balance {
        running += *surplus;
        min_prefix = min_prefix.min(running);
    }
    let hot_duty = (-min_prefix).max(Decimal::ZERO);

    let drift = (solution.x[0] - decimal_to_f64(hot_duty)).abs();
    if drift > CROSS_CHECK_TOLERANCE {
        return Err(HenError::SolverFailure {
            stage: "heat cascade".to_string(),
            status: format!(
                "engine minimum {} drifts {drift} from the exact target {hot_duty}",
                solution.x[0]
            ),
        });
    }

    let mut residuals = Vec::with_capacity(n);
    running = hot_duty;
    for surplus in &balance {
        running += *surplus;
        residuals.push(running);
    }

    let pinch: Vec<usize> = residuals
        .iter()
        .enumerate()
        .filter(|(_, r)| **r == Decimal::ZERO)
        .map(|(t, _)| t)
        .collect();

    let cold_duty = residuals.last().copied().unwrap_or(hot_duty);

    Ok(CascadeSolution {
        hot_utility: vec![(0, hot_duty)],
        cold_utility: vec![(n.saturating_sub(1), cold_duty)],
        residuals,
        pinch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProblemData, Stream, Utility};
    use rust_decimal::dec;

    fn four_stream_problem() -> MinUtilityProblem {
        MinUtilityProblem::new(ProblemData {
            streams: vec![
                Stream::new(dec!(150), dec!(60), dec!(2)).unwrap(),
                Stream::new(dec!(90), dec!(60), dec!(4)).unwrap(),
                Stream::new(dec!(20), dec!(125), dec!(1.5)).unwrap(),
                Stream::new(dec!(25), dec!(100), dec!(3)).unwrap(),
            ],
            hot_utility: Utility::new(dec!(180), dec!(179)).unwrap(),
            cold_utility: Utility::new(dec!(20), dec!(30)).unwrap(),
            dt_min: dec!(10),
        })
        .unwrap()
    }

    #[test]
    fn test_four_stream_targets() {
        let problem = four_stream_problem();
        let solution = solve_min_utility(&problem).unwrap();

        // Cold duty exceeds hot duty by exactly 82.5; the bottom
        // interval pinches and no cold utility is needed
        assert_eq!(solution.hot_duty(), dec!(82.5));
        assert_eq!(solution.cold_duty(), dec!(0));
        assert_eq!(solution.hot_utility, vec![(0, dec!(82.5))]);
        assert_eq!(solution.cold_utility, vec![(5, dec!(0))]);

        assert_eq!(
            solution.residuals,
            vec![
                dec!(112.5),
                dec!(125.0),
                dec!(75.0),
                dec!(120.0),
                dec!(7.5),
                dec!(0.0),
            ]
        );
        assert_eq!(solution.pinch, vec![5]);
    }

    #[test]
    fn test_cascade_non_negative_with_pinch_zero() {
        let problem = four_stream_problem();
        let solution = solve_min_utility(&problem).unwrap();

        assert!(solution.residuals.iter().all(|r| *r >= Decimal::ZERO));
        assert!(
            solution
                .pinch
                .iter()
                .all(|&t| solution.residuals[t] == Decimal::ZERO)
        );
        assert!(!solution.pinch.is_empty());
    }

    #[test]
    fn test_two_stream_nonzero_targets() {
        let problem = MinUtilityProblem::new(ProblemData {
            streams: vec![
                Stream::new(dec!(150), dec!(50), dec!(2)).unwrap(),
                Stream::new(dec!(30), dec!(180), dec!(1)).unwrap(),
            ],
            hot_utility: Utility::new(dec!(200), dec!(199)).unwrap(),
            cold_utility: Utility::new(dec!(20), dec!(25)).unwrap(),
            dt_min: dec!(10),
        })
        .unwrap();

        let solution = solve_min_utility(&problem).unwrap();

        // Balances per interval: -40, +100, -10; QH = 40, QC = 90
        assert_eq!(solution.hot_duty(), dec!(40));
        assert_eq!(solution.cold_duty(), dec!(90));
        assert_eq!(solution.pinch, vec![0]);
    }

    #[test]
    fn test_small_duty_target_stays_exact() {
        // Duty 0.1111 * 0.1234 = 0.01370974 carries eight decimal
        // places; the target must match it exactly, not to some coarser
        // precision
        let problem = MinUtilityProblem::new(ProblemData {
            streams: vec![Stream::new(dec!(20), dec!(20.1111), dec!(0.1234)).unwrap()],
            hot_utility: Utility::new(dec!(200), dec!(199)).unwrap(),
            cold_utility: Utility::new(dec!(5), dec!(10)).unwrap(),
            dt_min: dec!(10),
        })
        .unwrap();

        let solution = solve_min_utility(&problem).unwrap();
        assert_eq!(solution.hot_duty(), dec!(0.01370974));
        assert_eq!(solution.cold_duty(), dec!(0));
        assert_eq!(solution.pinch, vec![0]);
    }

    #[test]
    fn test_all_hot_problem_needs_no_hot_utility() {
        let problem = MinUtilityProblem::new(ProblemData {
            streams: vec![Stream::new(dec!(150), dec!(60), dec!(2)).unwrap()],
            hot_utility: Utility::new(dec!(200), dec!(199)).unwrap(),
            cold_utility: Utility::new(dec!(20), dec!(25)).unwrap(),
            dt_min: dec!(10),
        })
        .unwrap();

        let solution = solve_min_utility(&problem).unwrap();
        assert_eq!(solution.hot_duty(), dec!(0));
        assert_eq!(solution.cold_duty(), dec!(180));
        assert!(solution.pinch.is_empty());
    }
}
