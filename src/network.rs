use crate::{
    cascade::CascadeSolution,
    error::{HenError, Result},
    problem::{MinUtilityProblem, TemperatureInterval, intervals_from_breakpoints},
};
use rust_decimal::Decimal;

/// Identifier of the hot utility stream in the network
pub const HOT_UTILITY: &str = "HU";
/// Identifier of the cold utility stream in the network
pub const COLD_UTILITY: &str = "CU";

/// Transshipment superstructure: hot and cold stream sets (utilities
/// included), the shared interval grid, per-stream per-interval heat
/// supply and demand, and pairwise Big-M bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    hot: Vec<String>,
    cold: Vec<String>,
    intervals: Vec<TemperatureInterval>,
    sigma: Vec<Vec<Decimal>>,
    delta: Vec<Vec<Decimal>>,
    big_m: Vec<Vec<Decimal>>,
}

impl Network {
    /// Build the superstructure from a problem and its minimum-utility
    /// solution. The grid is re-derived with the utility temperature
    /// spans included, which may extend the range beyond the process
    /// streams. Rebuilding from identical inputs is bit-identical.
    pub fn build(problem: &MinUtilityProblem, targets: &CascadeSolution) -> Result<Network> {
        let mut breakpoints = Vec::new();
        let mut hot_spans = Vec::new();
        let mut cold_spans = Vec::new();

        for stream in problem.streams() {
            let span = problem.shifted_stream_span(stream);
            breakpoints.push(span.0);
            breakpoints.push(span.1);
            if stream.is_hot() {
                hot_spans.push((format!("H{}", hot_spans.len() + 1), span, stream.fcp()));
            } else {
                cold_spans.push((format!("C{}", cold_spans.len() + 1), span, stream.fcp()));
            }
        }

        let hu_span = problem.shifted_utility_span(problem.hot_utility());
        let cu_span = problem.shifted_utility_span(problem.cold_utility());
        breakpoints.extend([hu_span.0, hu_span.1, cu_span.0, cu_span.1]);

        let intervals = intervals_from_breakpoints(breakpoints);

        let mut hot: Vec<String> = hot_spans.iter().map(|(id, _, _)| id.clone()).collect();
        let mut cold: Vec<String> = cold_spans.iter().map(|(id, _, _)| id.clone()).collect();

        let mut sigma: Vec<Vec<Decimal>> = hot_spans
            .iter()
            .map(|(_, span, fcp)| per_interval_load(&intervals, *span, *fcp))
            .collect();
        let mut delta: Vec<Vec<Decimal>> = cold_spans
            .iter()
            .map(|(_, span, fcp)| per_interval_load(&intervals, *span, *fcp))
            .collect();

        hot.push(HOT_UTILITY.to_string());
        sigma.push(utility_row(
            &intervals,
            hu_span,
            targets.hot_duty(),
            true,
            HOT_UTILITY,
        )?);

        cold.push(COLD_UTILITY.to_string());
        delta.push(utility_row(
            &intervals,
            cu_span,
            targets.cold_duty(),
            false,
            COLD_UTILITY,
        )?);

        let hot_duties: Vec<Decimal> = sigma.iter().map(|row| row.iter().copied().sum()).collect();
        let cold_duties: Vec<Decimal> = delta.iter().map(|row| row.iter().copied().sum()).collect();

        let big_m: Vec<Vec<Decimal>> = hot_duties
            .iter()
            .map(|&qh| cold_duties.iter().map(|&qc| qh.min(qc)).collect())
            .collect();

        Ok(Network {
            hot,
            cold,
            intervals,
            sigma,
            delta,
            big_m,
        })
    }

    /// Hot stream identifiers, hot utility last
    pub fn hot(&self) -> &[String] {
        &self.hot
    }

    /// Cold stream identifiers, cold utility last
    pub fn cold(&self) -> &[String] {
        &self.cold
    }

    /// The shared temperature-interval grid, hottest first
    pub fn intervals(&self) -> &[TemperatureInterval] {
        &self.intervals
    }

    /// Heat available from hot stream `h` in interval `t`
    pub fn sigma(&self, h: usize, t: usize) -> Decimal {
        self.sigma[h][t]
    }

    /// Heat required by cold stream `c` in interval `t`
    pub fn delta(&self, c: usize, t: usize) -> Decimal {
        self.delta[c][t]
    }

    /// Big-M bound for the pair: min of the two total duties
    pub fn big_m(&self, h: usize, c: usize) -> Decimal {
        self.big_m[h][c]
    }

    /// Total duty of hot stream `h`
    pub fn hot_duty(&self, h: usize) -> Decimal {
        self.sigma[h].iter().copied().sum()
    }

    /// Total duty of cold stream `c`
    pub fn cold_duty(&self, c: usize) -> Decimal {
        self.delta[c].iter().copied().sum()
    }
}

/// Overlap-proportional heat load of a process stream per interval
fn per_interval_load(
    intervals: &[TemperatureInterval],
    span: (Decimal, Decimal),
    fcp: Decimal,
) -> Vec<Decimal> {
    intervals
        .iter()
        .map(|interval| fcp * interval.overlap(span))
        .collect()
}

/// Utility row: the whole solved duty sits in the hottest (hot utility)
/// or coldest (cold utility) interval overlapping the utility span.
fn utility_row(
    intervals: &[TemperatureInterval],
    span: (Decimal, Decimal),
    duty: Decimal,
    hottest: bool,
    id: &str,
) -> Result<Vec<Decimal>> {
    let mut row = vec![Decimal::ZERO; intervals.len()];
    if duty == Decimal::ZERO {
        return Ok(row);
    }

    let candidates = intervals
        .iter()
        .enumerate()
        .filter(|(_, interval)| interval.overlap(span) > Decimal::ZERO)
        .map(|(t, _)| t);
    let slot = if hottest {
        candidates.min()
    } else {
        candidates.max()
    };

    match slot {
        Some(t) => {
            row[t] = duty;
            Ok(row)
        }
        None => Err(HenError::ModelConstruction(format!(
            "utility {id} overlaps no temperature interval"
        ))),
    }
}
