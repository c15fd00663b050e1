use crate::{
    error::{HenError, Result},
    types::{ProblemData, ProblemSource, Stream, Utility},
};
use rust_decimal::{Decimal, dec};

/// One temperature interval on the shifted scale, bounded above and below
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemperatureInterval {
    pub upper: Decimal,
    pub lower: Decimal,
}

impl TemperatureInterval {
    /// Overlap length between a shifted stream span and this interval
    pub fn overlap(&self, span: (Decimal, Decimal)) -> Decimal {
        let (hi, lo) = span;
        let top = hi.min(self.upper);
        let bottom = lo.max(self.lower);
        if top > bottom {
            top - bottom
        } else {
            Decimal::ZERO
        }
    }
}

/// Build the ordered interval grid from a set of shifted breakpoints,
/// hottest interval first. Breakpoints are deduplicated exactly, so the
/// grid is contiguous and non-overlapping by construction.
pub(crate) fn intervals_from_breakpoints(mut breakpoints: Vec<Decimal>) -> Vec<TemperatureInterval> {
    breakpoints.sort_by(|a, b| b.cmp(a));
    breakpoints.dedup();
    breakpoints
        .windows(2)
        .map(|w| TemperatureInterval {
            upper: w[0],
            lower: w[1],
        })
        .collect()
}

/// The minimum-utility problem: process streams on one shifted
/// temperature scale, decomposed into temperature intervals.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct MinUtilityProblem {
    streams: Vec<Stream>,
    hot_utility: Utility,
    cold_utility: Utility,
    dt_min: Decimal,
    intervals: Vec<TemperatureInterval>,
}

impl MinUtilityProblem {
    pub fn new(data: ProblemData) -> Result<Self> {
        if data.streams.is_empty() {
            return Err(HenError::InvalidProblem(
                "problem defines no process streams".to_string(),
            ));
        }
        if data.dt_min <= Decimal::ZERO {
            return Err(HenError::InvalidProblem(format!(
                "minimum approach temperature must be positive, got {}",
                data.dt_min
            )));
        }
        if !data.hot_utility.is_hot() {
            return Err(HenError::InvalidProblem(
                "hot utility must run hot to cold".to_string(),
            ));
        }
        if data.cold_utility.is_hot() {
            return Err(HenError::InvalidProblem(
                "cold utility must run cold to hot".to_string(),
            ));
        }

        let mut breakpoints = Vec::with_capacity(2 * data.streams.len());
        for stream in &data.streams {
            let (hi, lo) = shifted_span(stream.tin(), stream.tout(), stream.is_hot(), data.dt_min);
            breakpoints.push(hi);
            breakpoints.push(lo);
        }
        let intervals = intervals_from_breakpoints(breakpoints);

        Ok(MinUtilityProblem {
            streams: data.streams,
            hot_utility: data.hot_utility,
            cold_utility: data.cold_utility,
            dt_min: data.dt_min,
            intervals,
        })
    }

    /// Load a named problem instance from an injected data source
    pub fn from_source(source: &impl ProblemSource, id: &str) -> Result<Self> {
        Self::new(source.load(id)?)
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn hot_utility(&self) -> &Utility {
        &self.hot_utility
    }

    pub fn cold_utility(&self) -> &Utility {
        &self.cold_utility
    }

    pub fn dt_min(&self) -> Decimal {
        self.dt_min
    }

    /// The ordered interval grid over the process streams, hottest first
    pub fn temperature_intervals(&self) -> &[TemperatureInterval] {
        &self.intervals
    }

    /// Shifted temperature span of a process stream
    pub(crate) fn shifted_stream_span(&self, stream: &Stream) -> (Decimal, Decimal) {
        shifted_span(stream.tin(), stream.tout(), stream.is_hot(), self.dt_min)
    }

    /// Shifted temperature span of a utility stream
    pub(crate) fn shifted_utility_span(&self, utility: &Utility) -> (Decimal, Decimal) {
        shifted_span(utility.tin(), utility.tout(), utility.is_hot(), self.dt_min)
    }

    /// Net heat surplus per interval: hot-stream release minus cold-stream
    /// absorption, each stream contributing FCp times its overlap with the
    /// interval. Streams spanning foreign breakpoints split proportionally.
    pub fn interval_heat_balance(&self) -> Vec<Decimal> {
        self.intervals
            .iter()
            .map(|interval| {
                let mut net = Decimal::ZERO;
                for stream in &self.streams {
                    let span = self.shifted_stream_span(stream);
                    let contribution = stream.fcp() * interval.overlap(span);
                    if stream.is_hot() {
                        net += contribution;
                    } else {
                        net -= contribution;
                    }
                }
                net
            })
            .collect()
    }
}

/// Shifted span of a stream: hot temperatures drop by ΔTmin/2, cold rise
/// by ΔTmin/2, placing both populations on one comparable scale.
/// Returned as (high, low).
fn shifted_span(tin: Decimal, tout: Decimal, is_hot: bool, dt_min: Decimal) -> (Decimal, Decimal) {
    let half = dt_min / dec!(2);
    let shift = if is_hot { -half } else { half };
    let a = tin + shift;
    let b = tout + shift;
    if a > b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InMemorySource;
    use rust_decimal::dec;

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
    fn test_interval_grid() {
        let problem = MinUtilityProblem::new(four_stream_data()).unwrap();
        let intervals = problem.temperature_intervals();

        // Shifted breakpoints: 145, 130, 105, 85, 55, 30, 25
        assert_eq!(intervals.len(), 6);
        assert_eq!(intervals[0].upper, dec!(145));
        assert_eq!(intervals[0].lower, dec!(130));
        assert_eq!(intervals[5].upper, dec!(30));
        assert_eq!(intervals[5].lower, dec!(25));

        // Contiguous, non-overlapping coverage
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].lower, pair[1].upper);
        }
    }

    #[test]
    fn test_interval_heat_balance() {
        let problem = MinUtilityProblem::new(four_stream_data()).unwrap();
        let balance = problem.interval_heat_balance();

        assert_eq!(
            balance,
            vec![
                dec!(30),
                dec!(12.5),
                dec!(-50),
                dec!(45),
                dec!(-112.5),
                dec!(-7.5),
            ]
        );
    }

    #[test]
    fn test_overlap_splits_across_foreign_breakpoints() {
        let problem = MinUtilityProblem::new(four_stream_data()).unwrap();
        let intervals = problem.temperature_intervals();

        // H1 (150 -> 60, shifted 145 -> 55) spans the first four intervals
        let h1 = &problem.streams()[0];
        let span = problem.shifted_stream_span(h1);
        let total: Decimal = intervals.iter().map(|i| i.overlap(span) * h1.fcp()).sum();
        assert_eq!(total, h1.heat());

        // No presence below 55
        assert_eq!(intervals[4].overlap(span), Decimal::ZERO);
    }

    #[test]
    fn test_from_source_unknown_problem() {
        let source = InMemorySource::new();
        let err = MinUtilityProblem::from_source(&source, "balanced5").unwrap_err();
        assert!(matches!(err, HenError::UnknownProblem { .. }));
    }

    #[test]
    fn test_rejects_bad_dt_min() {
        let mut data = four_stream_data();
        data.dt_min = dec!(0);
        assert!(matches!(
            MinUtilityProblem::new(data),
            Err(HenError::InvalidProblem(_))
        ));
    }
}
