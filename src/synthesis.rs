use crate::{
    cascade::solve_min_utility_with_tolerance,
    error::Result,
    milp::MilpOptions,
    network::Network,
    problem::MinUtilityProblem,
    transshipment::{HeatFlow, solve_min_matches},
};
use derive_builder::Builder;
use rust_decimal::Decimal;

/// End-to-end HEN synthesis: utility targeting, superstructure build,
/// and the minimum-matches solve, run stage by stage with each stage
/// consuming an immutable snapshot of its predecessor.
#[derive(Builder)]
pub struct HenSynthesis {
    problem: MinUtilityProblem,
    /// Interior-point tolerance handed to the solving engine
    #[builder(default = "1e-8")]
    tolerance: f64,
    /// Branch-and-bound node budget for the matches MILP
    #[builder(default = "10_000")]
    max_nodes: usize,
}

/// Final synthesis result
#[derive(Debug, Clone)]
pub struct SynthesisReport {
    /// Minimum hot utility duty
    pub hot_utility: Decimal,
    /// Minimum cold utility duty
    pub cold_utility: Decimal,
    /// Shifted temperatures at which the cascade residual is zero
    pub pinch_temperatures: Vec<Decimal>,
    /// Stream pairs exchanging heat in the minimum-matches network
    pub matches: Vec<(String, String)>,
    /// Number of matches (the MILP objective)
    pub match_count: usize,
    /// Interval-resolved heat flows behind the match set
    pub heat_flows: Vec<HeatFlow>,
    /// Raw engine status behind the accepted matches solution
    pub solver_status: String,
    /// Branch-and-bound nodes visited by the matches solve
    pub nodes_explored: usize,
}

impl HenSynthesis {
    /// Run the full pipeline
    pub fn compute(&self) -> Result<SynthesisReport> {
        let targets = solve_min_utility_with_tolerance(&self.problem, self.tolerance)?;

        let intervals = self.problem.temperature_intervals();
        let pinch_temperatures = targets
            .pinch
            .iter()
            .map(|&t| intervals[t].lower)
            .collect();

        let network = Network::build(&self.problem, &targets)?;

        let options = MilpOptions {
            tolerance: self.tolerance,
            max_nodes: self.max_nodes,
        };
        let plan = solve_min_matches(&network, &options)?;

        Ok(SynthesisReport {
            hot_utility: targets.hot_duty(),
            cold_utility: targets.cold_duty(),
            pinch_temperatures,
            matches: plan.matches.clone(),
            match_count: plan.match_count,
            heat_flows: plan.heat_flows(),
            solver_status: plan.solver_status.clone(),
            nodes_explored: plan.nodes_explored,
        })
    }
}
