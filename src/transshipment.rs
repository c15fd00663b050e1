use crate::{
    error::Result,
    milp::{MilpOptions, solve_milp},
    network::Network,
    solver::{LpPrimitives, sparse_from_triplets},
    utils::{decimal_to_f64, f64_to_decimal, round_decimal},
};
use faer::sparse::Triplet;
use rust_decimal::Decimal;

#[cfg(feature = "csv")]
use {serde::Serialize, tabled::Tabled};

const FLOW_EPSILON: f64 = 1e-6;

/// Ordered (hot interval, cold interval) pairs with the hot interval at
/// or above the cold interval in the shared grid. Pairings running the
/// other way are unphysical and get no variable at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairGrid {
    n: usize,
}

impl PairGrid {
    fn len(&self) -> usize {
        self.n * (self.n + 1) / 2
    }

    /// Position of (s, t) among the feasible pairs, None when s > t
    fn index(&self, s: usize, t: usize) -> Option<usize> {
        if s > t || t >= self.n {
            return None;
        }
        Some(s * (2 * self.n - s + 1) / 2 + (t - s))
    }

    fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n).flat_map(move |s| (s..self.n).map(move |t| (s, t)))
    }
}

/// The minimum-number-of-matches MILP over a built network.
/// Variables: q[h,s,c,t] >= 0 for the feasible interval pairs, then the
/// binary y[h,c] per stream pair.
#[derive(Debug, Clone)]
pub struct MatchModel {
    hot: Vec<String>,
    cold: Vec<String>,
    n_intervals: usize,
    pairs: PairGrid,
    primitives: LpPrimitives,
}

impl MatchModel {
    /// Formulate the MILP from the network tables:
    /// supply balance per (h, s), demand balance per (c, t), Big-M
    /// linking per (h, c), objective = number of matches used
    pub fn build(network: &Network) -> Result<Self> {
        let n_hot = network.hot().len();
        let n_cold = network.cold().len();
        let n_int = network.intervals().len();
        let pairs = PairGrid { n: n_int };

        let n_q = n_hot * n_cold * pairs.len();
        let n_y = n_hot * n_cold;
        let n_vars = n_q + n_y;

        let q_index = |h: usize, c: usize, pair: usize| (h * n_cold + c) * pairs.len() + pair;
        let y_index = |h: usize, c: usize| n_q + h * n_cold + c;

        // Supply rows, then demand rows
        let n_eq = n_hot * n_int + n_cold * n_int;
        let mut eq_triplets = Vec::new();
        let mut b_eq = vec![0.0; n_eq];

        for h in 0..n_hot {
            for s in 0..n_int {
                b_eq[h * n_int + s] = decimal_to_f64(network.sigma(h, s));
            }
        }
        for c in 0..n_cold {
            for t in 0..n_int {
                b_eq[n_hot * n_int + c * n_int + t] = decimal_to_f64(network.delta(c, t));
            }
        }

        // Each q[h,s,c,t] feeds one supply row and one demand row; the
        // pair enumeration order is the variable order
        for h in 0..n_hot {
            for c in 0..n_cold {
                for (pair, (s, t)) in pairs.iter().enumerate() {
                    let col = q_index(h, c, pair);
                    eq_triplets.push(Triplet::new(h * n_int + s, col, 1.0));
                    eq_triplets.push(Triplet::new(n_hot * n_int + c * n_int + t, col, 1.0));
                }
            }
        }

        // Big-M linking rows, then the unit upper bound on each binary
        let n_ub = 2 * n_y;
        let mut ub_triplets = Vec::new();
        let mut b_ub = vec![0.0; n_ub];

        for h in 0..n_hot {
            for c in 0..n_cold {
                let row = h * n_cold + c;
                for pair in 0..pairs.len() {
                    ub_triplets.push(Triplet::new(row, q_index(h, c, pair), 1.0));
                }
                ub_triplets.push(Triplet::new(
                    row,
                    y_index(h, c),
                    -decimal_to_f64(network.big_m(h, c)),
                ));

                let bound_row = n_y + h * n_cold + c;
                ub_triplets.push(Triplet::new(bound_row, y_index(h, c), 1.0));
                b_ub[bound_row] = 1.0;
            }
        }

        let mut cost = vec![0.0; n_vars];
        for y in &mut cost[n_q..] {
            *y = 1.0;
        }

        let primitives = LpPrimitives {
            cost,
            a_eq: sparse_from_triplets(n_eq, n_vars, &eq_triplets)?,
            b_eq,
            a_ub: sparse_from_triplets(n_ub, n_vars, &ub_triplets)?,
            b_ub,
        };

        Ok(MatchModel {
            hot: network.hot().to_vec(),
            cold: network.cold().to_vec(),
            n_intervals: n_int,
            pairs,
            primitives,
        })
    }

    pub fn n_variables(&self) -> usize {
        self.primitives.cost.len()
    }

    pub fn n_binary(&self) -> usize {
        self.hot.len() * self.cold.len()
    }

    fn n_continuous(&self) -> usize {
        self.n_variables() - self.n_binary()
    }

    /// Solve by branch-and-bound over the LP relaxation
    pub fn solve(&self, options: &MilpOptions) -> Result<MatchPlan> {
        let n_q = self.n_continuous();
        let binaries: Vec<usize> = (n_q..self.n_variables()).collect();

        let solution = solve_milp(&self.primitives, &binaries, options, "minimum matches")?;

        let q = solution.x[..n_q].to_vec();
        let y = solution.x[n_q..].to_vec();

        let mut matches = Vec::new();
        for (h, hot) in self.hot.iter().enumerate() {
            for (c, cold) in self.cold.iter().enumerate() {
                if y[h * self.cold.len() + c] > 0.5 {
                    matches.push((hot.clone(), cold.clone()));
                }
            }
        }

        Ok(MatchPlan {
            hot: self.hot.clone(),
            cold: self.cold.clone(),
            n_intervals: self.n_intervals,
            pairs: self.pairs,
            q,
            match_count: matches.len(),
            matches,
            solver_status: format!("{:?}", solution.status),
            nodes_explored: solution.nodes_explored,
        })
    }
}

/// One interval-to-interval heat flow in the solved network
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "csv", derive(Serialize, Tabled))]
pub struct HeatFlow {
    pub hot: String,
    pub hot_interval: usize,
    pub cold: String,
    pub cold_interval: usize,
    pub heat: Decimal,
}

/// Solved minimum-matches result: the match set and the heat-flow
/// assignment behind it
#[derive(Debug, Clone)]
pub struct MatchPlan {
    hot: Vec<String>,
    cold: Vec<String>,
    n_intervals: usize,
    pairs: PairGrid,
    q: Vec<f64>,
    /// Stream pairs exchanging heat
    pub matches: Vec<(String, String)>,
    /// MILP objective: number of matches used
    pub match_count: usize,
    /// Raw engine status behind the accepted solution
    pub solver_status: String,
    /// Branch-and-bound nodes visited
    pub nodes_explored: usize,
}

impl MatchPlan {
    /// Heat from hot stream `h` in interval `s` to cold stream `c` in
    /// interval `t`. Zero for pairings running up the temperature scale,
    /// which have no variable in the model.
    pub fn flow(&self, h: usize, s: usize, c: usize, t: usize) -> f64 {
        match self.pairs.index(s, t) {
            Some(pair) => self.q[(h * self.cold.len() + c) * self.pairs.len() + pair],
            None => 0.0,
        }
    }

    pub fn is_match(&self, h: usize, c: usize) -> bool {
        self.matches
            .contains(&(self.hot[h].clone(), self.cold[c].clone()))
    }

    pub fn n_intervals(&self) -> usize {
        self.n_intervals
    }

    /// All strictly positive flows, rounded for reporting
    pub fn heat_flows(&self) -> Vec<HeatFlow> {
        let mut flows = Vec::new();
        for (h, hot) in self.hot.iter().enumerate() {
            for (c, cold) in self.cold.iter().enumerate() {
                for (s, t) in self.pairs.iter() {
                    let value = self.flow(h, s, c, t);
                    if value > FLOW_EPSILON {
                        flows.push(HeatFlow {
                            hot: hot.clone(),
                            hot_interval: s,
                            cold: cold.clone(),
                            cold_interval: t,
                            heat: round_decimal(f64_to_decimal(value)),
                        });
                    }
                }
            }
        }
        flows
    }
}

/// Formulate and solve the minimum-matches MILP for a built network
pub fn solve_min_matches(network: &Network, options: &MilpOptions) -> Result<MatchPlan> {
    MatchModel::build(network)?.solve(options)
}
