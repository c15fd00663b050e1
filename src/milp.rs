use crate::{
    error::{HenError, Result},
    solver::{LpPrimitives, LpSolver, sparse_from_triplets},
};
use faer::{Unbind, sparse::Triplet};

/// Controls for the branch-and-bound search
#[derive(Debug, Clone, Copy)]
pub struct MilpOptions {
    /// Interior-point tolerance for node relaxations
    pub tolerance: f64,
    /// Node budget before the search is declared failed
    pub max_nodes: usize,
}

impl Default for MilpOptions {
    fn default() -> Self {
        MilpOptions {
            tolerance: 1e-8,
            max_nodes: 10_000,
        }
    }
}

/// An integral solution of the mixed-integer program
#[derive(Debug)]
pub(crate) struct MilpSolution {
    pub objective: f64,
    pub x: Vec<f64>,
    /// Raw engine status of the incumbent's relaxation
    pub status: clarabel::solver::SolverStatus,
    pub nodes_explored: usize,
}

const INTEGRALITY_TOL: f64 = 1e-5;

/// A search node: the binary variables fixed so far
#[derive(Debug, Clone, Default)]
struct Node {
    fixings: Vec<(usize, bool)>,
}

/// Minimize a linear objective with some variables binary, by
/// branch-and-bound over LP relaxations. The base primitives must
/// already bound every binary variable above by one; branching appends
/// rows fixing a binary to zero (x <= 0) or one (-x <= -1). The
/// objective is assumed integral at integer points, so node bounds are
/// pruned against the incumbent by ceiling.
pub(crate) fn solve_milp(
    primitives: &LpPrimitives,
    binaries: &[usize],
    options: &MilpOptions,
    stage: &str,
) -> Result<MilpSolution> {
    let n_vars = primitives.cost.len();
    let base_rows = primitives.a_ub.nrows();
    let base_triplets: Vec<Triplet<usize, usize, f64>> = primitives
        .a_ub
        .triplet_iter()
        .map(|t| Triplet::new(t.row.unbound(), t.col.unbound(), *t.val))
        .collect();

    let mut best: Option<MilpSolution> = None;
    let mut nodes_explored = 0usize;
    let mut stack = vec![Node::default()];

    while let Some(node) = stack.pop() {
        if nodes_explored >= options.max_nodes {
            return Err(HenError::SolverFailure {
                stage: stage.to_string(),
                status: format!("node budget of {} exhausted", options.max_nodes),
            });
        }
        nodes_explored += 1;

        let node_primitives =
            with_fixings(primitives, &base_triplets, base_rows, n_vars, &node.fixings)?;

        let relaxation = match LpSolver::new(&node_primitives, options.tolerance)?.solve(stage) {
            Ok(solution) => solution,
            // An infeasible node is pruned; the root must be feasible
            Err(HenError::SolverFailure { status, .. })
                if status.contains("primal infeasible") && nodes_explored > 1 =>
            {
                continue;
            }
            Err(e) => return Err(e),
        };

        // Integral objective: no integer point in this subtree can beat
        // the incumbent once the rounded-up bound matches it
        let bound = (relaxation.objective_value - 1e-6).ceil();
        if let Some(ref incumbent) = best {
            if bound >= incumbent.objective - 1e-6 {
                continue;
            }
        }

        match most_fractional(&relaxation.x, binaries) {
            None => {
                let objective = relaxation.objective_value.round();
                let replace = best
                    .as_ref()
                    .map(|b| objective < b.objective - 1e-6)
                    .unwrap_or(true);
                if replace {
                    best = Some(MilpSolution {
                        objective,
                        x: relaxation.x,
                        status: relaxation.status,
                        nodes_explored,
                    });
                }
            }
            Some(branch_var) => {
                // Explore the "match used" child first
                let mut fixed_zero = node.fixings.clone();
                fixed_zero.push((branch_var, false));
                stack.push(Node {
                    fixings: fixed_zero,
                });

                let mut fixed_one = node.fixings;
                fixed_one.push((branch_var, true));
                stack.push(Node { fixings: fixed_one });
            }
        }
    }

    match best {
        Some(mut solution) => {
            solution.nodes_explored = nodes_explored;
            Ok(solution)
        }
        None => Err(HenError::SolverFailure {
            stage: stage.to_string(),
            status: "no integral solution found".to_string(),
        }),
    }
}

/// Append branching rows to the base inequality block
fn with_fixings(
    primitives: &LpPrimitives,
    base_triplets: &[Triplet<usize, usize, f64>],
    base_rows: usize,
    n_vars: usize,
    fixings: &[(usize, bool)],
) -> Result<LpPrimitives> {
    if fixings.is_empty() {
        return Ok(primitives.clone());
    }

    let mut triplets = base_triplets.to_vec();
    let mut b_ub = primitives.b_ub.clone();

    for (row, &(var, value)) in fixings.iter().enumerate() {
        if value {
            triplets.push(Triplet::new(base_rows + row, var, -1.0));
            b_ub.push(-1.0);
        } else {
            triplets.push(Triplet::new(base_rows + row, var, 1.0));
            b_ub.push(0.0);
        }
    }

    Ok(LpPrimitives {
        cost: primitives.cost.clone(),
        a_eq: primitives.a_eq.clone(),
        b_eq: primitives.b_eq.clone(),
        a_ub: sparse_from_triplets(base_rows + fixings.len(), n_vars, &triplets)?,
        b_ub,
    })
}

/// The binary variable farthest from integrality, if any
fn most_fractional(x: &[f64], binaries: &[usize]) -> Option<usize> {
    binaries
        .iter()
        .filter_map(|&i| {
            let frac = (x[i] - x[i].round()).abs();
            if frac > INTEGRALITY_TOL {
                Some((i, frac))
            } else {
                None
            }
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
