use crate::error::{HenError, Result};
use clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT},
};
use faer::{Unbind, sparse::SparseColMat};

/// Linear program in the form consumed by the solving engine:
/// minimize cost'x subject to A_eq x = b_eq, A_ub x <= b_ub, x >= 0.
#[derive(Debug, Clone)]
pub(crate) struct LpPrimitives {
    pub cost: Vec<f64>,
    pub a_eq: SparseColMat<usize, f64>,
    pub b_eq: Vec<f64>,
    pub a_ub: SparseColMat<usize, f64>,
    pub b_ub: Vec<f64>,
}

/// Result of solving an LP
#[derive(Debug)]
pub(crate) struct LpSolution {
    pub status: SolverStatus,
    pub objective_value: f64,
    pub x: Vec<f64>,
}

/// Type alias for stacked constraints
type StackedConstraints = (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>);

/// LP solver wrapper for Clarabel
pub(crate) struct LpSolver {
    solver: DefaultSolver<f64>,
}

impl LpSolver {
    /// Create a solver from primitives. Clarabel's standard form is
    /// minimize (1/2)x'Px + q'x subject to Ax + s = b, s in K; for an LP
    /// P = 0, equalities land in the zero cone and inequalities (plus the
    /// non-negativity rows) in the nonnegative cone.
    pub(crate) fn new(primitives: &LpPrimitives, tolerance: f64) -> Result<Self> {
        let n_vars = primitives.cost.len();

        // Zero P matrix (no quadratic objective)
        let p = CscMatrix::new(n_vars, n_vars, vec![0; n_vars + 1], vec![], vec![]);

        let q = primitives.cost.clone();

        let (a, b, cones) = stack_constraints(primitives)?;

        let settings = DefaultSettings::<f64> {
            verbose: false,
            max_iter: 10000,
            tol_gap_abs: tolerance,
            tol_gap_rel: tolerance,
            tol_feas: tolerance,
            ..Default::default()
        };

        let solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings).map_err(|e| {
            HenError::ModelConstruction(format!("failed to create Clarabel solver: {e}"))
        })?;

        Ok(Self { solver })
    }

    /// Solve the LP, mapping solver status into a stage-tagged error
    pub(crate) fn solve(mut self, stage: &str) -> Result<LpSolution> {
        self.solver.solve();

        let info = &self.solver.info;

        match info.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(LpSolution {
                status: info.status,
                objective_value: info.cost_primal,
                x: self.solver.solution.x.clone(),
            }),
            status => Err(HenError::SolverFailure {
                stage: stage.to_string(),
                status: status_reason(status),
            }),
        }
    }
}

fn status_reason(status: SolverStatus) -> String {
    match status {
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            "problem is primal infeasible".to_string()
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            "problem is dual infeasible (unbounded)".to_string()
        }
        SolverStatus::MaxIterations => "maximum iterations reached".to_string(),
        SolverStatus::MaxTime => "time limit reached".to_string(),
        SolverStatus::NumericalError => "numerical error in solver".to_string(),
        SolverStatus::InsufficientProgress => "solver made insufficient progress".to_string(),
        other => format!("unexpected solver status: {other:?}"),
    }
}

/// Stack equality and inequality constraints for Clarabel format
fn stack_constraints(primitives: &LpPrimitives) -> Result<StackedConstraints> {
    let n_vars = primitives.cost.len();
    let n_eq = primitives.a_eq.nrows();
    let n_ineq = primitives.a_ub.nrows();
    let n_nonneg = n_vars;
    let n_constraints = n_eq + n_ineq + n_nonneg;

    if primitives.a_eq.ncols() != n_vars || primitives.a_ub.ncols() != n_vars {
        return Err(HenError::ModelConstruction(format!(
            "constraint matrices disagree on variable count (cost {n_vars}, eq {}, ub {})",
            primitives.a_eq.ncols(),
            primitives.a_ub.ncols()
        )));
    }

    // Stack A_eq, A_ub, and -I (for x >= 0) vertically
    let mut triplets = Vec::new();

    for triplet in primitives.a_eq.triplet_iter() {
        triplets.push((triplet.row.unbound(), triplet.col.unbound(), *triplet.val));
    }

    for triplet in primitives.a_ub.triplet_iter() {
        triplets.push((
            triplet.row.unbound() + n_eq,
            triplet.col.unbound(),
            *triplet.val,
        ));
    }

    let offset = n_eq + n_ineq;
    for i in 0..n_vars {
        triplets.push((offset + i, i, -1.0));
    }

    let a = build_csc_from_triplets(&triplets, n_constraints, n_vars);

    let mut b = Vec::with_capacity(n_constraints);
    b.extend_from_slice(&primitives.b_eq);
    b.extend_from_slice(&primitives.b_ub);
    b.extend(vec![0.0; n_nonneg]);

    let mut cones = Vec::new();
    if n_eq > 0 {
        cones.push(SupportedConeT::ZeroConeT(n_eq));
    }
    if n_ineq + n_nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(n_ineq + n_nonneg));
    }

    Ok((a, b, cones))
}

/// Build CSC matrix from triplets (helper function)
fn build_csc_from_triplets(
    triplets: &[(usize, usize, f64)],
    n_rows: usize,
    n_cols: usize,
) -> CscMatrix<f64> {
    if triplets.is_empty() {
        return CscMatrix::new(n_rows, n_cols, vec![0; n_cols + 1], vec![], vec![]);
    }

    let mut sorted_triplets = triplets.to_vec();
    sorted_triplets.sort_by_key(|&(r, c, _)| (c, r));

    let mut col_ptr = vec![0];
    let mut row_ind = Vec::new();
    let mut values = Vec::new();

    let mut current_col = 0;

    for &(row, col, val) in &sorted_triplets {
        while current_col < col {
            col_ptr.push(row_ind.len());
            current_col += 1;
        }
        row_ind.push(row);
        values.push(val);
    }

    while current_col < n_cols {
        col_ptr.push(row_ind.len());
        current_col += 1;
    }

    CscMatrix::new(n_rows, n_cols, col_ptr, row_ind, values)
}

/// Assemble a faer sparse matrix from triplets, surfacing assembly
/// failures as model construction errors
pub(crate) fn sparse_from_triplets(
    n_rows: usize,
    n_cols: usize,
    triplets: &[faer::sparse::Triplet<usize, usize, f64>],
) -> Result<SparseColMat<usize, f64>> {
    SparseColMat::try_new_from_triplets(n_rows, n_cols, triplets).map_err(|_| {
        HenError::ModelConstruction(format!(
            "failed to assemble {n_rows}x{n_cols} sparse constraint matrix"
        ))
    })
}
