//! Thin incremental SAT interface for equivalence queries
//!
//! All solver types stay behind this module; the rest of the crate only
//! sees plain `u32` variable handles.

use rustsat::clause;
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit};
use rustsat_cadical::CaDiCaL;

/// Outcome of a single equivalence query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    /// Satisfiable under the current assumptions
    Sat,
    /// Unsatisfiable under the current assumptions
    Unsat,
    /// The solver gave up; callers must leave the pair unresolved
    Unknown,
}

/// Incremental solver with an assumption set, backed by CaDiCaL
pub struct SatSolver {
    solver: CaDiCaL<'static, 'static>,
    nb_vars: u32,
    assumptions: Vec<Lit>,
    failed: bool,
}

impl SatSolver {
    /// Create a fresh solver without any variables
    pub fn new() -> SatSolver {
        SatSolver {
            solver: CaDiCaL::default(),
            nb_vars: 0,
            assumptions: Vec::new(),
            failed: false,
        }
    }

    /// Allocate a fresh variable
    pub fn new_var(&mut self) -> u32 {
        let v = self.nb_vars;
        self.nb_vars += 1;
        v
    }

    fn lit(var: u32, inverted: bool) -> Lit {
        let l = Lit::positive(var);
        if inverted {
            !l
        } else {
            l
        }
    }

    fn add(&mut self, clause: Clause) {
        if self.solver.add_clause(clause).is_err() {
            self.failed = true;
        }
    }

    /// Assert `out = (a ^ a_inv) & (b ^ b_inv)`
    pub fn add_and_clauses(&mut self, out: u32, a: u32, a_inv: bool, b: u32, b_inv: bool) {
        let o = Self::lit(out, false);
        let la = Self::lit(a, a_inv);
        let lb = Self::lit(b, b_inv);
        self.add(clause![la, !o]);
        self.add(clause![lb, !o]);
        self.add(clause![!la, !lb, o]);
    }

    /// Assert `out = (a ^ a_inv) ^ (b ^ b_inv)`
    pub fn add_xor_clauses(&mut self, out: u32, a: u32, a_inv: bool, b: u32, b_inv: bool) {
        let o = Self::lit(out, false);
        let la = Self::lit(a, a_inv);
        let lb = Self::lit(b, b_inv);
        self.add(clause![la, lb, !o]);
        self.add(clause![!la, !lb, !o]);
        self.add(clause![!la, lb, o]);
        self.add(clause![la, !lb, o]);
    }

    /// Add a variable to the assumption set of the next solve
    pub fn assume(&mut self, var: u32, value: bool) {
        self.assumptions.push(Self::lit(var, !value));
    }

    /// Drop every pending assumption
    pub fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    /// Solve under the current assumptions
    pub fn solve(&mut self) -> SatResult {
        if self.failed {
            return SatResult::Unknown;
        }
        match self.solver.solve_assumps(&self.assumptions) {
            Ok(SolverResult::Sat) => SatResult::Sat,
            Ok(SolverResult::Unsat) => SatResult::Unsat,
            _ => SatResult::Unknown,
        }
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}
