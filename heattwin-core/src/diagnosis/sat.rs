//! Boolean satisfiability
//!
//! A small DPLL solver: unit propagation plus chronological backtracking.
//! Diagnosis instances have a few dozen variables and about as many clauses,
//! so the solver favours simplicity over clause learning. Each consistency
//! check builds a fresh [`Solver`]; nothing carries over between checks.

use std::fmt;
use std::ops::Not;

/// Variable index, starting at 1
pub type Var = u32;

/// A variable or its negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    var: Var,
    negated: bool,
}

impl Lit {
    /// The variable itself
    pub fn positive(var: Var) -> Self {
        Self { var, negated: false }
    }

    /// The negation of the variable
    pub fn negative(var: Var) -> Self {
        Self { var, negated: true }
    }

    /// Underlying variable
    pub fn var(self) -> Var {
        self.var
    }

    /// Whether this is a negative literal
    pub fn is_negated(self) -> bool {
        self.negated
    }

    fn value(self, assignment: &[Option<bool>]) -> Option<bool> {
        assignment[self.var as usize].map(|v| v != self.negated)
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-{}", self.var)
        } else {
            write!(f, "{}", self.var)
        }
    }
}

enum Propagation {
    Conflict,
    Stable,
}

/// CNF formula with a DPLL search
#[derive(Debug, Clone, Default)]
pub struct Solver {
    clauses: Vec<Vec<Lit>>,
    num_vars: usize,
    model: Option<Vec<Option<bool>>>,
}

impl Solver {
    /// Empty formula (satisfiable)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disjunction of literals; an empty clause makes the formula unsatisfiable
    pub fn add_clause<I>(&mut self, literals: I)
    where
        I: IntoIterator<Item = Lit>,
    {
        let clause: Vec<Lit> = literals.into_iter().collect();
        if let Some(max) = clause.iter().map(|l| l.var as usize).max() {
            self.num_vars = self.num_vars.max(max);
        }
        self.clauses.push(clause);
    }

    /// Number of clauses added
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Decide satisfiability
    pub fn solve(&mut self) -> bool {
        let mut assignment = vec![None; self.num_vars + 1];
        let satisfiable = self.search(&mut assignment);
        self.model = satisfiable.then_some(assignment);
        satisfiable
    }

    /// Value of `var` in the model found by the last successful [`Solver::solve`]
    ///
    /// Variables left unconstrained by the search read as `false`.
    pub fn value(&self, var: Var) -> Option<bool> {
        let model = self.model.as_ref()?;
        model.get(var as usize).map(|v| v.unwrap_or(false))
    }

    fn search(&self, assignment: &mut [Option<bool>]) -> bool {
        let mut trail = Vec::new();
        if let Propagation::Conflict = self.propagate(assignment, &mut trail) {
            undo(assignment, &trail);
            return false;
        }

        let Some(var) = (1..assignment.len()).find(|&v| assignment[v].is_none()) else {
            return true;
        };

        for value in [true, false] {
            assignment[var] = Some(value);
            if self.search(assignment) {
                return true;
            }
        }
        assignment[var] = None;
        undo(assignment, &trail);
        false
    }

    /// Assign every unit literal until nothing changes or a clause is falsified
    fn propagate(&self, assignment: &mut [Option<bool>], trail: &mut Vec<Var>) -> Propagation {
        loop {
            let mut changed = false;
            for clause in &self.clauses {
                let mut unassigned = None;
                let mut open = 0;
                let mut satisfied = false;

                for &lit in clause {
                    match lit.value(assignment) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            open += 1;
                            unassigned = Some(lit);
                        }
                    }
                }

                if satisfied {
                    continue;
                }
                match (open, unassigned) {
                    (0, _) => return Propagation::Conflict,
                    (1, Some(lit)) => {
                        assignment[lit.var as usize] = Some(!lit.negated);
                        trail.push(lit.var);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return Propagation::Stable;
            }
        }
    }
}

fn undo(assignment: &mut [Option<bool>], trail: &[Var]) {
    for &var in trail {
        assignment[var as usize] = None;
    }
}
