use crate::formula::{Clause, Formula, InvalidLiteral, Literal, Variable};
use crate::{SatResult, Solver};
use log::debug;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionError {
    /// `0` was passed where a literal or variable is expected.
    ZeroLiteral,
    /// `i32::MIN` was passed, or a variable beyond `i32::MAX` would be needed.
    LiteralOutOfRange,
    /// A model was requested without a preceding satisfiable `solve`.
    NoModel,
}

impl From<InvalidLiteral> for SessionError {
    fn from(e: InvalidLiteral) -> Self {
        match e {
            InvalidLiteral::Zero => SessionError::ZeroLiteral,
            InvalidLiteral::OutOfRange => SessionError::LiteralOutOfRange,
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SessionError::ZeroLiteral => f.write_str("0 is not a literal"),
            SessionError::LiteralOutOfRange => f.write_str("literal out of range"),
            SessionError::NoModel => f.write_str("no model: the last solve was not satisfiable"),
        }
    }
}

impl std::error::Error for SessionError {}

pub struct Session {
    solver: Solver,
    max_var: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            max_var: 0,
        }
    }

    pub fn signature() -> &'static str {
        concat!("solbert-", env!("CARGO_PKG_VERSION"))
    }

    /// Appends `clauses` to the clause database. Nothing is added if any clause holds an invalid
    /// literal.
    pub fn add<C: AsRef<[i32]>>(&mut self, clauses: &[C]) -> Result<(), SessionError> {
        let clauses = clauses
            .iter()
            .map(|clause| to_literals(clause.as_ref()).map(Clause::new))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("adding {} clauses", clauses.len());
        for clause in clauses {
            self.add_clause(clause);
        }
        Ok(())
    }

    pub fn add_formula(&mut self, formula: &Formula) {
        for clause in formula.clauses() {
            self.add_clause(clause.clone());
        }
    }

    fn add_clause(&mut self, clause: Clause) {
        if let Some(max) = clause.literals().map(Literal::idx).max() {
            self.max_var = self.max_var.max(max);
        }
        self.solver.add_clause(clause);
    }

    /// Returns whether the clause database is satisfiable with every literal in `assumptions`
    /// true. Assumptions only hold for this call.
    pub fn solve(&mut self, assumptions: &[i32]) -> Result<bool, SessionError> {
        let assumptions = to_literals(assumptions)?;
        let result = self.solver.solve_with_assumptions(&assumptions);
        debug!(
            "solve under {} assumptions: {:?}",
            assumptions.len(),
            result
        );
        Ok(result == SatResult::Satisfiable)
    }

    /// For each variable in `vars` (its sign is ignored) the literal that is true in the model
    /// of the last successful `solve`.
    pub fn get_model(&self, vars: &[i32]) -> Result<Vec<i32>, SessionError> {
        let model = self.solver.model().ok_or(SessionError::NoModel)?;
        vars.iter()
            .map(|&v| -> Result<i32, SessionError> {
                let literal = Literal::try_from(v)?;
                Ok(model.literal(*literal.variable()).to_dimacs())
            })
            .collect()
    }

    /// The model over every variable from 1 to [`Session::max_var`].
    pub fn full_model(&self) -> Result<Vec<i32>, SessionError> {
        let model = self.solver.model().ok_or(SessionError::NoModel)?;
        Ok((1..=self.max_var)
            .map(|v| model.literal(Variable(v)).to_dimacs())
            .collect())
    }

    /// The largest variable that appeared in an added clause.
    pub fn max_var(&self) -> usize {
        self.max_var
    }
}

fn to_literals(lits: &[i32]) -> Result<Vec<Literal>, InvalidLiteral> {
    lits.iter().map(|&l| Literal::try_from(l)).collect()
}
