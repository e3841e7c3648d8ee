pub mod dimacs;

use std::convert::TryFrom;
use std::fmt::Debug;
use std::fmt::{self, Display, Formatter};

/// A 1-based propositional variable. Index 0 is never a valid variable.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }

    /// The signed-integer form used by DIMACS and the session API.
    pub fn to_dimacs(&self) -> i32 {
        let v = self.idx() as i32;
        if self.is_positive() {
            v
        } else {
            -v
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InvalidLiteral {
    Zero,
    // i32::MIN has no positive counterpart, so its variable has no literal form
    OutOfRange,
}

impl TryFrom<i32> for Literal {
    type Error = InvalidLiteral;

    fn try_from(l: i32) -> Result<Self, Self::Error> {
        if l == i32::MIN {
            return Err(InvalidLiteral::OutOfRange);
        }
        let var = Variable(l.unsigned_abs() as usize);
        if l > 0 {
            Ok(Literal::Positive(var))
        } else if l < 0 {
            Ok(Literal::Negative(var))
        } else {
            Err(InvalidLiteral::Zero)
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Literal::Positive(Variable(x)) => write!(f, "{}", x),
            Literal::Negative(Variable(x)) => write!(f, "!{}", x),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: disjuncts.into_iter().collect(),
        }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn to_dimacs(&self) -> Vec<i32> {
        self.literals.iter().map(Literal::to_dimacs).collect()
    }

    /// Sorts the literals and drops duplicates. Returns `None` if the clause
    /// contains a literal and its negation.
    pub(crate) fn normalized(mut self) -> Option<Self> {
        self.literals.sort_by_key(|l| (l.idx(), !l.is_positive()));
        self.literals.dedup();
        let tautology = self
            .literals
            .windows(2)
            .any(|w| w[0].variable() == w[1].variable());
        if tautology {
            None
        } else {
            Some(self)
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("(")?;
        let mut first_literal = true;
        for literal in &self.literals {
            if first_literal {
                first_literal = false;
            } else {
                f.write_str(" | ")?;
            }
            write!(f, "{}", literal)?;
        }
        f.write_str(")")
    }
}

#[derive(Clone)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    pub fn new(conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: conjuncts.into_iter().collect(),
        }
    }

    /// The largest variable index mentioned, or 0 for a formula without literals.
    pub fn num_variables(&self) -> usize {
        self.clauses
            .iter()
            .flat_map(|clause| clause.literals.iter().map(Literal::idx))
            .max()
            .unwrap_or(0)
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub(crate) fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }

    pub fn to_dimacs(&self) -> Vec<Vec<i32>> {
        self.clauses.iter().map(Clause::to_dimacs).collect()
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut first_clause = true;
        for clause in &self.clauses {
            if first_clause {
                first_clause = false;
            } else {
                f.write_str(" & ")?;
            }
            if clause.literals.len() > 1 {
                f.write_str("(")?;
            }
            let mut first_literal = true;
            for literal in &clause.literals {
                if first_literal {
                    first_literal = false;
                } else {
                    f.write_str(" | ")?;
                }
                write!(f, "{}", literal)?;
            }
            if clause.literals.len() > 1 {
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

#[cfg(test)]
pub(crate) fn literal_strategy(num_variables: usize) -> impl proptest::strategy::Strategy<Value = Literal> {
    use proptest::prelude::*;

    (1..=num_variables, any::<bool>()).prop_map(|(x, positive)| if positive { p(x) } else { n(x) })
}

// Small random 3-SAT instances, few enough variables for the brute-force solver
#[cfg(test)]
pub(crate) fn formula_3sat_strategy() -> impl proptest::strategy::Strategy<Value = Formula> {
    use proptest::collection::vec;
    use proptest::prelude::*;

    (1usize..=10)
        .prop_flat_map(|num_variables| vec(vec(literal_strategy(num_variables), 3), 1..40))
        .prop_map(|clauses| Formula::new(clauses.into_iter().map(Clause::new)))
}
