pub mod circuit;
pub mod demo;
pub mod formula;
pub mod session;
mod solver;

#[cfg(test)]
mod brute_force;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
}

pub use circuit::MonotonicCircuit;
pub use formula::{Clause, Formula, Literal, Variable};
pub use session::{Session, SessionError};
pub use solver::{Model, Solver};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::dimacs::parse;
    use test_env_log::test;

    #[test]
    fn session_agrees_with_solver() {
        let f = parse("p cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n".as_bytes()).unwrap();

        let mut solver = Solver::with_formula(f.clone());
        let mut session = Session::new();
        session.add(&f.to_dimacs()).unwrap();

        assert_eq!(solver.solve(), SatResult::Satisfiable);
        assert_eq!(session.solve(&[]), Ok(true));

        let model = solver.model().unwrap();
        let expected: Vec<i32> = (1..=3).map(|v| model.literal(Variable(v)).to_dimacs()).collect();
        assert_eq!(session.full_model(), Ok(expected));
    }

    #[test]
    fn session_unsat_under_assumptions_only() {
        let mut session = Session::new();
        session.add(&[vec![1, 2], vec![-1, 2], vec![1, -2]]).unwrap();
        assert_eq!(session.solve(&[-1]), Ok(false));
        assert_eq!(session.solve(&[-2]), Ok(false));
        assert_eq!(session.solve(&[]), Ok(true));
        assert_eq!(session.get_model(&[1, 2]), Ok(vec![1, 2]));

        session.add(&[[-1, -2]]).unwrap();
        assert_eq!(session.solve(&[]), Ok(false));
    }
}
