use crate::*;

// Simple brute-force implementation used as a reference in tests
pub(crate) fn solve_brute_force(f: &Formula) -> SatResult {
    solve_brute_force_with_assumptions(f, &[])
}

pub(crate) fn solve_brute_force_with_assumptions(f: &Formula, assumptions: &[Literal]) -> SatResult {
    let num_variables = assumptions
        .iter()
        .map(Literal::idx)
        .chain(std::iter::once(f.num_variables()))
        .max()
        .unwrap_or(0);
    assert!(num_variables <= 15); // just for safety

    // variable x is bit x - 1
    fn assignment_for(assignment: u32, x: usize) -> bool {
        assignment & (1 << (x - 1)) == 0
    }

    'search: for assignment in 0..2u32.pow(num_variables as u32) {
        for literal in assumptions {
            if assignment_for(assignment, literal.idx()) != literal.is_positive() {
                continue 'search;
            }
        }
        'clauses: for clause in f.clauses() {
            for literal in clause.literals() {
                if assignment_for(assignment, literal.idx()) == literal.is_positive() {
                    // this clause is satisfied, let's go to the next one
                    continue 'clauses;
                }
            }
            // if we got here, this clause was not satisfied, so this assignment is bogus
            continue 'search;
        }
        // if we got here, every clause was satisfied, so we're done and satisfiable
        return SatResult::Satisfiable;
    }
    // no assignment is valid
    SatResult::Unsatisfiable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p};

    #[test]
    fn solve_bcp_sat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let f = Formula::new(vec![c1, c2]);

        assert_eq!(solve_brute_force(&f), SatResult::Satisfiable);
        assert_eq!(
            solve_brute_force_with_assumptions(&f, &[n(2)]),
            SatResult::Unsatisfiable
        );
    }

    #[test]
    fn solve_conflict_unsat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let c3 = Clause::new(vec![n(2)]);
        let f = Formula::new(vec![c1, c2, c3]);

        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
    }

    #[test]
    fn contradicting_assumptions() {
        let f = Formula::new(vec![]);
        assert_eq!(solve_brute_force(&f), SatResult::Satisfiable);
        assert_eq!(
            solve_brute_force_with_assumptions(&f, &[p(3), n(3)]),
            SatResult::Unsatisfiable
        );
    }
}
