use crate::formula::Literal;
use crate::session::{Session, SessionError};
use log::{debug, info};
use std::convert::TryFrom;

// The largest formula variable heads a chain of root conjunctions; solving with the chain end
// assumed false forces one of them.
pub struct MonotonicCircuit {
    session: Session,
    chain_end: i32,
    inputs: Vec<i32>,
    prime_implicants: Vec<Vec<i32>>,
}

impl MonotonicCircuit {
    pub fn new<C: AsRef<[i32]>>(formula: &[C], inputs: &[i32]) -> Result<Self, SessionError> {
        let inputs = variables(inputs)?;

        let mut session = Session::new();
        session.add(formula)?;

        // an empty formula has no root, so start the chain at a fresh variable
        let chain_end = match session.max_var() {
            0 => fresh_variable(&session, &inputs, &[])?,
            max => max as i32,
        };
        session.add(&[[chain_end]])?;
        debug!("circuit root {} over {} inputs", chain_end, inputs.len());

        Ok(Self {
            session,
            chain_end,
            inputs,
            prime_implicants: vec![],
        })
    }

    /// Appends `conjunction` to the root disjunction.
    pub fn append_root(&mut self, conjunction: &[i32]) -> Result<(), SessionError> {
        let enc = fresh_variable(&self.session, &self.inputs, &variables(conjunction)?)?;
        let next = enc.checked_add(1).ok_or(SessionError::LiteralOutOfRange)?;
        let mut clauses = vec![vec![-self.chain_end, enc, next]];
        clauses.extend(conjunction.iter().map(|&x| vec![-enc, x]));
        self.session.add(&clauses)?;

        debug!(
            "root conjunction {:?} encoded by {}, chain end {}",
            conjunction, enc, next
        );
        self.chain_end = next;
        Ok(())
    }

    /// Enumerates the prime implicants of the circuit projected on its inputs. Implicants found
    /// by earlier calls stay blocked, so only new ones are added.
    pub fn update_prime_implicants(&mut self) -> Result<(), SessionError> {
        let mut sat = self.solve_root(&[])?;

        while sat {
            while sat {
                let values = self.session.get_model(&self.inputs)?;
                let implicant: Vec<i32> = values.iter().copied().filter(|&l| l > 0).collect();
                // inputs that are false stay false while minimizing
                let facts: Vec<i32> = values.iter().copied().filter(|&l| l < 0).collect();

                let blocking: Vec<i32> = implicant.iter().map(|&v| -v).collect();
                self.session.add(&[blocking])?;

                sat = self.solve_root(&facts)?;
                if !sat {
                    self.record(implicant);
                }
            }
            sat = self.solve_root(&[])?;
        }

        Ok(())
    }

    /// Each prime implicant is the sorted list of inputs that are true in it.
    pub fn prime_implicants(&self) -> &[Vec<i32>] {
        &self.prime_implicants
    }

    fn solve_root(&mut self, assumptions: &[i32]) -> Result<bool, SessionError> {
        let mut assumptions = assumptions.to_vec();
        assumptions.push(-self.chain_end);
        self.session.solve(&assumptions)
    }

    fn record(&mut self, mut implicant: Vec<i32>) {
        implicant.sort_unstable();

        let before = self.prime_implicants.len();
        self.prime_implicants
            .retain(|known| !is_strict_subset(&implicant, known));
        let subsumed = before - self.prime_implicants.len();

        if subsumed > 0 {
            info!(
                "found prime implicant {:?}, subsuming {} previous prime implicants",
                implicant, subsumed
            );
        } else {
            info!("found prime implicant {:?}", implicant);
        }
        self.prime_implicants.push(implicant);
    }
}

// the sign is dropped: inputs and conjunctions are over variables
fn variables(lits: &[i32]) -> Result<Vec<i32>, SessionError> {
    lits.iter()
        .map(|&l| -> Result<i32, SessionError> { Ok(Literal::try_from(l)?.idx() as i32) })
        .collect()
}

fn fresh_variable(
    session: &Session,
    inputs: &[i32],
    conjunction: &[i32],
) -> Result<i32, SessionError> {
    let used = inputs.iter().chain(conjunction).copied().max().unwrap_or(0);
    used.max(session.max_var() as i32)
        .checked_add(1)
        .ok_or(SessionError::LiteralOutOfRange)
}

// both slices are sorted
fn is_strict_subset(subset: &[i32], set: &[i32]) -> bool {
    if subset.len() >= set.len() {
        return false;
    }
    let mut set = set.iter();
    subset.iter().all(|x| set.any(|y| y == x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_env_log::test;

    // 5 & (!5 | 4 | 3) & (!4 | 1) & (!4 | 2): the root 5 holds if 1 and 2, or 3
    fn and_or_circuit() -> MonotonicCircuit {
        let formula = [vec![-5, 4, 3], vec![-4, 1], vec![-4, 2]];
        MonotonicCircuit::new(&formula, &[1, 2, 3]).unwrap()
    }

    fn sorted(mut implicants: Vec<Vec<i32>>) -> Vec<Vec<i32>> {
        implicants.sort();
        implicants
    }

    #[test]
    fn prime_implicants_of_and_or() {
        let mut circuit = and_or_circuit();
        circuit.append_root(&[5]).unwrap();
        circuit.update_prime_implicants().unwrap();

        assert_eq!(
            sorted(circuit.prime_implicants().to_vec()),
            vec![vec![1, 2], vec![3]]
        );

        // everything is blocked now
        circuit.update_prime_implicants().unwrap();
        assert_eq!(circuit.prime_implicants().len(), 2);
    }

    #[test]
    fn no_root_conjunction_means_no_implicants() {
        let mut circuit = and_or_circuit();
        circuit.update_prime_implicants().unwrap();
        assert!(circuit.prime_implicants().is_empty());
    }

    #[test]
    fn root_conjunction_over_inputs() {
        let mut circuit = and_or_circuit();
        // the root disjunction also needs 1 and 3, or 2
        circuit.append_root(&[1, 3]).unwrap();
        circuit.append_root(&[2]).unwrap();
        circuit.update_prime_implicants().unwrap();

        assert_eq!(
            sorted(circuit.prime_implicants().to_vec()),
            vec![vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn empty_formula() {
        let empty: [Vec<i32>; 0] = [];
        let mut circuit = MonotonicCircuit::new(&empty, &[1, 2]).unwrap();
        circuit.append_root(&[1]).unwrap();
        circuit.append_root(&[2]).unwrap();
        circuit.update_prime_implicants().unwrap();

        assert_eq!(
            sorted(circuit.prime_implicants().to_vec()),
            vec![vec![1], vec![2]]
        );
    }

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(
            MonotonicCircuit::new(&[vec![1, 0]], &[1]),
            Err(SessionError::ZeroLiteral)
        ));
        assert!(matches!(
            MonotonicCircuit::new(&[vec![1]], &[0]),
            Err(SessionError::ZeroLiteral)
        ));
        let mut circuit = and_or_circuit();
        assert_eq!(circuit.append_root(&[0]), Err(SessionError::ZeroLiteral));
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            MonotonicCircuit::new(&[vec![1]], &[i32::MIN]),
            Err(SessionError::LiteralOutOfRange)
        ));
        let mut circuit = and_or_circuit();
        assert_eq!(circuit.append_root(&[i32::MIN]), Err(SessionError::LiteralOutOfRange));
        // no room left for the fresh chain variables
        assert_eq!(circuit.append_root(&[i32::MAX]), Err(SessionError::LiteralOutOfRange));
    }

    #[test]
    fn negated_inputs_name_the_same_variables() {
        let formula = [vec![-5, 4, 3], vec![-4, 1], vec![-4, 2]];
        let mut circuit = MonotonicCircuit::new(&formula, &[-1, 2, -3]).unwrap();
        circuit.append_root(&[5]).unwrap();
        circuit.update_prime_implicants().unwrap();
        assert_eq!(
            sorted(circuit.prime_implicants().to_vec()),
            vec![vec![1, 2], vec![3]]
        );
    }

    #[test]
    fn record_drops_strict_supersets() {
        let mut circuit = and_or_circuit();
        circuit.record(vec![3, 1, 2]);
        circuit.record(vec![4]);
        circuit.record(vec![2, 1]);
        assert_eq!(circuit.prime_implicants(), &[vec![4], vec![1, 2]][..]);
    }

    #[test]
    fn strict_subsets() {
        assert!(is_strict_subset(&[1, 3], &[1, 2, 3]));
        assert!(is_strict_subset(&[], &[4]));
        assert!(!is_strict_subset(&[1, 2], &[1, 2]));
        assert!(!is_strict_subset(&[1, 4], &[1, 2, 3]));
        assert!(!is_strict_subset(&[0, 1], &[1, 2, 3]));
    }
}
