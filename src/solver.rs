use crate::formula::{Clause, Formula, Literal, Variable};
use crate::SatResult;
use log::trace;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Assignment {
    True,
    False,
    Undecided,
}

/// An incremental CDCL solver.
///
/// Clauses can be added between calls to [`Solver::solve_with_assumptions`]; clauses learned
/// during a call are implied by the clause database alone and are kept for later calls.
/// Outside of a call the solver is always at decision level 0.
pub struct Solver {
    clauses: Vec<Clause>,
    state: SolverState,
    model: Option<Model>,
}

#[derive(Debug)]
struct SolverState {
    // indexed by variable; slot 0 is never assigned
    variables: Vec<VariableState>,
    trail: Vec<Variable>,
    decision_level: DecisionLevel,
}

#[derive(Debug, Clone)]
struct VariableState {
    assignment: Assignment,
    reason: Option<ClauseIdx>,
    decision_level: DecisionLevel,
}

impl VariableState {
    fn literal(&self, v: Variable) -> Literal {
        match self.assignment {
            Assignment::Undecided => panic!("cannot get literal for unassigned variable"),
            Assignment::True => Literal::Positive(v),
            Assignment::False => Literal::Negative(v),
        }
    }
    fn clear(&mut self) {
        self.assignment = Assignment::Undecided;
        self.reason = None;
        self.decision_level = DecisionLevel(0);
    }
}

impl Default for VariableState {
    fn default() -> Self {
        VariableState {
            assignment: Assignment::Undecided,
            reason: None,
            decision_level: DecisionLevel(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClauseIdx(usize);

impl SolverState {
    fn new() -> Self {
        Self {
            variables: vec![VariableState::default()],
            trail: vec![],
            decision_level: DecisionLevel(0),
        }
    }

    fn ensure_variable(&mut self, v: &Variable) {
        debug_assert!(v.0 > 0, "variable indices start at 1");
        if v.0 >= self.variables.len() {
            self.variables.resize(v.0 + 1, VariableState::default());
        }
    }

    fn assignment_for(&self, literal: &Literal) -> Assignment {
        match self.variables[literal.idx()].assignment {
            Assignment::True => {
                if literal.is_positive() {
                    Assignment::True
                } else {
                    Assignment::False
                }
            }
            Assignment::False => {
                if literal.is_positive() {
                    Assignment::False
                } else {
                    Assignment::True
                }
            }
            Assignment::Undecided => Assignment::Undecided,
        }
    }

    fn assign(&mut self, literal: &Literal, reason: Option<ClauseIdx>) {
        assert_eq!(self.assignment_for(literal), Assignment::Undecided);
        assert!(reason.is_some() || self.decision_level > DecisionLevel(0));

        trace!(
            "{} {} at level {}",
            match reason {
                Some(c) => format!("implied({})", c.0),
                None => "decision".to_string(),
            },
            literal,
            self.decision_level.0
        );

        self.trail.push(*literal.variable());
        let var = &mut self.variables[literal.idx()];
        var.assignment = if literal.is_positive() {
            Assignment::True
        } else {
            Assignment::False
        };
        var.reason = reason;
        var.decision_level = self.decision_level;
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
enum BcpResult {
    Conflict(ClauseIdx),
    NoConflict,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
struct DecisionLevel(usize);

impl DecisionLevel {
    fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug)]
struct Backtrack {
    level: DecisionLevel,
    // The index of the first decision to drop during the backtrack
    decision_index: usize,
}

#[derive(PartialEq, Eq, Clone, Debug)]
enum Decision {
    Branch(Literal),
    // the assumption for this level already holds, so the level stays empty
    AssumptionHolds,
    AssumptionFailed(Literal),
    Complete,
}

/// A total assignment captured when a solve call returns [`SatResult::Satisfiable`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    values: Vec<bool>,
}

impl Model {
    fn from_state(state: &SolverState) -> Self {
        let values = state.variables[1..]
            .iter()
            .map(|var| {
                debug_assert_ne!(var.assignment, Assignment::Undecided);
                var.assignment == Assignment::True
            })
            .collect();
        Self { values }
    }

    /// The value of `var`, or `None` if the solver never saw it.
    pub fn value(&self, var: Variable) -> Option<bool> {
        var.0.checked_sub(1).and_then(|i| self.values.get(i)).copied()
    }

    /// The literal over `var` that is true in this model. Variables the solver never saw are
    /// unconstrained and reported false.
    pub fn literal(&self, var: Variable) -> Literal {
        if self.value(var).unwrap_or(false) {
            Literal::Positive(var)
        } else {
            Literal::Negative(var)
        }
    }

    pub fn satisfies(&self, clause: &Clause) -> bool {
        clause
            .literals()
            .any(|l| self.value(*l.variable()) == Some(l.is_positive()))
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            clauses: vec![],
            state: SolverState::new(),
            model: None,
        }
    }

    pub fn with_formula(formula: Formula) -> Self {
        let mut solver = Self::new();
        for clause in formula.into_clauses() {
            solver.add_clause(clause);
        }
        solver
    }

    /// Adds a clause to the database. Any model from a previous call is discarded.
    pub fn add_clause(&mut self, clause: Clause) {
        debug_assert_eq!(self.state.decision_level, DecisionLevel(0));
        self.model = None;

        for literal in clause.literals() {
            self.state.ensure_variable(literal.variable());
        }
        match clause.normalized() {
            Some(clause) => self.clauses.push(clause),
            None => trace!("dropping tautology"),
        }
    }

    /// The largest variable index seen so far.
    pub fn num_variables(&self) -> usize {
        self.state.variables.len() - 1
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn solve(&mut self) -> SatResult {
        self.solve_with_assumptions(&[])
    }

    /// Solves the clause database with every literal in `assumptions` forced true for this
    /// call only.
    pub fn solve_with_assumptions(&mut self, assumptions: &[Literal]) -> SatResult {
        self.model = None;
        for assumption in assumptions {
            self.state.ensure_variable(assumption.variable());
        }

        let result = self.search(assumptions);
        if result == SatResult::Satisfiable {
            self.model = Some(Model::from_state(&self.state));
        }
        self.backtrack_to_root();
        result
    }

    fn search(&mut self, assumptions: &[Literal]) -> SatResult {
        if let BcpResult::Conflict(_) = self.bcp() {
            return SatResult::Unsatisfiable;
        }
        loop {
            self.state.decision_level = self.state.decision_level.next();
            match self.decide(assumptions) {
                Decision::Complete => break SatResult::Satisfiable,
                Decision::AssumptionHolds => continue,
                Decision::AssumptionFailed(literal) => {
                    trace!("assumption {} is falsified", literal);
                    break SatResult::Unsatisfiable;
                }
                Decision::Branch(literal) => {
                    self.state.assign(&literal, None);
                    while let BcpResult::Conflict(reason) = self.bcp() {
                        match self.analyze_conflict(reason) {
                            None => return SatResult::Unsatisfiable,
                            Some(backtrack) => self.backtrack(backtrack),
                        }
                    }
                }
            }
        }
    }

    fn bcp(&mut self) -> BcpResult {
        let mut did_work = true;
        while did_work {
            did_work = false;
            'clauses: for (idx, clause) in self.clauses.iter().enumerate() {
                let mut last_literal = None;
                'literals: for literal in clause.literals() {
                    match self.state.assignment_for(literal) {
                        // true => this clause is satisfied
                        Assignment::True => continue 'clauses,
                        // false => need to look at more literals, but we can't change the assignment
                        Assignment::False => continue 'literals,
                        // undecided => we'll be assigning this literal if it's the only undecided one
                        Assignment::Undecided => {
                            if last_literal.is_none() {
                                last_literal = Some(literal);
                            } else {
                                // Second undecided literal, can't resolve this clause
                                continue 'clauses;
                            }
                        }
                    }
                }
                // if last_literal is none, every literal was false => we have a conflict
                // otherwise we can apply unit resolution and continue
                match last_literal {
                    Some(literal) => self.state.assign(literal, Some(ClauseIdx(idx))),
                    None => return BcpResult::Conflict(ClauseIdx(idx)),
                }
                did_work = true;
            }
        }
        BcpResult::NoConflict
    }

    fn decide(&self, assumptions: &[Literal]) -> Decision {
        // Levels 1..=assumptions.len() are reserved for the assumptions, in order. Backtracking
        // to one of them re-enters the remaining assumptions before any free decision.
        if let Some(assumption) = assumptions.get(self.state.decision_level.0 - 1) {
            return match self.state.assignment_for(assumption) {
                Assignment::True => Decision::AssumptionHolds,
                Assignment::False => Decision::AssumptionFailed(*assumption),
                Assignment::Undecided => Decision::Branch(*assumption),
            };
        }

        // why is it complete to only return positive assignments? because [`analyze_conflict`]
        // will generate a conflict clause that will reverse this decision if it's involved in a
        // conflict.
        for (i, state) in self.state.variables.iter().enumerate().skip(1) {
            if state.assignment == Assignment::Undecided {
                return Decision::Branch(Literal::Positive(Variable(i)));
            }
        }
        Decision::Complete
    }

    // First-UIP learning. The learned clause is added to the database and the returned
    // backtrack makes it unit.
    fn analyze_conflict(&mut self, reason: ClauseIdx) -> Option<Backtrack> {
        if self.state.decision_level == DecisionLevel(0) {
            return None;
        }

        let mut reason = &self.clauses[reason.0];
        let mut conflict_clause = vec![];
        let mut seen = vec![false; self.state.variables.len()];
        let mut frontier = 0;
        let mut trail_end = self.state.trail.len();
        let first_uip = loop {
            for l in reason.literals() {
                if seen[l.idx()] {
                    continue;
                }
                seen[l.idx()] = true;

                let var = &self.state.variables[l.idx()];
                if var.decision_level == DecisionLevel(0) {
                    // fixed by the database alone
                    continue;
                } else if var.decision_level < self.state.decision_level {
                    conflict_clause.push(*l);
                } else {
                    debug_assert_eq!(var.decision_level, self.state.decision_level);
                    frontier += 1;
                }
            }

            let uip = loop {
                debug_assert_ne!(trail_end, 0);
                trail_end -= 1;
                let v = self.state.trail[trail_end];
                if seen[v.0] {
                    break v;
                }
            };

            debug_assert_eq!(self.state.variables[uip.0].decision_level, self.state.decision_level);

            frontier -= 1;
            if frontier == 0 {
                break self.state.variables[uip.0].literal(uip);
            } else {
                let clause_idx = self.state.variables[uip.0]
                    .reason
                    .expect("uip should be an implied variable");
                reason = &self.clauses[clause_idx.0];
            }
        };
        conflict_clause.push(first_uip.negated());
        let max_decision_level = self.state.variables[first_uip.idx()].decision_level;

        let decision_level = conflict_clause
            .iter()
            .map(|l| self.state.variables[l.idx()].decision_level)
            .filter(|l| *l < max_decision_level)
            .max()
            .unwrap_or(DecisionLevel(0));
        let decision_index = self
            .state
            .trail
            .iter()
            .position(|v| self.state.variables[v.0].decision_level > decision_level)
            .unwrap_or_else(|| self.state.trail.len());

        let conflict_clause = Clause::new(conflict_clause);
        trace!(
            "conflict clause {}, backtrack to level {}",
            conflict_clause,
            decision_level.0
        );
        self.clauses.push(conflict_clause);

        Some(Backtrack {
            level: decision_level,
            decision_index,
        })
    }

    fn backtrack(&mut self, backtrack: Backtrack) {
        trace!(
            "backtrack: dropping to {} from {}",
            backtrack.decision_index,
            self.state.trail.len()
        );
        assert!(backtrack.decision_index < self.state.trail.len());
        let dropped = self.state.trail.split_off(backtrack.decision_index);
        for variable in &dropped {
            self.state.variables[variable.0].clear();
        }
        self.state.decision_level = backtrack.level;
    }

    // Drops every assignment above level 0. Level 0 assignments are implied by the clause
    // database and stay valid when more clauses are added.
    fn backtrack_to_root(&mut self) {
        let decision_index = self
            .state
            .trail
            .iter()
            .position(|v| self.state.variables[v.0].decision_level > DecisionLevel(0))
            .unwrap_or_else(|| self.state.trail.len());
        for variable in self.state.trail.split_off(decision_index) {
            self.state.variables[variable.0].clear();
        }
        self.state.decision_level = DecisionLevel(0);
    }
}
