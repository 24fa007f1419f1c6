use super::error::SimError;
use super::types::{STATE_COUNT, State};

pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Weights over every state, indexed by `State::index`. A target that is not
/// reachable from the source simply carries zero weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    weights: [f64; STATE_COUNT],
}

impl Distribution {
    pub fn empty() -> Self {
        Self {
            weights: [0.0; STATE_COUNT],
        }
    }

    pub fn from_pairs(pairs: &[(State, f64)]) -> Self {
        let mut dist = Self::empty();
        for &(state, p) in pairs {
            dist.weights[state.index()] += p;
        }
        dist
    }

    pub fn get(&self, state: State) -> f64 {
        self.weights[state.index()]
    }

    pub fn contains(&self, state: State) -> bool {
        self.get(state) > 0.0
    }

    /// Multiplies the mass on `state`. Zero mass stays zero, so scaling an
    /// unreachable target is a no-op.
    pub fn scale(&mut self, state: State, factor: f64) {
        self.weights[state.index()] *= factor;
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Divides every weight by the total. `source` only labels the error.
    pub fn normalized(&self, source: State) -> Result<Distribution, SimError> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(SimError::InvalidDistribution {
                state: source,
                total,
            });
        }

        let mut weights = self.weights;
        for w in &mut weights {
            *w /= total;
        }
        Ok(Self { weights })
    }

    /// Weights in catalog order, clamped to [0, 1] for use in a draw.
    pub fn clamped_weights(&self) -> [f64; STATE_COUNT] {
        self.weights.map(|w| if w.is_finite() { w.clamp(0.0, 1.0) } else { 0.0 })
    }

    /// Non-zero entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (State, f64)> + '_ {
        State::ALL
            .into_iter()
            .map(move |s| (s, self.weights[s.index()]))
            .filter(|&(_, p)| p > 0.0)
    }
}

/// Validated base transition matrix. Read-only once built.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rows: [Distribution; STATE_COUNT],
}

impl TransitionTable {
    pub fn new(rows: &[(State, &[(State, f64)])]) -> Result<Self, SimError> {
        let mut built: [Option<Distribution>; STATE_COUNT] = [None; STATE_COUNT];

        for &(source, targets) in rows {
            if built[source.index()].is_some() {
                return Err(SimError::Configuration(format!(
                    "duplicate transition row for {source}"
                )));
            }
            let mut seen = [false; STATE_COUNT];
            for &(target, p) in targets {
                if std::mem::replace(&mut seen[target.index()], true) {
                    return Err(SimError::Configuration(format!(
                        "duplicate target {target} in transition row for {source}"
                    )));
                }
                if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                    return Err(SimError::Configuration(format!(
                        "probability {p} for {source} -> {target} is outside [0, 1]"
                    )));
                }
            }

            let row = Distribution::from_pairs(targets);
            let total = row.total();
            if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimError::Configuration(format!(
                    "transition row for {source} sums to {total}, expected 1.0"
                )));
            }
            if source.is_terminal() && (row.get(source) - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimError::Configuration(format!(
                    "terminal state {source} must only transition to itself"
                )));
            }
            built[source.index()] = Some(row);
        }

        let mut table = [Distribution::empty(); STATE_COUNT];
        for state in State::ALL {
            match built[state.index()] {
                Some(row) => table[state.index()] = row,
                None => {
                    return Err(SimError::Configuration(format!(
                        "missing transition row for {state}"
                    )));
                }
            }
        }

        Ok(Self { rows: table })
    }

    pub fn standard() -> Result<Self, SimError> {
        use State::*;

        let rows: [(State, &[(State, f64)]); STATE_COUNT] = [
            (
                EntryLevel,
                &[
                    (EntryLevel, 0.45),
                    (Junior, 0.30),
                    (MidLevel, 0.05),
                    (Unemployed, 0.20),
                ],
            ),
            (
                Junior,
                &[
                    (Junior, 0.40),
                    (MidLevel, 0.30),
                    (Senior, 0.05),
                    (EntryLevel, 0.10),
                    (Unemployed, 0.15),
                ],
            ),
            (
                MidLevel,
                &[
                    (MidLevel, 0.50),
                    (Senior, 0.20),
                    (Lead, 0.05),
                    (Junior, 0.10),
                    (Unemployed, 0.15),
                ],
            ),
            (
                Senior,
                &[
                    (Senior, 0.55),
                    (Lead, 0.15),
                    (Manager, 0.10),
                    (MidLevel, 0.10),
                    (Unemployed, 0.10),
                ],
            ),
            (
                Lead,
                &[
                    (Lead, 0.50),
                    (Manager, 0.20),
                    (Director, 0.05),
                    (Senior, 0.15),
                    (Unemployed, 0.10),
                ],
            ),
            (
                Manager,
                &[
                    (Manager, 0.55),
                    (Director, 0.15),
                    (Lead, 0.15),
                    (Senior, 0.05),
                    (Unemployed, 0.10),
                ],
            ),
            (
                Director,
                &[
                    (Director, 0.60),
                    (Vp, 0.10),
                    (Manager, 0.15),
                    (Unemployed, 0.15),
                ],
            ),
            (
                Vp,
                &[
                    (Vp, 0.65),
                    (CSuite, 0.08),
                    (Director, 0.15),
                    (Unemployed, 0.12),
                ],
            ),
            (
                CSuite,
                &[
                    (CSuite, 0.70),
                    (Vp, 0.10),
                    (Unemployed, 0.10),
                    (Retired, 0.10),
                ],
            ),
            (Retired, &[(Retired, 1.0)]),
            (
                Unemployed,
                &[
                    (Unemployed, 0.50),
                    (EntryLevel, 0.25),
                    (Junior, 0.15),
                    (MidLevel, 0.08),
                    (Retired, 0.02),
                ],
            ),
        ];
        Self::new(&rows)
    }

    pub fn row(&self, state: State) -> &Distribution {
        &self.rows[state.index()]
    }
}
