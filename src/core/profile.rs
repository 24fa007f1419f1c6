use serde::Serialize;

use super::types::{RiskTolerance, State};

const BURNOUT_DECAY: f64 = 0.5;
const PROMOTION_MOMENTUM: f64 = 2.0;
const DEMOTION_MOMENTUM: f64 = 3.0;
const MOMENTUM_RETENTION: f64 = 0.9;

/// Per-career decisions plus the path-dependent scores accumulated while the
/// career is simulated. Owned by exactly one simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerProfile {
    pub early_specialization: bool,
    pub risk_tolerance: RiskTolerance,
    pub burnout_score: f64,
    pub momentum_score: f64,
    pub unemployment_history: Vec<u32>,
    pub total_promotions: u32,
    pub total_demotions: u32,
}

impl CareerProfile {
    pub fn new(early_specialization: bool, risk_tolerance: RiskTolerance) -> Self {
        Self {
            early_specialization,
            risk_tolerance,
            ..Default::default()
        }
    }

    /// Adds this year's stress for `current`, then decays by a fixed amount.
    pub fn update_burnout(&mut self, current: State, _year: u32) {
        self.burnout_score += current.stress_level();
        self.burnout_score = (self.burnout_score - BURNOUT_DECAY).max(0.0);
    }

    /// Promotion/demotion delta first, decay second, on every call.
    pub fn update_momentum(&mut self, old: State, new: State) {
        let old_rank = old.career_rank();
        let new_rank = new.career_rank();

        if new_rank > old_rank {
            self.momentum_score += PROMOTION_MOMENTUM;
            self.total_promotions += 1;
        } else if new_rank < old_rank {
            self.momentum_score = (self.momentum_score - DEMOTION_MOMENTUM).max(0.0);
            self.total_demotions += 1;
        }

        self.momentum_score = (self.momentum_score * MOMENTUM_RETENTION).max(0.0);
    }

    pub fn record_unemployment(&mut self, year: u32) {
        self.unemployment_history.push(year);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};
    use proptest::sample::select;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn new_profile_starts_clean() {
        let profile = CareerProfile::new(true, RiskTolerance::High);
        assert!(profile.early_specialization);
        assert_eq!(profile.risk_tolerance, RiskTolerance::High);
        assert_approx(profile.burnout_score, 0.0);
        assert_approx(profile.momentum_score, 0.0);
        assert!(profile.unemployment_history.is_empty());
        assert_eq!(profile.total_promotions, 0);
        assert_eq!(profile.total_demotions, 0);
    }

    #[test]
    fn burnout_adds_stress_then_decays() {
        let mut profile = CareerProfile::default();
        profile.update_burnout(State::CSuite, 0);
        assert_approx(profile.burnout_score, 4.5);
        profile.update_burnout(State::Manager, 1);
        assert_approx(profile.burnout_score, 6.0);
        profile.update_burnout(State::Junior, 2);
        assert_approx(profile.burnout_score, 5.5);
    }

    #[test]
    fn unemployment_recovers_burnout_but_never_below_zero() {
        let mut profile = CareerProfile::default();
        profile.burnout_score = 1.0;
        profile.update_burnout(State::Unemployed, 0);
        assert_approx(profile.burnout_score, 0.0);
        profile.update_burnout(State::EntryLevel, 1);
        assert_approx(profile.burnout_score, 0.0);
    }

    #[test]
    fn promotion_adds_momentum_before_decay() {
        let mut profile = CareerProfile::default();
        profile.update_momentum(State::EntryLevel, State::Junior);
        assert_approx(profile.momentum_score, 1.8);
        assert_eq!(profile.total_promotions, 1);
        assert_eq!(profile.total_demotions, 0);
    }

    #[test]
    fn demotion_subtracts_momentum_before_decay() {
        let mut profile = CareerProfile::default();
        profile.momentum_score = 10.0;
        profile.update_momentum(State::Senior, State::MidLevel);
        assert_approx(profile.momentum_score, 6.3);
        assert_eq!(profile.total_demotions, 1);

        profile.momentum_score = 1.0;
        profile.update_momentum(State::Senior, State::Unemployed);
        assert_approx(profile.momentum_score, 0.0);
        assert_eq!(profile.total_demotions, 2);
    }

    #[test]
    fn lateral_move_only_decays() {
        let mut profile = CareerProfile::default();
        profile.momentum_score = 5.0;
        profile.update_momentum(State::Lead, State::Lead);
        assert_approx(profile.momentum_score, 4.5);
        assert_eq!(profile.total_promotions, 0);
        assert_eq!(profile.total_demotions, 0);
    }

    #[test]
    fn retired_and_unemployed_share_rank_zero() {
        let mut profile = CareerProfile::default();
        profile.update_momentum(State::Unemployed, State::Retired);
        assert_eq!(profile.total_promotions, 0);
        assert_eq!(profile.total_demotions, 0);
    }

    #[test]
    fn unemployment_history_keeps_order() {
        let mut profile = CareerProfile::default();
        profile.record_unemployment(4);
        profile.record_unemployment(9);
        assert_eq!(profile.unemployment_history, vec![4, 9]);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_scores_never_go_negative(
            moves in proptest::collection::vec(
                (select(State::ALL.to_vec()), select(State::ALL.to_vec())),
                0..120,
            ),
        ) {
            let mut profile = CareerProfile::default();
            for (year, (old, new)) in moves.into_iter().enumerate() {
                profile.update_burnout(old, year as u32);
                profile.update_momentum(old, new);
                prop_assert!(profile.burnout_score >= 0.0);
                prop_assert!(profile.momentum_score >= 0.0);
            }
        }
    }
}
