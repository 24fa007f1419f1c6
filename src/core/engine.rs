use rand::Rng;
use rand::distributions::{Distribution as _, WeightedIndex};

use super::error::SimError;
use super::profile::CareerProfile;
use super::transitions::{Distribution, TransitionTable};
use super::types::{CareerParams, RiskTolerance, State};

const BURNOUT_CAP: f64 = 0.3;
const MOMENTUM_CAP: f64 = 0.2;
const EARLY_PROMOTION_BOOST: f64 = 1.3;
const SPECIALIST_PLATEAU: f64 = 1.2;
const GENERALIST_LATE_BOOST: f64 = 1.25;

fn age_bracket_probability(age: u32) -> f64 {
    match age {
        0..=49 => 0.0,
        50..=59 => 0.01,
        60..=64 => 0.08,
        65..=69 => 0.25,
        _ => 0.50,
    }
}

/// Path-dependent chance of retiring this year. Pure; the caller draws.
pub fn retirement_probability(
    profile: &CareerProfile,
    current: State,
    _year: u32,
    age: u32,
) -> f64 {
    if current == State::Retired {
        return 1.0;
    }

    let mut base = age_bracket_probability(age);
    let burnout_factor = (profile.burnout_score / 100.0).min(BURNOUT_CAP);
    let momentum_factor = -(profile.momentum_score / 50.0).min(MOMENTUM_CAP);

    // skills gone stale
    if age > 60 && matches!(current, State::EntryLevel | State::Junior | State::MidLevel) {
        base += 0.15;
    }
    if matches!(current, State::CSuite | State::Vp | State::Director) {
        base -= 0.10;
    }
    if current == State::Unemployed && age > 55 {
        base += 0.20;
    }

    (base + burnout_factor + momentum_factor).clamp(0.0, 1.0)
}

/// Re-weights a copy of `base` by the profile's decisions, then renormalizes
/// once. Specialization adjustments run before risk adjustments.
pub fn apply_decision_modifiers(
    profile: &CareerProfile,
    base: &Distribution,
    current: State,
    _year: u32,
) -> Result<Distribution, SimError> {
    let mut modified = *base;

    if profile.early_specialization {
        match current {
            State::EntryLevel | State::Junior => {
                for target in [State::Junior, State::MidLevel, State::Senior] {
                    modified.scale(target, EARLY_PROMOTION_BOOST);
                }
            }
            State::Senior | State::Lead => modified.scale(current, SPECIALIST_PLATEAU),
            _ => {}
        }
    } else if matches!(current, State::Manager | State::Director | State::Vp) {
        for target in [State::Director, State::Vp, State::CSuite] {
            modified.scale(target, GENERALIST_LATE_BOOST);
        }
    }

    if current == State::Unemployed {
        match profile.risk_tolerance {
            RiskTolerance::High => {
                modified.scale(State::MidLevel, 1.5);
                modified.scale(State::Unemployed, 0.8);
            }
            RiskTolerance::Low => {
                modified.scale(State::EntryLevel, 1.3);
                modified.scale(State::Unemployed, 1.1);
            }
            RiskTolerance::Medium => {}
        }
    }

    modified.normalized(current)
}

fn draw_next_state<R: Rng>(
    dist: &Distribution,
    current: State,
    rng: &mut R,
) -> Result<State, SimError> {
    let weights = dist.clamped_weights();
    let index = WeightedIndex::new(weights).map_err(|_| SimError::InvalidDistribution {
        state: current,
        total: weights.iter().sum(),
    })?;
    Ok(State::ALL[index.sample(rng)])
}

/// Runs one career from `EntryLevel`. The returned path holds the starting
/// state plus one entry per simulated year.
pub fn simulate_career<R: Rng>(
    table: &TransitionTable,
    params: CareerParams,
    profile: Option<CareerProfile>,
    rng: &mut R,
) -> Result<(Vec<State>, CareerProfile), SimError> {
    let mut profile = profile.unwrap_or_default();
    let mut current = State::EntryLevel;
    let mut path = Vec::with_capacity(params.max_years as usize + 1);
    path.push(current);
    let mut age = params.starting_age;

    for year in 0..params.max_years {
        age += 1;

        if current == State::Retired {
            path.push(current);
            continue;
        }

        profile.update_burnout(current, year);

        let retire_p = retirement_probability(&profile, current, year, age);
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < retire_p {
            current = State::Retired;
            path.push(current);
            continue;
        }

        let modified = apply_decision_modifiers(&profile, table.row(current), current, year)?;
        let next = draw_next_state(&modified, current, rng)?;

        profile.update_momentum(current, next);
        if next == State::Unemployed {
            profile.record_unemployment(year);
        }

        path.push(next);
        current = next;
    }

    Ok((path, profile))
}

/// Highest-ranked state on the path; the first occurrence wins ties.
pub fn peak_position(career: &[State]) -> State {
    let mut max_rank = 0;
    let mut peak = State::EntryLevel;

    for &state in career {
        let rank = state.career_rank();
        if rank > max_rank {
            max_rank = rank;
            peak = state;
        }
    }

    peak
}

/// Independent, reproducible stream per (group, simulation).
pub fn derive_seed(base_seed: u64, group: u32, simulation_id: u32) -> u64 {
    let mixed = base_seed ^ ((group as u64) << 32) ^ simulation_id as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
