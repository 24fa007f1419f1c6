use log::info;
use rand::{Rng, SeedableRng};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::engine::{derive_seed, peak_position, simulate_career};
use super::error::SimError;
use super::profile::CareerProfile;
use super::transitions::TransitionTable;
use super::types::{
    ButterflyEffect, CareerParams, CareerRecord, GroupSummary, PeakShift, RiskTolerance,
    STATE_COUNT, State, StateShare, StudyInputs,
};

const PROGRESS_EVERY: u32 = 500;
const SAMPLE_STREAM: u32 = 1 << 16;

/// Early decision held fixed across one group of simulated careers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intervention {
    Control,
    EarlySpecialization,
    HighRisk,
}

impl Intervention {
    pub const ALL: [Intervention; 3] = [
        Intervention::Control,
        Intervention::EarlySpecialization,
        Intervention::HighRisk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Intervention::Control => "Control",
            Intervention::EarlySpecialization => "Early Specialization",
            Intervention::HighRisk => "High Risk",
        }
    }

    pub fn profile(self) -> CareerProfile {
        match self {
            Intervention::Control => CareerProfile::new(false, RiskTolerance::Medium),
            Intervention::EarlySpecialization => CareerProfile::new(true, RiskTolerance::Medium),
            Intervention::HighRisk => CareerProfile::new(false, RiskTolerance::High),
        }
    }

    fn stream(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySample {
    pub intervention: Intervention,
    /// Each path as catalog indices (`State::index`), for heatmap rendering.
    pub paths: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyResult {
    pub simulations: u32,
    pub max_years: u32,
    pub starting_age: u32,
    pub seed: u64,
    pub groups: Vec<GroupSummary>,
    pub comparisons: Vec<ButterflyEffect>,
    pub samples: Vec<TrajectorySample>,
}

pub fn simulate_record<R: Rng>(
    table: &TransitionTable,
    params: CareerParams,
    profile: CareerProfile,
    rng: &mut R,
) -> Result<CareerRecord, SimError> {
    let (career, profile) = simulate_career(table, params, Some(profile), rng)?;
    let peak = peak_position(&career);
    let final_state = career.last().copied().unwrap_or(State::EntryLevel);
    Ok(CareerRecord {
        career,
        peak,
        profile,
        final_state,
    })
}

/// Runs every career of one group, each on its own seeded stream.
pub fn run_group(
    table: &TransitionTable,
    inputs: &StudyInputs,
    intervention: Intervention,
) -> Result<Vec<CareerRecord>, SimError> {
    info!(
        "Running {} group ({} simulations)",
        intervention.label(),
        inputs.simulations
    );

    let mut records = Vec::with_capacity(inputs.simulations as usize);
    for simulation_id in 0..inputs.simulations {
        let seed = derive_seed(inputs.seed, intervention.stream(), simulation_id);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        records.push(simulate_record(
            table,
            inputs.career,
            intervention.profile(),
            &mut rng,
        )?);

        if (simulation_id + 1) % PROGRESS_EVERY == 0 {
            info!(
                "  {}: {}/{}",
                intervention.label(),
                simulation_id + 1,
                inputs.simulations
            );
        }
    }

    Ok(records)
}

/// Control, early specialization and high risk, run in that order, then
/// summarized and compared against control.
pub fn run_intervention_study(
    table: &TransitionTable,
    inputs: &StudyInputs,
) -> Result<StudyResult, SimError> {
    let mut groups = Vec::with_capacity(Intervention::ALL.len());
    let mut samples = Vec::with_capacity(Intervention::ALL.len());

    for intervention in Intervention::ALL {
        let records = run_group(table, inputs, intervention)?;
        groups.push(summarize_group(
            intervention.label(),
            &records,
            inputs.career.starting_age,
        ));
        samples.push(TrajectorySample {
            intervention,
            paths: sample_trajectories(
                &records,
                inputs.sample_size as usize,
                derive_seed(inputs.seed, SAMPLE_STREAM + intervention.stream(), 0),
            ),
        });
    }

    let control = &groups[0];
    let comparisons = groups[1..]
        .iter()
        .map(|group| compare_groups(control, group, &format!("{} vs Control", group.name)))
        .collect();

    info!("Study complete");

    Ok(StudyResult {
        simulations: inputs.simulations,
        max_years: inputs.career.max_years,
        starting_age: inputs.career.starting_age,
        seed: inputs.seed,
        groups,
        comparisons,
        samples,
    })
}

/// Age at the first `Retired` entry, if the career retired at all.
pub fn retirement_age(record: &CareerRecord, starting_age: u32) -> Option<u32> {
    record
        .career
        .iter()
        .position(|s| *s == State::Retired)
        .map(|idx| starting_age + idx as u32)
}

pub fn summarize_group(name: &str, records: &[CareerRecord], starting_age: u32) -> GroupSummary {
    let size = records.len() as u32;

    let director_plus_count = records.iter().filter(|r| r.peak.is_director_plus()).count() as u32;

    let mut unemployment_years: Vec<f64> = records
        .iter()
        .flat_map(|r| r.profile.unemployment_history.iter().map(|&y| y as f64))
        .collect();
    let median_unemployment_year = if unemployment_years.is_empty() {
        None
    } else {
        Some(percentile(&mut unemployment_years, 50.0))
    };

    let retirement_ages: Vec<u32> = records
        .iter()
        .filter_map(|r| retirement_age(r, starting_age))
        .collect();
    let retired_count = retirement_ages.len() as u32;
    let mean_retirement_age = mean(&retirement_ages);

    let mut peak_counts = [0_u32; STATE_COUNT];
    let mut final_counts = [0_u32; STATE_COUNT];
    for record in records {
        peak_counts[record.peak.index()] += 1;
        final_counts[record.final_state.index()] += 1;
    }

    let share = |state: State, counts: &[u32]| StateShare {
        state,
        count: counts[state.index()],
        percent: percent(counts[state.index()], size),
    };

    GroupSummary {
        name: name.to_string(),
        size,
        director_plus_count,
        director_plus_rate: percent(director_plus_count, size),
        median_unemployment_year,
        retired_count,
        mean_retirement_age,
        retirement_ages,
        peak_shares: State::PEAK_REPORTED
            .iter()
            .map(|&s| share(s, &peak_counts[..]))
            .collect(),
        final_state_shares: State::ALL.iter().map(|&s| share(s, &final_counts[..])).collect(),
        mean_promotions: mean_of(records, |r| r.profile.total_promotions as f64),
        mean_demotions: mean_of(records, |r| r.profile.total_demotions as f64),
        mean_final_burnout: mean_of(records, |r| r.profile.burnout_score),
        mean_final_momentum: mean_of(records, |r| r.profile.momentum_score),
    }
}

/// Quantifies how far an intervention group moved from control.
pub fn compare_groups(
    control: &GroupSummary,
    intervention: &GroupSummary,
    name: &str,
) -> ButterflyEffect {
    let delta = |a: Option<f64>, b: Option<f64>| match (a, b) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    };

    let peak_shifts = control
        .peak_shares
        .iter()
        .map(|c| {
            let i = intervention
                .peak_shares
                .iter()
                .find(|s| s.state == c.state)
                .map(|s| s.percent)
                .unwrap_or(0.0);
            PeakShift {
                state: c.state,
                control_percent: c.percent,
                intervention_percent: i,
                delta_points: i - c.percent,
            }
        })
        .collect();

    ButterflyEffect {
        name: name.to_string(),
        control_size: control.size,
        intervention_size: intervention.size,
        control_director_plus: control.director_plus_count,
        intervention_director_plus: intervention.director_plus_count,
        control_director_plus_rate: control.director_plus_rate,
        intervention_director_plus_rate: intervention.director_plus_rate,
        director_plus_delta_points: intervention.director_plus_rate - control.director_plus_rate,
        director_plus_ci_half_width_points: 100.0
            * difference_ci_half_width(
                control.director_plus_rate / 100.0,
                control.size,
                intervention.director_plus_rate / 100.0,
                intervention.size,
            ),
        control_median_unemployment_year: control.median_unemployment_year,
        intervention_median_unemployment_year: intervention.median_unemployment_year,
        unemployment_delay_years: delta(
            control.median_unemployment_year,
            intervention.median_unemployment_year,
        ),
        control_mean_retirement_age: control.mean_retirement_age,
        intervention_mean_retirement_age: intervention.mean_retirement_age,
        retirement_age_delta_years: delta(
            control.mean_retirement_age,
            intervention.mean_retirement_age,
        ),
        peak_shifts,
    }
}

/// Draws up to `sample_size` careers without replacement and encodes each
/// path as catalog indices.
pub fn sample_trajectories(
    records: &[CareerRecord],
    sample_size: usize,
    seed: u64,
) -> Vec<Vec<usize>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    records
        .choose_multiple(&mut rng, sample_size.min(records.len()))
        .map(|r| r.career.iter().map(|s| s.index()).collect())
        .collect()
}

fn percent(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64)
}

fn mean_of(records: &[CareerRecord], f: impl Fn(&CareerRecord) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(f).sum::<f64>() / records.len() as f64
}

/// 95% normal-approximation half-width for `p2 - p1`.
fn difference_ci_half_width(p1: f64, n1: u32, p2: f64, n2: u32) -> f64 {
    if n1 == 0 || n2 == 0 {
        return 0.0;
    }
    let p1 = p1.clamp(0.0, 1.0);
    let p2 = p2.clamp(0.0, 1.0);
    1.96 * (p1 * (1.0 - p1) / n1 as f64 + p2 * (1.0 - p2) / n2 as f64).sqrt()
}

fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
