use std::fmt;

use serde::Serialize;

use super::profile::CareerProfile;

pub const STATE_COUNT: usize = 11;

/// Career levels and statuses, in catalog order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    EntryLevel,
    Junior,
    MidLevel,
    Senior,
    Lead,
    Manager,
    Director,
    Vp,
    CSuite,
    Retired,
    Unemployed,
}

impl State {
    pub const ALL: [State; STATE_COUNT] = [
        State::EntryLevel,
        State::Junior,
        State::MidLevel,
        State::Senior,
        State::Lead,
        State::Manager,
        State::Director,
        State::Vp,
        State::CSuite,
        State::Retired,
        State::Unemployed,
    ];

    /// Peak positions reported by the study, lowest first.
    pub const PEAK_REPORTED: [State; 7] = [
        State::MidLevel,
        State::Senior,
        State::Lead,
        State::Manager,
        State::Director,
        State::Vp,
        State::CSuite,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            State::EntryLevel => "Entry Level",
            State::Junior => "Junior",
            State::MidLevel => "Mid-Level",
            State::Senior => "Senior",
            State::Lead => "Lead",
            State::Manager => "Manager",
            State::Director => "Director",
            State::Vp => "VP",
            State::CSuite => "C-Suite",
            State::Retired => "Retired",
            State::Unemployed => "Unemployed",
        }
    }

    /// Ordering used for promotion/demotion detection and peak queries.
    /// `Unemployed` and `Retired` both sit at 0.
    pub fn career_rank(self) -> u8 {
        match self {
            State::Unemployed | State::Retired => 0,
            State::EntryLevel => 1,
            State::Junior => 2,
            State::MidLevel => 3,
            State::Senior => 4,
            State::Lead => 5,
            State::Manager => 6,
            State::Director => 7,
            State::Vp => 8,
            State::CSuite => 9,
        }
    }

    /// Yearly burnout contribution; negative while unemployed (recovery).
    pub fn stress_level(self) -> f64 {
        match self {
            State::CSuite => 5.0,
            State::Vp => 4.0,
            State::Director => 3.0,
            State::Manager | State::Lead => 2.0,
            State::Senior => 1.0,
            State::EntryLevel | State::Junior | State::MidLevel | State::Retired => 0.0,
            State::Unemployed => -2.0,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == State::Retired
    }

    pub fn is_director_plus(self) -> bool {
        self.career_rank() >= State::Director.career_rank()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTolerance::Low => f.write_str("low"),
            RiskTolerance::Medium => f.write_str("medium"),
            RiskTolerance::High => f.write_str("high"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CareerParams {
    pub max_years: u32,
    pub starting_age: u32,
}

impl Default for CareerParams {
    fn default() -> Self {
        Self {
            max_years: 45,
            starting_age: 22,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StudyInputs {
    pub simulations: u32,
    pub career: CareerParams,
    pub seed: u64,
    pub sample_size: u32,
}

impl Default for StudyInputs {
    fn default() -> Self {
        Self {
            simulations: 2_500,
            career: CareerParams::default(),
            seed: 42,
            sample_size: 50,
        }
    }
}

/// One finished career as consumed by aggregation and reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerRecord {
    pub career: Vec<State>,
    pub peak: State,
    pub profile: CareerProfile,
    pub final_state: State,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateShare {
    pub state: State,
    pub count: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub size: u32,
    pub director_plus_count: u32,
    pub director_plus_rate: f64,
    pub median_unemployment_year: Option<f64>,
    pub retired_count: u32,
    pub mean_retirement_age: Option<f64>,
    /// Age of every retiree in record order, for the retirement-age histogram.
    pub retirement_ages: Vec<u32>,
    pub peak_shares: Vec<StateShare>,
    pub final_state_shares: Vec<StateShare>,
    pub mean_promotions: f64,
    pub mean_demotions: f64,
    pub mean_final_burnout: f64,
    pub mean_final_momentum: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakShift {
    pub state: State,
    pub control_percent: f64,
    pub intervention_percent: f64,
    pub delta_points: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButterflyEffect {
    pub name: String,
    pub control_size: u32,
    pub intervention_size: u32,
    pub control_director_plus: u32,
    pub intervention_director_plus: u32,
    pub control_director_plus_rate: f64,
    pub intervention_director_plus_rate: f64,
    pub director_plus_delta_points: f64,
    pub director_plus_ci_half_width_points: f64,
    pub control_median_unemployment_year: Option<f64>,
    pub intervention_median_unemployment_year: Option<f64>,
    pub unemployment_delay_years: Option<f64>,
    pub control_mean_retirement_age: Option<f64>,
    pub intervention_mean_retirement_age: Option<f64>,
    pub retirement_age_delta_years: Option<f64>,
    pub peak_shifts: Vec<PeakShift>,
}
