mod engine;
mod error;
mod profile;
mod report;
mod study;
mod transitions;
mod types;

pub use engine::{
    apply_decision_modifiers, derive_seed, peak_position, retirement_probability, simulate_career,
};
pub use error::SimError;
pub use profile::CareerProfile;
pub use report::{render_comparison, render_group_summary, render_study};
pub use study::{
    Intervention, StudyResult, TrajectorySample, compare_groups, retirement_age, run_group,
    run_intervention_study, sample_trajectories, simulate_record, summarize_group,
};
pub use transitions::{Distribution, ROW_SUM_TOLERANCE, TransitionTable};
pub use types::{
    ButterflyEffect, CareerParams, CareerRecord, GroupSummary, PeakShift, RiskTolerance,
    STATE_COUNT, State, StateShare, StudyInputs,
};
