use std::fmt::Write;

use super::study::StudyResult;
use super::types::{ButterflyEffect, GroupSummary};

const RULE_WIDTH: usize = 70;

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat_n(ch, RULE_WIDTH));
    out.push('\n');
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

pub fn render_group_summary(group: &GroupSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (n={})", group.name, group.size);
    let _ = writeln!(
        out,
        "  Director+ reached:      {:4} ({:5.2}%)",
        group.director_plus_count, group.director_plus_rate
    );
    let _ = writeln!(
        out,
        "  Retired within horizon: {:4}, mean age {}",
        group.retired_count,
        fmt_optional(group.mean_retirement_age, 1)
    );
    let _ = writeln!(
        out,
        "  Median unemployment year: {}",
        fmt_optional(group.median_unemployment_year, 1)
    );
    let _ = writeln!(
        out,
        "  Mean promotions {:.2}, demotions {:.2}, final burnout {:.2}, final momentum {:.2}",
        group.mean_promotions,
        group.mean_demotions,
        group.mean_final_burnout,
        group.mean_final_momentum
    );
    out
}

pub fn render_comparison(effect: &ButterflyEffect) -> String {
    let mut out = String::new();
    rule(&mut out, '=');
    let _ = writeln!(out, "BUTTERFLY EFFECT ANALYSIS: {}", effect.name);
    rule(&mut out, '=');

    let _ = writeln!(out, "\nDirector+ Achievement Rate:");
    let _ = writeln!(
        out,
        "  Control:      {:4} / {} = {:5.2}%",
        effect.control_director_plus, effect.control_size, effect.control_director_plus_rate
    );
    let _ = writeln!(
        out,
        "  Intervention: {:4} / {} = {:5.2}%",
        effect.intervention_director_plus,
        effect.intervention_size,
        effect.intervention_director_plus_rate
    );
    let _ = writeln!(
        out,
        "  -> IMPACT: {:+.2} percentage points (95% CI +/- {:.2})",
        effect.director_plus_delta_points, effect.director_plus_ci_half_width_points
    );

    if let (Some(control), Some(intervention), Some(delta)) = (
        effect.control_median_unemployment_year,
        effect.intervention_median_unemployment_year,
        effect.unemployment_delay_years,
    ) {
        let _ = writeln!(out, "\nUnemployment Timing:");
        let _ = writeln!(out, "  Control median:      Year {control:.1}");
        let _ = writeln!(out, "  Intervention median: Year {intervention:.1}");
        let _ = writeln!(out, "  -> IMPACT: {delta:+.1} years delay");
    }

    if let (Some(control), Some(intervention), Some(delta)) = (
        effect.control_mean_retirement_age,
        effect.intervention_mean_retirement_age,
        effect.retirement_age_delta_years,
    ) {
        let _ = writeln!(out, "\nRetirement Age:");
        let _ = writeln!(out, "  Control avg:      {control:.1} years old");
        let _ = writeln!(out, "  Intervention avg: {intervention:.1} years old");
        let _ = writeln!(out, "  -> IMPACT: {delta:+.1} years difference");
    }

    let _ = writeln!(out, "\nPeak Position Distribution:");
    for shift in &effect.peak_shifts {
        let _ = writeln!(
            out,
            "  {:12}: {:5.1}% -> {:5.1}% ({:+.1}%)",
            shift.state.label(),
            shift.control_percent,
            shift.intervention_percent,
            shift.delta_points
        );
    }
    out.push('\n');
    rule(&mut out, '=');
    out
}

pub fn render_study(result: &StudyResult) -> String {
    let mut out = String::new();
    rule(&mut out, '=');
    let _ = writeln!(out, "INTERVENTION STUDY: Quantifying Butterfly Effect");
    let _ = writeln!(
        out,
        "{} careers per group, {} years from age {}, seed {}",
        result.simulations, result.max_years, result.starting_age, result.seed
    );
    rule(&mut out, '=');

    for group in &result.groups {
        out.push('\n');
        out.push_str(&render_group_summary(group));
    }
    out.push('\n');

    for effect in &result.comparisons {
        out.push_str(&render_comparison(effect));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PeakShift, State};

    fn effect() -> ButterflyEffect {
        ButterflyEffect {
            name: "High Risk vs Control".to_string(),
            control_size: 100,
            intervention_size: 100,
            control_director_plus: 12,
            intervention_director_plus: 15,
            control_director_plus_rate: 12.0,
            intervention_director_plus_rate: 15.0,
            director_plus_delta_points: 3.0,
            director_plus_ci_half_width_points: 9.5,
            control_median_unemployment_year: Some(8.0),
            intervention_median_unemployment_year: Some(9.5),
            unemployment_delay_years: Some(1.5),
            control_mean_retirement_age: None,
            intervention_mean_retirement_age: Some(61.0),
            retirement_age_delta_years: None,
            peak_shifts: vec![PeakShift {
                state: State::MidLevel,
                control_percent: 20.0,
                intervention_percent: 17.5,
                delta_points: -2.5,
            }],
        }
    }

    #[test]
    fn comparison_lists_rates_and_impact() {
        let text = render_comparison(&effect());
        assert!(text.contains("BUTTERFLY EFFECT ANALYSIS: High Risk vs Control"));
        assert!(text.contains("  Control:        12 / 100 = 12.00%"));
        assert!(text.contains("-> IMPACT: +3.00 percentage points"));
        assert!(text.contains("Intervention median: Year 9.5"));
        assert!(text.contains("  Mid-Level   :  20.0% ->  17.5% (-2.5%)"));
    }

    #[test]
    fn comparison_omits_sections_without_data() {
        let text = render_comparison(&effect());
        assert!(!text.contains("Retirement Age:"));
    }

    #[test]
    fn optional_values_render_as_na() {
        assert_eq!(fmt_optional(None, 1), "n/a");
        assert_eq!(fmt_optional(Some(3.14159), 2), "3.14");
    }
}
