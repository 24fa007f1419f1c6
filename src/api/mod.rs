use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    CareerParams, CareerProfile, CareerRecord, RiskTolerance, SimError, StudyInputs,
    StudyResult, TransitionTable, render_study, run_intervention_study, simulate_record,
};

const MAX_SIMULATIONS: u32 = 1_000_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRiskTolerance {
    #[serde(alias = "LOW", alias = "Low")]
    Low,
    #[serde(alias = "MEDIUM", alias = "Medium", alias = "med")]
    Medium,
    #[serde(alias = "HIGH", alias = "High")]
    High,
}

impl From<ApiRiskTolerance> for RiskTolerance {
    fn from(value: ApiRiskTolerance) -> Self {
        match value {
            ApiRiskTolerance::Low => RiskTolerance::Low,
            ApiRiskTolerance::Medium => RiskTolerance::Medium,
            ApiRiskTolerance::High => RiskTolerance::High,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StudyPayload {
    simulations: Option<u32>,
    max_years: Option<u32>,
    starting_age: Option<u32>,
    seed: Option<u64>,
    sample_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CareerPayload {
    max_years: Option<u32>,
    starting_age: Option<u32>,
    seed: Option<u64>,
    early_specialization: Option<bool>,
    risk_tolerance: Option<ApiRiskTolerance>,
}

#[derive(Parser, Debug)]
#[command(
    name = "careersim",
    about = "Monte Carlo career trajectory simulator with an early-decision intervention study"
)]
struct Cli {
    #[arg(long, default_value_t = 2_500, help = "Careers simulated per group")]
    simulations: u32,
    #[arg(long, default_value_t = 45, help = "Years simulated per career")]
    max_years: u32,
    #[arg(long, default_value_t = 22, help = "Age at the first simulated year")]
    starting_age: u32,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(
        long,
        default_value_t = 50,
        help = "Trajectories sampled per group for visualization"
    )]
    sample_size: u32,
    #[arg(long, help = "Print the study as JSON instead of a text report")]
    json: bool,
}

#[derive(Debug)]
struct CareerRequest {
    params: CareerParams,
    seed: u64,
    profile: CareerProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CareerResponse {
    seed: u64,
    max_years: u32,
    starting_age: u32,
    #[serde(flatten)]
    record: CareerRecord,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<StudyInputs, String> {
    if cli.simulations == 0 {
        return Err("--simulations must be > 0".to_string());
    }

    if cli.simulations > MAX_SIMULATIONS {
        return Err(format!("--simulations must be <= {MAX_SIMULATIONS}"));
    }

    let career = build_career_params(cli.max_years, cli.starting_age)?;

    if cli.sample_size > cli.simulations {
        return Err("--sample-size must be <= --simulations".to_string());
    }

    Ok(StudyInputs {
        simulations: cli.simulations,
        career,
        seed: cli.seed,
        sample_size: cli.sample_size,
    })
}

fn build_career_params(max_years: u32, starting_age: u32) -> Result<CareerParams, String> {
    if !(1..=100).contains(&max_years) {
        return Err("--max-years must be between 1 and 100".to_string());
    }

    if !(14..=80).contains(&starting_age) {
        return Err("--starting-age must be between 14 and 80".to_string());
    }

    Ok(CareerParams {
        max_years,
        starting_age,
    })
}

/// Parses CLI arguments, runs the study and prints it.
pub fn run_cli<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let as_json = cli.json;
    let inputs = build_inputs(cli)?;

    let result = run_study(&inputs).map_err(|e| e.to_string())?;
    if as_json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("Failed to serialize study: {e}"))?;
        println!("{json}");
    } else {
        print!("{}", render_study(&result));
    }
    Ok(())
}

fn run_study(inputs: &StudyInputs) -> Result<StudyResult, SimError> {
    let table = TransitionTable::standard()?;
    run_intervention_study(&table, inputs)
}

fn run_career(request: &CareerRequest) -> Result<CareerResponse, SimError> {
    let table = TransitionTable::standard()?;
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let record = simulate_record(&table, request.params, request.profile.clone(), &mut rng)?;
    Ok(CareerResponse {
        seed: request.seed,
        max_years: request.params.max_years,
        starting_age: request.params.starting_age,
        record,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/study",
            get(study_get_handler).post(study_post_handler),
        )
        .route(
            "/api/career",
            get(career_get_handler).post(career_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("Career simulator API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/study");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn study_get_handler(Query(payload): Query<StudyPayload>) -> Response {
    study_handler_impl(payload).await
}

async fn study_post_handler(Json(payload): Json<StudyPayload>) -> Response {
    study_handler_impl(payload).await
}

async fn study_handler_impl(payload: StudyPayload) -> Response {
    let inputs = match study_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_study(&inputs) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn career_get_handler(Query(payload): Query<CareerPayload>) -> Response {
    career_handler_impl(payload).await
}

async fn career_post_handler(Json(payload): Json<CareerPayload>) -> Response {
    career_handler_impl(payload).await
}

async fn career_handler_impl(payload: CareerPayload) -> Response {
    let request = match career_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_career(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn study_inputs_from_json(json: &str) -> Result<StudyInputs, String> {
    let payload = serde_json::from_str::<StudyPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    study_inputs_from_payload(payload)
}

#[cfg(test)]
fn career_request_from_json(json: &str) -> Result<CareerRequest, String> {
    let payload = serde_json::from_str::<CareerPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    career_request_from_payload(payload)
}

fn study_inputs_from_payload(payload: StudyPayload) -> Result<StudyInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.simulations {
        cli.simulations = v;
    }
    if let Some(v) = payload.max_years {
        cli.max_years = v;
    }
    if let Some(v) = payload.starting_age {
        cli.starting_age = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = v;
    }
    cli.sample_size = payload
        .sample_size
        .unwrap_or(cli.sample_size)
        .min(cli.simulations);

    build_inputs(cli)
}

fn career_request_from_payload(payload: CareerPayload) -> Result<CareerRequest, String> {
    let defaults = default_cli_for_api();
    let params = build_career_params(
        payload.max_years.unwrap_or(defaults.max_years),
        payload.starting_age.unwrap_or(defaults.starting_age),
    )?;

    let profile = CareerProfile::new(
        payload.early_specialization.unwrap_or(false),
        payload
            .risk_tolerance
            .map(RiskTolerance::from)
            .unwrap_or_default(),
    );

    Ok(CareerRequest {
        params,
        seed: payload.seed.unwrap_or(defaults.seed),
        profile,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        simulations: 1_000,
        max_years: 45,
        starting_age: 22,
        seed: 42,
        sample_size: 50,
        json: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn cli_defaults_match_study_defaults() {
        let cli = Cli::parse_from(["careersim"]);
        let inputs = build_inputs(cli).expect("defaults are valid");
        assert_eq!(inputs, StudyInputs::default());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from([
            "careersim",
            "--simulations",
            "300",
            "--max-years",
            "30",
            "--starting-age",
            "25",
            "--seed",
            "9",
            "--sample-size",
            "20",
            "--json",
        ]);
        assert!(cli.json);
        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.simulations, 300);
        assert_eq!(inputs.career.max_years, 30);
        assert_eq!(inputs.career.starting_age, 25);
        assert_eq!(inputs.seed, 9);
        assert_eq!(inputs.sample_size, 20);
    }

    #[test]
    fn build_inputs_rejects_zero_simulations() {
        let mut cli = sample_cli();
        cli.simulations = 0;
        let err = build_inputs(cli).expect_err("must reject zero simulations");
        assert!(err.contains("--simulations"));
    }

    #[test]
    fn build_inputs_rejects_oversized_sample() {
        let mut cli = sample_cli();
        cli.simulations = 10;
        cli.sample_size = 11;
        let err = build_inputs(cli).expect_err("must reject oversized sample");
        assert!(err.contains("--sample-size"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_years_and_age() {
        let mut cli = sample_cli();
        cli.max_years = 0;
        let err = build_inputs(cli).expect_err("must reject zero years");
        assert!(err.contains("--max-years"));

        let mut cli = sample_cli();
        cli.starting_age = 90;
        let err = build_inputs(cli).expect_err("must reject late start");
        assert!(err.contains("--starting-age"));
    }

    #[test]
    fn study_payload_parses_web_keys() {
        let json = r#"{
          "simulations": 400,
          "maxYears": 40,
          "startingAge": 24,
          "seed": 7,
          "sampleSize": 12
        }"#;
        let inputs = study_inputs_from_json(json).expect("json should parse");
        assert_eq!(inputs.simulations, 400);
        assert_eq!(inputs.career.max_years, 40);
        assert_eq!(inputs.career.starting_age, 24);
        assert_eq!(inputs.seed, 7);
        assert_eq!(inputs.sample_size, 12);
    }

    #[test]
    fn study_payload_caps_sample_to_simulations() {
        let inputs = study_inputs_from_json(r#"{"simulations": 5}"#).expect("json should parse");
        assert_eq!(inputs.simulations, 5);
        assert_eq!(inputs.sample_size, 5);
    }

    #[test]
    fn study_payload_errors_pass_validation_messages_through() {
        let err = study_inputs_from_json(r#"{"maxYears": 0}"#).expect_err("must reject");
        assert_eq!(err, "--max-years must be between 1 and 100");
    }

    #[test]
    fn career_payload_parses_profile() {
        let json = r#"{
          "earlySpecialization": true,
          "riskTolerance": "high",
          "seed": 99,
          "maxYears": 10
        }"#;
        let request = career_request_from_json(json).expect("json should parse");
        assert!(request.profile.early_specialization);
        assert_eq!(request.profile.risk_tolerance, RiskTolerance::High);
        assert_eq!(request.seed, 99);
        assert_eq!(request.params.max_years, 10);
        assert_eq!(request.params.starting_age, 22);
    }

    #[test]
    fn career_payload_defaults_to_control_profile() {
        let request = career_request_from_json("{}").expect("json should parse");
        assert_eq!(request.profile, CareerProfile::new(false, RiskTolerance::Medium));
        assert_eq!(request.params, CareerParams::default());
    }

    #[test]
    fn career_payload_rejects_unknown_risk() {
        let err = career_request_from_json(r#"{"riskTolerance": "reckless"}"#)
            .expect_err("must reject unknown tolerance");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn career_response_serializes_record_shape() {
        let request = career_request_from_json(r#"{"seed": 3, "maxYears": 12}"#)
            .expect("json should parse");
        let response = run_career(&request).expect("career runs");
        assert_eq!(response.record.career.len(), 13);
        assert_eq!(response.record.career[0], State::EntryLevel);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"career\""));
        assert!(json.contains("\"peak\""));
        assert!(json.contains("\"finalState\""));
        assert!(json.contains("\"unemploymentHistory\""));
        assert!(json.contains("\"riskTolerance\":\"medium\""));
        assert!(json.contains("\"entry-level\""));
    }

    #[test]
    fn career_runs_are_reproducible_per_seed() {
        let request = career_request_from_json(r#"{"seed": 17}"#).expect("json should parse");
        let a = run_career(&request).expect("run a");
        let b = run_career(&request).expect("run b");
        assert_eq!(a.record.career, b.record.career);
        assert_eq!(a.record.profile, b.record.profile);
    }

    #[test]
    fn study_response_serialization_contains_expected_fields() {
        let mut cli = sample_cli();
        cli.simulations = 30;
        cli.sample_size = 5;
        let inputs = build_inputs(cli).expect("valid inputs");
        let result = run_study(&inputs).expect("study runs");

        let json = serde_json::to_string(&result).expect("response should serialize");
        assert!(json.contains("\"groups\""));
        assert!(json.contains("\"comparisons\""));
        assert!(json.contains("\"samples\""));
        assert!(json.contains("\"directorPlusRate\""));
        assert!(json.contains("\"peakShifts\""));
        assert!(json.contains("\"retirementAges\""));
        assert!(json.contains("\"intervention\":\"early-specialization\""));
    }
}
