//! cogflux CLI - Command-line interface for cogflux
//!
//! Commands:
//! - extract: Turn raw assessment sessions into per-session feature vectors
//! - analyze: Run a history through the pipeline and print the report
//! - validate: Validate raw session schema
//! - check-message: Check display text against the forbidden-term list
//! - doctor: Diagnose configuration and model health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cogflux::classifier::ModelTrendPredictor;
use cogflux::config::AnalysisConfig;
use cogflux::pipeline::CognitiveProcessor;
use cogflux::safety::{find_forbidden_terms, FORBIDDEN_TERMS};
use cogflux::schema::{AssessmentSession, SessionAdapter, SCHEMA_VERSION};
use cogflux::types::SessionDataPoint;
use cogflux::{COGFLUX_VERSION, PRODUCER_NAME};

/// cogflux - On-device analysis engine for longitudinal cognitive-performance signals
#[derive(Parser)]
#[command(name = "cogflux")]
#[command(author = "Synheart AI Inc")]
#[command(version = COGFLUX_VERSION)]
#[command(about = "Analyze cognitive assessment sessions over time", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract per-session feature vectors from raw sessions
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyze a session history and print the report
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// What the input records are
        #[arg(long, default_value = "sessions")]
        input_kind: InputKind,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trend model weights (JSON); the statistical predictor is used without it
        #[arg(long)]
        model: Option<PathBuf>,

        /// Load an existing history before adding the input
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save the combined history after analysis
        #[arg(long)]
        save_history: Option<PathBuf>,
    },

    /// Validate raw session schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check display text against the forbidden-term list
    CheckMessage {
        /// Text to check
        text: String,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and model health
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a trend model weights file
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum InputKind {
    /// Raw cog.raw_session.v1 sessions
    Sessions,
    /// Extracted data points, as written by `extract`
    History,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (cog.raw_session.v1)
    Input,
    /// Output schema (analysis report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CogCliError> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            input_format,
            output_format,
            config,
        } => cmd_extract(&input, &output, input_format, output_format, config.as_deref()),

        Commands::Analyze {
            input,
            output,
            input_format,
            input_kind,
            config,
            model,
            load_history,
            save_history,
        } => cmd_analyze(
            &input,
            &output,
            input_format,
            input_kind,
            config.as_deref(),
            model.as_deref(),
            load_history.as_deref(),
            save_history.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::CheckMessage { text, json } => cmd_check_message(&text, json),

        Commands::Doctor {
            config,
            model,
            json,
        } => cmd_doctor(config.as_deref(), model.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), CogCliError> {
    let config = load_config(config)?;
    let sessions = read_sessions(input, &input_format)?;

    if sessions.is_empty() {
        return Err(CogCliError::NoSessions);
    }

    let points = SessionAdapter::to_data_points(&sessions, &config.memory)?;
    write_output(output, &format_output(&points, &output_format)?)
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    input_kind: InputKind,
    config: Option<&Path>,
    model: Option<&Path>,
    load_history: Option<&Path>,
    save_history: Option<&Path>,
) -> Result<(), CogCliError> {
    let config = load_config(config)?;
    let mut processor = CognitiveProcessor::with_config(config);
    if let Some(model_path) = model {
        processor = processor.with_model(model_path);
    }

    if let Some(history_path) = load_history {
        let history_json = fs::read_to_string(history_path)?;
        processor.load_history(&history_json)?;
    }

    let points = match input_kind {
        InputKind::Sessions => {
            let sessions = read_sessions(input, &input_format)?;
            SessionAdapter::to_data_points_with_history(
                &sessions,
                processor.history().points(),
                &processor.config().memory,
            )?
        }
        InputKind::History => read_points(input, &input_format)?,
    };

    if points.is_empty() && processor.history().is_empty() {
        return Err(CogCliError::NoSessions);
    }

    for point in points {
        processor.push(point)?;
    }

    let report = processor.report()?;

    if let Some(history_path) = save_history {
        fs::write(history_path, processor.save_history()?)?;
    }

    write_output(output, &(report + "\n"))
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), CogCliError> {
    let sessions = read_sessions(input, &input_format)?;
    let results = SessionAdapter::validate_sessions(&sessions);

    let report = ValidationReport {
        total_sessions: sessions.len(),
        valid_sessions: sessions.len() - results.len(),
        invalid_sessions: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                session_id: r.session_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total sessions:   {}", report.total_sessions);
        println!("Valid sessions:   {}", report.valid_sessions);
        println!("Invalid sessions: {}", report.invalid_sessions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Session {} (index {}): {}",
                    err.session_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_sessions > 0 {
        Err(CogCliError::ValidationFailed(report.invalid_sessions))
    } else {
        Ok(())
    }
}

fn cmd_check_message(text: &str, json: bool) -> Result<(), CogCliError> {
    let found = find_forbidden_terms(text);

    if json {
        let result = serde_json::json!({
            "safe": found.is_empty(),
            "forbidden_terms": found,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if found.is_empty() {
        println!("[OK] message is safe to display");
    } else {
        println!("[ERR] forbidden terms: {}", found.join(", "));
    }

    if found.is_empty() {
        Ok(())
    } else {
        Err(CogCliError::UnsafeMessage(found.join(", ")))
    }
}

fn cmd_doctor(config: Option<&Path>, model: Option<&Path>, json: bool) -> Result<(), CogCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "cogflux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("cogflux version {}", COGFLUX_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "safety_terms".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} forbidden terms loaded", FORBIDDEN_TERMS.len()),
    });

    let mut classifier = AnalysisConfig::default().classifier;
    match config {
        Some(path) if path.exists() => match fs::read_to_string(path) {
            Ok(content) => match AnalysisConfig::from_json(&content) {
                Ok(parsed) => {
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (z threshold {}, baseline {} sessions)",
                            parsed.anomaly.z_threshold, parsed.baseline.sessions
                        ),
                    });
                    classifier = parsed.classifier;
                }
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                }),
            },
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            }),
        },
        Some(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    match model {
        Some(path) => {
            let predictor = ModelTrendPredictor::lazy(path, classifier);
            match predictor.model() {
                Ok(_) => checks.push(DoctorCheck {
                    name: "trend_model".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Trend model loaded from {}", path.display()),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "trend_model".to_string(),
                    status: CheckStatus::Warning,
                    message: format!("{} (statistical fallback will be used)", e),
                }),
            }
        }
        None => checks.push(DoctorCheck {
            name: "trend_model".to_string(),
            status: CheckStatus::Ok,
            message: "No model configured, statistical predictor active".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (use -i - to read it)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: COGFLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("cogflux Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CogCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), CogCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Each session carries session_id, timestamp (epoch ms) and tasks.");
                println!("Every task is tagged by \"domain\":");
                println!();
                println!("1. reaction - trials: [{{ latency_ms, false_start, timed_out, calibration }}]");
                println!("2. memory   - presented_words, recalled_words, response_latency_ms");
                println!("3. pattern  - rounds: [{{ level, target_sequence, user_input, correct,");
                println!("               response_latencies_ms, completion_time_ms }}]");
                println!("4. language - transcript, duration_sec, pause_count, total_pause_ms");
                println!();
                println!("A session holds at most one task per domain.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: analysis report");
                println!();
                println!("- report_version: Report schema version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ computed_at_utc, latest_session_at_utc, session_count, ... }}");
                println!("- risk: {{ level, label, confidence, explanation, top_factors, message }}");
                println!("  level is one of: stable, change_detected, possible_risk");
                println!("- trend: {{ slopes, overall_direction }}");
                println!("- delta: {{ memoryDelta, reactionDelta, patternDelta, speechDelta }}");
                println!("- anomaly: {{ isAnomaly, anomalyScore, deviations }}");
                println!("- prediction: {{ available, message, result }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, CogCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), CogCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CogCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_sessions(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<AssessmentSession>, CogCliError> {
    let data = read_input(input)?;
    Ok(match input_format {
        InputFormat::Ndjson => SessionAdapter::parse_ndjson(&data)?,
        InputFormat::Json => SessionAdapter::parse_array(&data)?,
    })
}

fn read_points(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<SessionDataPoint>, CogCliError> {
    let data = read_input(input)?;
    match input_format {
        InputFormat::Json => Ok(serde_json::from_str(&data)?),
        InputFormat::Ndjson => data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line.trim()).map_err(|e| {
                    CogCliError::ParseError(format!("Failed to parse line {}: {}", idx + 1, e))
                })
            })
            .collect(),
    }
}

fn format_output(
    points: &[SessionDataPoint],
    format: &OutputFormat,
) -> Result<String, CogCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for point in points {
                lines.push(serde_json::to_string(point)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(points)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(points)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    let number = serde_json::json!({ "type": "number", "minimum": 0 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/cog.raw_session.v1.json",
        "title": "cog.raw_session.v1",
        "description": "cogflux raw assessment session schema",
        "type": "object",
        "required": ["schema_version", "session_id", "timestamp", "tasks"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "session_id": { "type": "string", "minLength": 1 },
            "timestamp": { "type": "integer", "description": "epoch milliseconds" },
            "user_id": { "type": "string" },
            "tasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["domain"],
                    "properties": {
                        "domain": {
                            "type": "string",
                            "enum": ["reaction", "memory", "pattern", "language"]
                        },
                        "trials": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["latency_ms"],
                                "properties": {
                                    "latency_ms": number,
                                    "false_start": { "type": "boolean" },
                                    "timed_out": { "type": "boolean" },
                                    "calibration": { "type": "boolean" }
                                }
                            }
                        },
                        "presented_words": { "type": "array", "items": { "type": "string" } },
                        "recalled_words": { "type": "array", "items": { "type": "string" } },
                        "response_latency_ms": number,
                        "interference_score": number,
                        "rounds": { "type": "array", "items": { "type": "object" } },
                        "transcript": { "type": "string" },
                        "duration_sec": number,
                        "pause_count": { "type": "integer", "minimum": 0 },
                        "total_pause_ms": number
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/cog.analysis_report.v1.json",
        "title": "cog.analysis_report.v1",
        "description": "cogflux analysis report schema",
        "type": "object",
        "required": ["report_version", "producer", "provenance", "risk", "trend", "delta", "anomaly", "prediction"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "computed_at_utc": { "type": "string" },
                    "latest_session_at_utc": { "type": "string" },
                    "latest_session_id": { "type": "string" },
                    "session_count": { "type": "integer" },
                    "baseline_sessions": { "type": "integer" }
                }
            },
            "risk": {
                "type": "object",
                "properties": {
                    "level": { "type": "string", "enum": ["stable", "change_detected", "possible_risk"] },
                    "label": { "type": "string" },
                    "confidence": { "type": "number" },
                    "anomaly_score": { "type": "number" },
                    "explanation": { "type": "string" },
                    "top_factors": { "type": "array", "items": { "type": "string" }, "maxItems": 3 },
                    "message": { "type": "string" },
                    "signal_count": { "type": "integer" }
                }
            },
            "trend": { "type": "object" },
            "delta": { "type": "object" },
            "anomaly": { "type": "object" },
            "prediction": {
                "type": "object",
                "required": ["available", "message"],
                "properties": {
                    "available": { "type": "boolean" },
                    "message": { "type": "string" },
                    "result": { "type": "object" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum CogCliError {
    Io(io::Error),
    Compute(cogflux::ComputeError),
    Json(serde_json::Error),
    NoSessions,
    ValidationFailed(usize),
    UnsafeMessage(String),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for CogCliError {
    fn from(e: io::Error) -> Self {
        CogCliError::Io(e)
    }
}

impl From<cogflux::ComputeError> for CogCliError {
    fn from(e: cogflux::ComputeError) -> Self {
        CogCliError::Compute(e)
    }
}

impl From<serde_json::Error> for CogCliError {
    fn from(e: serde_json::Error) -> Self {
        CogCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CogCliError> for CliError {
    fn from(e: CogCliError) -> Self {
        use cogflux::ComputeError;

        match e {
            CogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CogCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::Validation(_) => {
                        ("VALIDATION_ERROR", "Run 'cogflux validate' for details")
                    }
                    ComputeError::DuplicateSession(_) => {
                        ("DUPLICATE_SESSION", "Each session id may appear only once")
                    }
                    ComputeError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'cogflux doctor --config <file>'")
                    }
                    ComputeError::ModelLoad(_) | ComputeError::ModelShape(_) => {
                        ("MODEL_ERROR", "Run 'cogflux doctor --model <file>'")
                    }
                    ComputeError::UnsafeMessage(_) => {
                        ("UNSAFE_MESSAGE", "Display text must stay non-diagnostic")
                    }
                    _ => (
                        "PARSE_ERROR",
                        "Ensure input matches the cog.raw_session.v1 schema",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CogCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "No sessions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CogCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} sessions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            CogCliError::UnsafeMessage(terms) => CliError {
                code: "UNSAFE_MESSAGE".to_string(),
                message: format!("Message contains forbidden terms: {}", terms),
                hint: Some("Rephrase without diagnostic or medical wording".to_string()),
            },
            CogCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            CogCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_sessions: usize,
    valid_sessions: usize,
    invalid_sessions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    session_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
