//! MedAgentBench leaderboard CLI
//!
//! The `medbench` command turns evaluation outputs into leaderboard data.
//!
//! ## Commands
//!
//! - `normalize`: Convert one evaluation output into a canonical submission
//! - `submit`: Build a submission for a participant from raw framework output
//! - `rank`: Rank many submissions per subtask and overall

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use medbench_core::{
    build_leaderboard, generate_framework_submission, generate_submission, leaderboard_view_json,
    normalize_batch, normalize_strict, obs::RankingSpan, render_leaderboard_md, summary_line,
    write_submission_json, Framework, InputKind, Leaderboard, LeaderboardView, NormalizeContext,
    ScenarioDescriptor, Submission, METRICS,
};

#[derive(Parser)]
#[command(name = "medbench")]
#[command(author = "MedBench Leaderboard Maintainers")]
#[command(version = medbench_core::VERSION)]
#[command(about = "MedAgentBench leaderboard results engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize one evaluation output into a submission
    Normalize {
        /// Evaluation output (JSON)
        input: PathBuf,

        /// Write the submission here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Participant id for results that do not name one
        #[arg(long, env = "MEDBENCH_PARTICIPANT_ID")]
        participant_id: Option<String>,

        /// Scenario file (TOML) supplying the default participant id
        /// when `--participant-id` is not given
        #[arg(long)]
        scenario: Option<PathBuf>,
    },

    /// Build a submission for one participant from raw framework output
    Submit {
        /// Raw evaluation output (JSON)
        input: PathBuf,

        /// Participant the results belong to
        participant_id: String,

        /// Producer of the input
        #[arg(long, value_enum, default_value_t = InputTypeArg::Auto)]
        input_type: InputTypeArg,

        /// Read the input as this framework's native output, keeping its
        /// reported rates and optional fields (overrides `--input-type`)
        #[arg(long, value_enum)]
        framework: Option<FrameworkArg>,

        /// Save the submission as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Rank submissions into a leaderboard
    Rank {
        /// Submission or evaluation output files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Which leaderboard to report
        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,

        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Write the leaderboard here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputTypeArg {
    Auto,
    Agentify,
    FhirEval,
    Agentbeats,
}

impl From<InputTypeArg> for InputKind {
    fn from(arg: InputTypeArg) -> Self {
        match arg {
            InputTypeArg::Auto => InputKind::Auto,
            InputTypeArg::Agentify => InputKind::Agentify,
            InputTypeArg::FhirEval => InputKind::FhirEval,
            InputTypeArg::Agentbeats => InputKind::AgentBeats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrameworkArg {
    #[value(name = "agentify-medagentbench")]
    AgentifyMedAgentBench,
    #[value(name = "fhiragentevaluator")]
    FhirAgentEvaluator,
}

impl From<FrameworkArg> for Framework {
    fn from(arg: FrameworkArg) -> Self {
        match arg {
            FrameworkArg::AgentifyMedAgentBench => Framework::AgentifyMedAgentBench,
            FrameworkArg::FhirAgentEvaluator => Framework::FhirAgentEvaluator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    All,
    Subtask1,
    Subtask2,
    Overall,
}

impl From<ViewArg> for LeaderboardView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => LeaderboardView::All,
            ViewArg::Subtask1 => LeaderboardView::Subtask1,
            ViewArg::Subtask2 => LeaderboardView::Subtask2,
            ViewArg::Overall => LeaderboardView::Overall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Markdown,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    medbench_core::init_tracing(cli.json, medbench_core::telemetry::level_for(cli.verbose));

    let result = match cli.command {
        Commands::Normalize {
            input,
            output,
            participant_id,
            scenario,
        } => cmd_normalize(
            &input,
            output.as_deref(),
            participant_id.as_deref(),
            scenario.as_deref(),
        ),
        Commands::Submit {
            input,
            participant_id,
            input_type,
            framework,
            save,
        } => cmd_submit(
            &input,
            &participant_id,
            input_type.into(),
            framework.map(Framework::from),
            save.as_deref(),
        ),
        Commands::Rank {
            files,
            view,
            format,
            output,
        } => cmd_rank(&files, view.into(), format, output.as_deref()),
    };

    METRICS.flush();
    result
}

fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
            info!(event = "output.written", path = %path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Default participant id from the flag, else the scenario file.
fn default_participant(
    participant_id: Option<&str>,
    scenario: Option<&Path>,
) -> Result<Option<String>> {
    if let Some(id) = participant_id {
        return Ok(Some(id.to_string()));
    }
    match scenario {
        Some(path) => {
            let descriptor = ScenarioDescriptor::load(path)
                .with_context(|| format!("Failed to load scenario {:?}", path))?;
            Ok(Some(descriptor.default_participant_id().to_string()))
        }
        None => Ok(None),
    }
}

/// Normalize one evaluation output into a submission
fn cmd_normalize(
    input: &Path,
    output: Option<&Path>,
    participant_id: Option<&str>,
    scenario: Option<&Path>,
) -> Result<()> {
    let doc = read_json_file(input)?;
    let mut ctx = NormalizeContext::new();
    if let Some(id) = default_participant(participant_id, scenario)? {
        ctx = ctx.with_default_participant(id);
    }

    let submission = normalize_strict(doc, &ctx)
        .with_context(|| format!("Failed to normalize {:?}", input))?;
    info!(
        event = "normalize.done",
        input = %input.display(),
        records = submission.results.len(),
    );
    emit(&serde_json::to_string_pretty(&submission)?, output)
}

/// Build and optionally save a submission for one participant
fn cmd_submit(
    input: &Path,
    participant_id: &str,
    kind: InputKind,
    framework: Option<Framework>,
    save: Option<&Path>,
) -> Result<()> {
    let doc = read_json_file(input)?;
    let submission = match framework {
        Some(framework) => generate_framework_submission(&doc, participant_id, framework),
        None => generate_submission(&doc, participant_id, kind),
    }
    .with_context(|| format!("Failed to build submission from {:?}", input))?;

    for line in submission_summary(&submission) {
        println!("{}", line);
    }

    match save {
        Some(path) => {
            write_submission_json(path, &submission)?;
            println!("Saved submission to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&submission)?),
    }
    Ok(())
}

fn submission_summary(submission: &Submission) -> Vec<String> {
    let mut lines = vec![format!(
        "Submission for {} ({} result(s))",
        submission.fallback_participant(),
        submission.results.len()
    )];
    lines.extend(
        submission
            .results
            .iter()
            .map(|record| format!("  {}", summary_line(record))),
    );
    lines
}

/// Rank every recognized file into a leaderboard
fn cmd_rank(
    files: &[PathBuf],
    view: LeaderboardView,
    format: FormatArg,
    output: Option<&Path>,
) -> Result<()> {
    let docs = files
        .iter()
        .map(|path| read_json_file(path))
        .collect::<Result<Vec<_>>>()?;

    let span = RankingSpan::enter(view.as_str());
    let batch = normalize_batch(docs, &NormalizeContext::new());
    for index in &batch.skipped {
        tracing::warn!(event = "rank.file_skipped", path = %files[*index].display());
    }
    for (index, rejected) in &batch.rejected {
        tracing::warn!(
            event = "rank.record_rejected",
            path = %files[*index].display(),
            record = rejected.record,
            error = %rejected.error,
        );
    }

    let leaderboard = build_leaderboard(&batch.submissions);
    drop(span);
    emit(&render(&leaderboard, view, format)?, output)
}

fn render(leaderboard: &Leaderboard, view: LeaderboardView, format: FormatArg) -> Result<String> {
    match format {
        FormatArg::Json => {
            let value = leaderboard_view_json(leaderboard, view)?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        FormatArg::Markdown => Ok(render_leaderboard_md(leaderboard, view)),
    }
}
