use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{ResultRecord, Submission, Subtask};
use crate::ranking::{Leaderboard, OverallEntry, SubtaskEntry};

/// Which part of a [`Leaderboard`] to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LeaderboardView {
    #[default]
    All,
    Subtask1,
    Subtask2,
    Overall,
}

impl LeaderboardView {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardView::All => "all",
            LeaderboardView::Subtask1 => "subtask1",
            LeaderboardView::Subtask2 => "subtask2",
            LeaderboardView::Overall => "overall",
        }
    }

    fn shows_subtask(&self, subtask: Subtask) -> bool {
        match self {
            LeaderboardView::All => true,
            LeaderboardView::Subtask1 => subtask == Subtask::Subtask1,
            LeaderboardView::Subtask2 => subtask == Subtask::Subtask2,
            LeaderboardView::Overall => false,
        }
    }

    fn shows_overall(&self) -> bool {
        matches!(self, LeaderboardView::All | LeaderboardView::Overall)
    }
}

impl fmt::Display for LeaderboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON value of one view: the full leaderboard object for `All`, else the
/// bare array of entries.
pub fn leaderboard_view_json(leaderboard: &Leaderboard, view: LeaderboardView) -> Result<Value> {
    let value = match view {
        LeaderboardView::All => serde_json::to_value(leaderboard),
        LeaderboardView::Subtask1 => serde_json::to_value(&leaderboard.subtask1),
        LeaderboardView::Subtask2 => serde_json::to_value(&leaderboard.subtask2),
        LeaderboardView::Overall => serde_json::to_value(&leaderboard.overall),
    };
    value.with_context(|| format!("serialize {} leaderboard", view))
}

fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    let content =
        serde_json::to_string_pretty(value).with_context(|| format!("serialize {}", what))?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write a submission in pretty JSON format.
pub fn write_submission_json(path: &Path, submission: &Submission) -> Result<()> {
    write_pretty_json(path, submission, "submission")
}

/// Write one view of a leaderboard in pretty JSON format.
pub fn write_leaderboard_json(
    path: &Path,
    leaderboard: &Leaderboard,
    view: LeaderboardView,
) -> Result<()> {
    let value = leaderboard_view_json(leaderboard, view)?;
    write_pretty_json(path, &value, "leaderboard")
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn subtask_title(subtask: Subtask) -> &'static str {
    match subtask {
        Subtask::Subtask1 => "Subtask 1: Clinical Decision Making",
        Subtask::Subtask2 => "Subtask 2: Confabulation Detection",
    }
}

fn render_subtask_table(out: &mut String, subtask: Subtask, rows: &[SubtaskEntry]) {
    out.push_str(&format!("## {}\n\n", subtask_title(subtask)));
    if rows.is_empty() {
        out.push_str("_No results._\n\n");
        return;
    }
    match subtask {
        Subtask::Subtask1 => {
            out.push_str("| Rank | Participant | Accuracy | Correct / Total | Timestamp |\n");
            out.push_str("|---:|---|---:|---:|---|\n");
        }
        Subtask::Subtask2 => {
            out.push_str(
                "| Rank | Participant | Accuracy | Hallucination | Correct / Total | Timestamp |\n",
            );
            out.push_str("|---:|---|---:|---:|---:|---|\n");
        }
    }
    for row in rows {
        let hallucination = match (subtask, row.hallucination_rate) {
            (Subtask::Subtask2, Some(rate)) => format!(" {} |", percent(rate)),
            (Subtask::Subtask2, None) => " - |".to_string(),
            (Subtask::Subtask1, _) => String::new(),
        };
        out.push_str(&format!(
            "| {} | `{}` | {} |{} {} / {} | {} |\n",
            row.rank,
            row.participant_id,
            percent(row.accuracy),
            hallucination,
            row.correct_tasks,
            row.total_tasks,
            row.timestamp
        ));
    }
    out.push('\n');
}

fn render_overall_table(out: &mut String, rows: &[OverallEntry]) {
    out.push_str("## Overall\n\n");
    if rows.is_empty() {
        out.push_str("_No results._\n\n");
        return;
    }
    out.push_str("| Rank | Participant | Average Accuracy | Submissions | Latest |\n");
    out.push_str("|---:|---|---:|---:|---|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | `{}` | {} | {} | {} |\n",
            row.rank,
            row.participant_id,
            percent(row.avg_accuracy),
            row.submissions,
            row.latest_timestamp
        ));
    }
    out.push('\n');
}

/// Render the leaderboard as Markdown tables.
pub fn render_leaderboard_md(leaderboard: &Leaderboard, view: LeaderboardView) -> String {
    let mut out = String::new();
    out.push_str("# MedAgentBench Leaderboard\n\n");
    for subtask in Subtask::ALL {
        if view.shows_subtask(subtask) {
            render_subtask_table(&mut out, subtask, leaderboard.subtask(subtask));
        }
    }
    if view.shows_overall() {
        render_overall_table(&mut out, &leaderboard.overall);
    }
    out
}

/// Write leaderboard.md.
pub fn write_leaderboard_md(
    path: &Path,
    leaderboard: &Leaderboard,
    view: LeaderboardView,
) -> Result<()> {
    let md = render_leaderboard_md(leaderboard, view);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// One human-readable line per result, e.g.
/// `subtask2: 75.0% accuracy (15/20), hallucination 10.0%`.
pub fn summary_line(record: &ResultRecord) -> String {
    let mut line = format!(
        "{}: {} accuracy ({}/{})",
        record.subtask,
        percent(record.accuracy),
        record.correct_tasks,
        record.total_tasks
    );
    if let Some(rate) = record.hallucination_rate {
        line.push_str(&format!(", hallucination {}", percent(rate)));
    }
    line
}
