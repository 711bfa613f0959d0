use std::fmt::Write as _;

use factify_core::payload::{
    AiDetectionResult, FindSourcesResult, ImageDetection, ManipulationResult, PredictionRecord,
    ResultPayload, UserProfile,
};
use factify_core::social::{AnalysisSummary, Comment, Post};
use factify_engine::outcome::AnalysisOutcome;
use factify_runtime::history::HistoryEntry;
use serde_json::{Value, json};

pub fn outcome_json(outcome: &AnalysisOutcome) -> Value {
    json!({
        "kind": outcome.kind,
        "task_id": outcome.task_id.as_ref().map(|t| t.as_str()),
        "stage": outcome.stage_label(),
        "result": outcome.result.as_ref().ok(),
        "error": outcome.error_message(),
        "timings": {
            "submit_ms": outcome.timings.submit_ms,
            "poll_ms": outcome.timings.poll_ms,
        },
    })
}

pub fn payload(p: &ResultPayload) -> String {
    match p {
        ResultPayload::AiDetection(r) => ai_detection(r),
        ResultPayload::Manipulation(r) => manipulation(r),
        ResultPayload::FindSources(r) => find_sources(r),
    }
}

fn ai_detection(r: &AiDetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "AI-generated: {:.1}%", r.ai_probability);
    let _ = writeln!(out, "Human-written: {:.1}%", r.human_probability);
    if !r.segments.is_empty() {
        let _ = writeln!(out, "\nSegments:");
        for s in &r.segments {
            let _ = writeln!(
                out,
                "  [{}] {:>5.1}% AI  {}",
                s.index,
                s.prob_generated * 100.0,
                s.text.trim()
            );
        }
    }
    out
}

fn manipulation(r: &ManipulationResult) -> String {
    if r.result.is_empty() {
        return "No manipulation techniques found.\n".to_string();
    }
    let mut out = String::new();
    for (category, fragments) in &r.result {
        let _ = writeln!(out, "{category}:");
        for (fragment, reasons) in fragments {
            let _ = writeln!(out, "  \"{fragment}\"");
            for reason in reasons {
                let _ = writeln!(out, "    - {reason}");
            }
        }
    }
    out
}

fn find_sources(r: &FindSourcesResult) -> String {
    if r.result.is_empty() {
        return "No citations found.\n".to_string();
    }
    let mut out = String::new();
    for (i, f) in r.result.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}. {} [{} / {}]", i + 1, f.citation, f.status, f.category);
        if !f.analysis.trim().is_empty() {
            let _ = writeln!(out, "   {}", f.analysis.trim());
        }
        for src in &f.sources {
            let _ = writeln!(out, "   -> {src}");
        }
    }
    out
}

pub fn image(d: &ImageDetection) -> String {
    let verdict = if d.is_ai { "AI-generated" } else { "Real" };
    let mut out = String::new();
    let _ = writeln!(out, "{}: {verdict} ({:.1}% confidence)", d.filename, d.confidence * 100.0);
    let _ = writeln!(
        out,
        "  ai {:.1}%  real {:.1}%",
        d.predictions.ai * 100.0,
        d.predictions.real * 100.0
    );
    out
}

pub fn profile(p: &UserProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Username: {}", p.username);
    if !p.name.is_empty() {
        let _ = writeln!(out, "Name:     {}", p.name);
    }
    if !p.email.is_empty() {
        let _ = writeln!(out, "Email:    {}", p.email);
    }
    if !p.roles.is_empty() {
        let _ = writeln!(out, "Roles:    {}", p.roles.join(", "));
    }
    out
}

pub fn predictions(items: &[PredictionRecord]) -> String {
    if items.is_empty() {
        return "No analyses yet.\n".to_string();
    }
    let mut out = String::new();
    for p in items {
        let when = p.when().unwrap_or("-");
        let text = p.text.as_deref().map(|t| summarize(t, 60)).unwrap_or_default();
        let _ = writeln!(out, "{when}  {text}");
    }
    out
}

/// `viewer` marks the posts the signed-in user liked or wrote.
pub fn feed(posts: &[Post], viewer: Option<&str>) -> String {
    if posts.is_empty() {
        return "The feed is empty.\n".to_string();
    }
    let mut out = String::new();
    for (i, p) in posts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mine = viewer.is_some_and(|v| p.is_authored_by(v));
        let _ = writeln!(
            out,
            "[{}] {}{}  {}",
            p.id,
            p.username,
            if mine { " (you)" } else { "" },
            p.created_at.as_deref().unwrap_or("-")
        );
        if let Some(content) = p.content.as_deref().filter(|c| !c.trim().is_empty()) {
            let _ = writeln!(out, "  {}", content.trim());
        }
        if let Some(a) = &p.analysis_data {
            let _ = writeln!(out, "  Analysis: {} (score {:.2})", a.label, a.score);
            if !a.text_preview.is_empty() {
                let _ = writeln!(out, "    {}", summarize(&a.text_preview, 80));
            }
        }
        let liked = viewer.is_some_and(|v| p.liked_by(v));
        let _ = writeln!(
            out,
            "  {} likes{}  {} comments",
            p.likes.len(),
            if liked { " (incl. you)" } else { "" },
            p.comments_count
        );
    }
    out
}

pub fn comments(items: &[Comment]) -> String {
    if items.is_empty() {
        return "No comments yet.\n".to_string();
    }
    let mut out = String::new();
    for c in items {
        let _ = writeln!(out, "[{}] {}: {}", c.id, c.username, c.text.trim());
    }
    out
}

pub fn analysis_summaries(items: &[AnalysisSummary]) -> String {
    if items.is_empty() {
        return "No stored analyses to share.\n".to_string();
    }
    let mut out = String::new();
    for a in items {
        let _ = writeln!(
            out,
            "{}  {:<10} {:.2}  {}",
            a.id,
            a.label,
            a.score,
            summarize(&a.text_preview, 60)
        );
    }
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "History is empty.\n".to_string();
    }
    let mut out = String::new();
    for e in entries.iter().rev() {
        let _ = write!(
            out,
            "{}  {:<12} {:<10} {}",
            e.ts_unix_ms, e.kind, e.outcome, e.input_summary
        );
        if let Some(err) = &e.error {
            let _ = write!(out, "  ({err})");
        }
        out.push('\n');
    }
    out
}

fn summarize(text: &str, max: usize) -> String {
    factify_core::types::truncate_chars(&text.replace('\n', " "), max)
}
