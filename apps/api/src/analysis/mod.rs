//! Analysis Oracle Client: structuring and ATS scoring round-trips.
//!
//! Flow for one formatting pass:
//! 1. `structure`: raw text (+ optional job description) → `ResumeContent`
//! 2. `score_ats`: raw text + structured content (+ job description) → `AtsAnalysis`
//!
//! Each reply is decoded, passed through local post-processing (the "Al" → "AI" fix, date
//! spacing), then validated. Any failure along the way is a single `OracleError`; there are
//! no partial results.

pub mod normalize;
pub mod oracle;
pub mod prompts;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::llm_client::prompts::NO_FABRICATION_INSTRUCTION;
use crate::llm_client::LlmError;
use crate::models::resume::{AtsAnalysis, AtsScoreBreakdown, ResumeContent};

use normalize::{fix_ai_typo_value, normalize_dates};
pub use oracle::Oracle;
use prompts::{
    ANALYSIS_SYSTEM, ATS_SCHEMA, OPTIMIZE_PROMPT_TEMPLATE, RESUME_SCHEMA,
    SCORE_GENERIC_PROMPT_TEMPLATE, SCORE_WITH_JD_PROMPT_TEMPLATE, STRUCTURE_PROMPT_TEMPLATE,
};

const MIN_IMPROVEMENTS: usize = 3;
const MAX_IMPROVEMENTS: usize = 5;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("oracle reply does not match the schema: {0}")]
    Schema(String),

    #[error("failed to encode résumé for scoring: {0}")]
    Encode(serde_json::Error),
}

/// A blank or whitespace-only job description counts as absent.
pub fn present_job_description(job_description: Option<&str>) -> Option<&str> {
    job_description.map(str::trim).filter(|jd| !jd.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Round-trips
// ────────────────────────────────────────────────────────────────────────────

/// Structures raw résumé text. With a job description the oracle rewrites for keyword
/// alignment; without one it must keep the wording exactly.
pub async fn structure(
    oracle: &dyn Oracle,
    raw_text: &str,
    job_description: Option<&str>,
) -> Result<ResumeContent, OracleError> {
    let prompt = match present_job_description(job_description) {
        Some(jd) => render_prompt(
            OPTIMIZE_PROMPT_TEMPLATE,
            &[
                ("schema", RESUME_SCHEMA),
                ("raw_text", raw_text),
                ("job_description", jd),
            ],
        ),
        None => render_prompt(
            STRUCTURE_PROMPT_TEMPLATE,
            &[("schema", RESUME_SCHEMA), ("raw_text", raw_text)],
        ),
    };

    let mut value = oracle.generate_json(&prompt, ANALYSIS_SYSTEM).await?;
    fix_ai_typo_value(&mut value);

    let mut content: ResumeContent = decode(value)?;
    normalize_dates(&mut content);

    info!(
        "Structured résumé: {} jobs, {} schools, {} skills",
        content.experience.len(),
        content.education.len(),
        content.skills.len()
    );
    Ok(content)
}

/// Scores the original text against the structured version.
pub async fn score_ats(
    oracle: &dyn Oracle,
    raw_text: &str,
    content: &ResumeContent,
    job_description: Option<&str>,
) -> Result<AtsAnalysis, OracleError> {
    let content_json = serde_json::to_string(content).map_err(OracleError::Encode)?;

    let prompt = match present_job_description(job_description) {
        Some(jd) => render_prompt(
            SCORE_WITH_JD_PROMPT_TEMPLATE,
            &[
                ("schema", ATS_SCHEMA),
                ("raw_text", raw_text),
                ("content_json", &content_json),
                ("job_description", jd),
            ],
        ),
        None => render_prompt(
            SCORE_GENERIC_PROMPT_TEMPLATE,
            &[
                ("schema", ATS_SCHEMA),
                ("raw_text", raw_text),
                ("content_json", &content_json),
            ],
        ),
    };

    let mut value = oracle.generate_json(&prompt, ANALYSIS_SYSTEM).await?;
    fix_ai_typo_value(&mut value);

    let raw: RawAnalysis = decode(value)?;
    let analysis = raw.validate()?;

    info!(
        "ATS analysis: {} → {} ({:+}, {} improvements)",
        analysis.before.score,
        analysis.after.score,
        analysis.score_delta(),
        analysis.improvements.len()
    );
    Ok(analysis)
}

/// Both round-trips in order. The second only runs if the first succeeded.
pub async fn format_and_score(
    oracle: &dyn Oracle,
    raw_text: &str,
    job_description: Option<&str>,
) -> Result<(ResumeContent, AtsAnalysis), OracleError> {
    let content = structure(oracle, raw_text, job_description).await?;
    let analysis = score_ats(oracle, raw_text, &content, job_description).await?;
    Ok((content, analysis))
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt rendering
// ────────────────────────────────────────────────────────────────────────────

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Fills `{name}` placeholders in one pass, so substituted text is never re-scanned.
/// Unknown placeholders are left as written.
fn render_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let body = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        vars.iter()
            .find(|(name, _)| *name == &caps[1])
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });
    format!("{body}\n\n{NO_FABRICATION_INSTRUCTION}")
}

// ────────────────────────────────────────────────────────────────────────────
// Schema validation
// ────────────────────────────────────────────────────────────────────────────

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, OracleError> {
    serde_json::from_value(value).map_err(|e| OracleError::Schema(e.to_string()))
}

/// Scores as the model sends them: any JSON number.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBreakdown {
    score: f64,
    keyword_match: f64,
    formatting_compliance: f64,
    section_clarity: f64,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    before: RawBreakdown,
    after: RawBreakdown,
    improvements: Vec<String>,
}

impl RawAnalysis {
    fn validate(self) -> Result<AtsAnalysis, OracleError> {
        let count = self.improvements.len();
        if !(MIN_IMPROVEMENTS..=MAX_IMPROVEMENTS).contains(&count) {
            return Err(OracleError::Schema(format!(
                "expected {MIN_IMPROVEMENTS}-{MAX_IMPROVEMENTS} improvements, got {count}"
            )));
        }

        Ok(AtsAnalysis {
            before: self.before.validate("before")?,
            after: self.after.validate("after")?,
            improvements: self.improvements,
        })
    }
}

impl RawBreakdown {
    fn validate(&self, side: &str) -> Result<AtsScoreBreakdown, OracleError> {
        Ok(AtsScoreBreakdown {
            score: to_score(side, "score", self.score)?,
            keyword_match: to_score(side, "keywordMatch", self.keyword_match)?,
            formatting_compliance: to_score(side, "formattingCompliance", self.formatting_compliance)?,
            section_clarity: to_score(side, "sectionClarity", self.section_clarity)?,
        })
    }
}

/// Accepts integral values in 0..=100 (`87.0` is 87).
fn to_score(side: &str, field: &str, value: f64) -> Result<u8, OracleError> {
    if value.is_finite() && value.fract() == 0.0 && (0.0..=100.0).contains(&value) {
        Ok(value as u8)
    } else {
        Err(OracleError::Schema(format!(
            "{side}.{field} must be an integer between 0 and 100, got {value}"
        )))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
