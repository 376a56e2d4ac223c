//! Application Controller: the per-session state machine.
//!
//! ```text
//!            begin_format ──► (formatting) ──complete Ok──► Results ◄──┐
//!   Input ◄──────────────────────── reset ─────────────────────────┤  │
//!            ◄─ complete Err (error recorded, stays in Input)       │  │
//!                                     Results ─ begin_reoptimize ─► (re-optimizing)
//! ```
//!
//! Oracle work happens outside the controller. `begin_*` validates and hands out a
//! [`Ticket`]; the caller runs the round-trips without holding any lock and reports back
//! through [`Controller::complete`]. A reset in between bumps the generation, and the late
//! outcome is discarded instead of resurrecting cleared state.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::{present_job_description, OracleError};
use crate::export::{export_file_name, PageSize};
use crate::layout::{paginate, Measurement, Page, TemplateStyle};
use crate::models::resume::{AtsAnalysis, ResumeContent};

pub const EMPTY_RESUME_MESSAGE: &str = "Please provide your résumé content.";
pub const EMPTY_JOB_DESCRIPTION_MESSAGE: &str =
    "Please provide a job description to re-optimize against.";
pub const FORMAT_FAILED_MESSAGE: &str =
    "An error occurred while formatting your résumé. Please try again.";
pub const REOPTIMIZE_FAILED_MESSAGE: &str =
    "An error occurred while analyzing your résumé. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppView {
    #[default]
    Input,
    Results,
}

/// Sub-view of the results screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsTab {
    #[default]
    Preview,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Format,
    Reoptimize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Format => write!(f, "format"),
            Operation::Reoptimize => write!(f, "re-optimize"),
        }
    }
}

/// Everything the caller needs to run one oracle pass, stamped with the generation it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub operation: Operation,
    pub raw_text: String,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The session was reset after the ticket was issued.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("a {0} request is already in progress")]
    InFlight(Operation),

    #[error("this action is not available from the {0:?} view")]
    WrongView(AppView),

    #[error("there is no formatted résumé yet")]
    NoResume,
}

impl ControllerError {
    fn validation(field: &'static str, message: &str) -> Self {
        ControllerError::Validation {
            field,
            message: message.to_string(),
        }
    }
}

/// Serializable view of the controller.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub view: AppView,
    pub tab: ResultsTab,
    pub template: TemplateStyle,
    pub container_id: String,
    pub page_size: PageSize,
    pub raw_text: String,
    pub job_description: String,
    pub content: Option<ResumeContent>,
    pub analysis: Option<AtsAnalysis>,
    pub is_formatting: bool,
    pub is_reoptimizing: bool,
    pub can_reoptimize: bool,
    pub error: Option<String>,
    pub export_file_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct Controller {
    raw_text: String,
    job_description: String,
    content: Option<ResumeContent>,
    analysis: Option<AtsAnalysis>,
    formatting: bool,
    reoptimizing: bool,
    error: Option<String>,
    template: TemplateStyle,
    page_size: PageSize,
    tab: ResultsTab,
    view: AppView,
    generation: u64,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<&ResumeContent> {
        self.content.as_ref()
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn template(&self) -> TemplateStyle {
        self.template
    }

    // ── input ────────────────────────────────────────────────────────────────

    /// Replaces the raw résumé text (paste or upload). Input view only.
    pub fn set_raw_text(&mut self, text: String) -> Result<(), ControllerError> {
        self.require_view(AppView::Input)?;
        self.raw_text = text;
        Ok(())
    }

    /// Starts a formatting pass. `raw_text`/`job_description` overwrite the stored values
    /// when given.
    pub fn begin_format(
        &mut self,
        raw_text: Option<String>,
        job_description: Option<String>,
    ) -> Result<Ticket, ControllerError> {
        self.require_view(AppView::Input)?;
        if self.formatting {
            return Err(ControllerError::InFlight(Operation::Format));
        }

        if let Some(raw_text) = raw_text {
            self.raw_text = raw_text;
        }
        if let Some(job_description) = job_description {
            self.job_description = job_description;
        }

        if self.raw_text.trim().is_empty() {
            self.error = Some(EMPTY_RESUME_MESSAGE.to_string());
            return Err(ControllerError::validation("raw_text", EMPTY_RESUME_MESSAGE));
        }

        self.formatting = true;
        self.error = None;
        self.content = None;
        self.analysis = None;

        Ok(self.ticket(Operation::Format, self.job_description.clone()))
    }

    /// Starts a re-optimization against a new job description. Results view only; a blank
    /// job description is rejected before any oracle call.
    pub fn begin_reoptimize(&mut self, job_description: &str) -> Result<Ticket, ControllerError> {
        self.require_view(AppView::Results)?;
        if self.reoptimizing {
            return Err(ControllerError::InFlight(Operation::Reoptimize));
        }
        if self.raw_text.trim().is_empty() {
            return Err(ControllerError::validation("raw_text", EMPTY_RESUME_MESSAGE));
        }
        if present_job_description(Some(job_description)).is_none() {
            return Err(ControllerError::validation(
                "job_description",
                EMPTY_JOB_DESCRIPTION_MESSAGE,
            ));
        }

        self.reoptimizing = true;
        self.error = None;

        Ok(self.ticket(Operation::Reoptimize, job_description.to_string()))
    }

    fn ticket(&self, operation: Operation, job_description: String) -> Ticket {
        Ticket {
            generation: self.generation,
            operation,
            raw_text: self.raw_text.clone(),
            job_description: Some(job_description).filter(|jd| !jd.trim().is_empty()),
        }
    }

    /// Applies the outcome of a ticket's oracle pass.
    ///
    /// Success replaces content, analysis, and job description wholesale. Failure records the
    /// operation's retryable message and leaves any prior results in place.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: &Result<(ResumeContent, AtsAnalysis), OracleError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            info!(
                "Discarding stale {} result (generation {} != {})",
                ticket.operation, ticket.generation, self.generation
            );
            return Completion::Discarded;
        }

        match ticket.operation {
            Operation::Format => self.formatting = false,
            Operation::Reoptimize => self.reoptimizing = false,
        }

        match outcome {
            Ok((content, analysis)) => {
                self.content = Some(content.clone());
                self.analysis = Some(analysis.clone());
                self.job_description = ticket.job_description.unwrap_or_default();
                self.view = AppView::Results;
                self.error = None;
            }
            Err(e) => {
                warn!("{} failed: {e}", ticket.operation);
                self.error = Some(
                    match ticket.operation {
                        Operation::Format => FORMAT_FAILED_MESSAGE,
                        Operation::Reoptimize => REOPTIMIZE_FAILED_MESSAGE,
                    }
                    .to_string(),
                );
            }
        }
        Completion::Applied
    }

    /// Discards everything derived from the current input and returns to the input view.
    /// Any in-flight pass becomes stale.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    // ── presentation ─────────────────────────────────────────────────────────

    pub fn select_template(&mut self, template: TemplateStyle) {
        self.template = template;
    }

    pub fn select_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
    }

    pub fn select_tab(&mut self, tab: ResultsTab) {
        self.tab = tab;
    }

    /// Repaginates the current content. `template` overrides the selected one for this call.
    pub fn pages(
        &self,
        measurement: Measurement,
        template: Option<TemplateStyle>,
    ) -> Result<Vec<Page>, ControllerError> {
        let content = self.content.as_ref().ok_or(ControllerError::NoResume)?;
        let style = template.unwrap_or(self.template);
        let measurer = measurement.measurer_for(style);
        Ok(paginate(content, style, measurer.as_ref()))
    }

    pub fn export_file_name(&self) -> Option<String> {
        self.content
            .as_ref()
            .map(|c| export_file_name(&c.personal_info.name))
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            view: self.view,
            tab: self.tab,
            template: self.template,
            container_id: self.template.container_id(),
            page_size: self.page_size,
            raw_text: self.raw_text.clone(),
            job_description: self.job_description.clone(),
            content: self.content.clone(),
            analysis: self.analysis.clone(),
            is_formatting: self.formatting,
            is_reoptimizing: self.reoptimizing,
            can_reoptimize: self.view == AppView::Results
                && !self.reoptimizing
                && !self.job_description.trim().is_empty(),
            error: self.error.clone(),
            export_file_name: self.export_file_name(),
        }
    }

    fn require_view(&self, expected: AppView) -> Result<(), ControllerError> {
        if self.view == expected {
            Ok(())
        } else {
            Err(ControllerError::WrongView(self.view))
        }
    }
}
