//! Fragment measurement: the one piece of pagination that depends on a rendering backend.
//!
//! The packer never looks at text. It asks a [`FragmentMeasurer`] for the rendered height of
//! each fragment once, before packing, and works purely on those numbers.
//!
//! Two backends ship:
//! - [`MetricMeasurer`]: headless estimate from static font-metric tables and a type scale.
//! - [`UnavailableMeasurer`]: always 0. This is the "surface not ready" mode; the packer turns it
//!   into a single page holding everything.

use serde::{Deserialize, Serialize};

use crate::layout::blocks::Section;
use crate::layout::font_metrics::{get_metrics, FontFamily, FontMetricTable};
use crate::layout::templates::TemplateStyle;
use crate::models::resume::{EducationEntry, PersonalInfo, WorkExperience};

/// A measurable piece of résumé content.
#[derive(Debug, Clone, Copy)]
pub enum Fragment<'a> {
    /// Name, title, and contact block shown at the top of the first page.
    PersonalHeader(&'a PersonalInfo),
    /// Summary section including its heading.
    Summary(&'a str),
    SectionHeader(Section),
    Experience(&'a WorkExperience),
    Education(&'a EducationEntry),
    Skill(&'a str),
}

/// Returns the rendered height of a fragment at a given column width, in CSS px.
///
/// Implementations must be deterministic for a fixed `(fragment, render_width)` and their own
/// style configuration. Returning 0 everywhere is a legal degraded mode.
pub trait FragmentMeasurer: Send + Sync {
    fn measure(&self, fragment: &Fragment<'_>, render_width: f32) -> f32;
}

/// Measurement surface is not available yet. Every fragment measures 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMeasurer;

impl FragmentMeasurer for UnavailableMeasurer {
    fn measure(&self, _fragment: &Fragment<'_>, _render_width: f32) -> f32 {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Type scale
// ────────────────────────────────────────────────────────────────────────────

/// Font sizes and vertical rhythm of one template, in CSS px.
///
/// Each template carries its own scale on its [`Topology`](crate::layout::templates::Topology);
/// the sizes follow the Tailwind classes its page markup uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeScale {
    pub font: FontFamily,
    pub body_px: f32,
    pub small_px: f32,
    pub name_px: f32,
    pub title_px: f32,
    pub item_title_px: f32,
    /// Line height as a multiple of font size.
    pub line_height: f32,
    /// Full height of a section heading: text line, underline rule, and the gap below it.
    pub section_header_px: f32,
    /// Space between consecutive bullets of one job.
    pub bullet_gap_px: f32,
    /// Bullet list indent.
    pub bullet_indent_px: f32,
    /// Space below an experience or education item.
    pub item_gap_px: f32,
    /// Space below the personal header and the summary section.
    pub block_gap_px: f32,
}

impl TypeScale {
    /// `text-sm` body, `leading-relaxed`, `text-lg` headings over a 2px rule. Templates override
    /// from here.
    pub const BASE: TypeScale = TypeScale {
        font: FontFamily::Inter,
        body_px: 14.0,
        small_px: 12.0,
        name_px: 36.0,
        title_px: 20.0,
        item_title_px: 16.0,
        line_height: 1.625,
        section_header_px: 46.0,
        bullet_gap_px: 8.0,
        bullet_indent_px: 16.0,
        item_gap_px: 24.0,
        block_gap_px: 32.0,
    };

    fn line_px(&self, font_px: f32) -> f32 {
        font_px * self.line_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Metric measurer
// ────────────────────────────────────────────────────────────────────────────

/// Headless measurer: greedy word-wrap over static glyph widths.
pub struct MetricMeasurer {
    scale: TypeScale,
    metrics: &'static FontMetricTable,
}

impl MetricMeasurer {
    pub fn new(scale: TypeScale) -> Self {
        let metrics = get_metrics(scale.font);
        Self { scale, metrics }
    }

    /// Height of `text` wrapped into `width` at `font_px`.
    fn text_height(&self, text: &str, width: f32, font_px: f32) -> f32 {
        let lines = self.metrics.wrapped_lines_px(text, width, font_px);
        lines as f32 * self.scale.line_px(font_px)
    }

    fn personal_header(&self, info: &PersonalInfo, width: f32) -> f32 {
        let s = &self.scale;
        let contact = info.contact_lines().join(" | ");
        self.text_height(&info.name, width, s.name_px)
            + self.text_height(&info.title, width, s.title_px)
            + self.text_height(&contact, width, s.small_px)
            + s.block_gap_px
    }

    fn summary(&self, summary: &str, width: f32) -> f32 {
        if summary.trim().is_empty() {
            return 0.0;
        }
        let s = &self.scale;
        s.section_header_px + self.text_height(summary, width, s.body_px) + s.block_gap_px
    }

    fn experience(&self, job: &WorkExperience, width: f32) -> f32 {
        let s = &self.scale;
        // Title and dates share the first row; dates are short enough to ride along.
        let heading = format!("{} {}", job.title, job.dates);
        let bullet_width = (width - s.bullet_indent_px).max(0.0);
        let bullets: f32 = job
            .description
            .iter()
            .map(|b| self.text_height(b, bullet_width, s.body_px))
            .sum();
        let gaps = job.description.len().saturating_sub(1) as f32 * s.bullet_gap_px;
        let list_top = if job.description.is_empty() { 0.0 } else { 16.0 };

        self.text_height(&heading, width, s.item_title_px)
            + self.text_height(&job.company, width, s.body_px)
            + list_top
            + bullets
            + gaps
            + s.item_gap_px
    }

    fn education(&self, edu: &EducationEntry, width: f32) -> f32 {
        let s = &self.scale;
        let heading = format!("{} {}", edu.institution, edu.dates);
        self.text_height(&heading, width, s.item_title_px)
            + self.text_height(&edu.degree, width, s.body_px)
            + s.item_gap_px
    }

    fn skill(&self, skill: &str, width: f32) -> f32 {
        self.text_height(skill, width, self.scale.body_px) + self.scale.bullet_gap_px
    }
}

impl FragmentMeasurer for MetricMeasurer {
    fn measure(&self, fragment: &Fragment<'_>, render_width: f32) -> f32 {
        match fragment {
            Fragment::PersonalHeader(info) => self.personal_header(info, render_width),
            Fragment::Summary(text) => self.summary(text, render_width),
            Fragment::SectionHeader(_) => self.scale.section_header_px,
            Fragment::Experience(job) => self.experience(job, render_width),
            Fragment::Education(edu) => self.education(edu, render_width),
            Fragment::Skill(skill) => self.skill(skill, render_width),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend selection
// ────────────────────────────────────────────────────────────────────────────

/// Which measurement backend the service paginates with. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Metrics,
    Unavailable,
}

impl Measurement {
    /// Parses the `LAYOUT_MEASUREMENT` setting.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metrics" | "on" => Some(Self::Metrics),
            "off" | "none" | "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }

    /// Builds the measurer for one template (each template has its own type scale).
    pub fn measurer_for(&self, style: TemplateStyle) -> Box<dyn FragmentMeasurer> {
        match self {
            Self::Metrics => Box::new(MetricMeasurer::new(style.topology().type_scale())),
            Self::Unavailable => Box::new(UnavailableMeasurer),
        }
    }
}

/// Clamps a measurer result to a usable height. Negative and NaN become 0.
pub(crate) fn sanitize_height(height: f32) -> f32 {
    if height.is_finite() && height > 0.0 {
        height
    } else if height == f32::INFINITY {
        f32::MAX
    } else {
        0.0
    }
}
