//! Template Layout Strategies: four declarative topologies over one packer.
//!
//! A template only decides three things: the page capacity, what the first page reserves at
//! the top, and which sections flow into which column (in packing order). Everything else is
//! the shared packer.

use serde::{Deserialize, Serialize};

use crate::layout::blocks::{BlockBuilder, ContentBlock, Section};
use crate::layout::font_metrics::FontFamily;
use crate::layout::measure::{sanitize_height, Fragment, FragmentMeasurer, TypeScale};
use crate::layout::packer::{pack_columns, PageBudget};
use crate::layout::page_fill::{analyze_page_fill, PageFillAnalysis};
use crate::models::resume::ResumeContent;

/// US Letter at 96 DPI.
pub const PAGE_WIDTH_PX: f32 = 816.0;
pub const PAGE_HEIGHT_PX: f32 = 1056.0;
pub const PAGE_PADDING_PX: f32 = 48.0;
/// Full width inside the page padding.
pub const CONTENT_WIDTH_PX: f32 = PAGE_WIDTH_PX - 2.0 * PAGE_PADDING_PX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateStyle {
    #[serde(alias = "Minimalist Tech")]
    MinimalistTech,
    #[serde(alias = "Executive Elegance")]
    ExecutiveElegance,
    #[serde(alias = "Creative Portfolio")]
    CreativePortfolio,
    #[default]
    #[serde(alias = "Modern Hybrid")]
    ModernHybrid,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 4] = [
        TemplateStyle::MinimalistTech,
        TemplateStyle::ExecutiveElegance,
        TemplateStyle::CreativePortfolio,
        TemplateStyle::ModernHybrid,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateStyle::MinimalistTech => "Minimalist Tech",
            TemplateStyle::ExecutiveElegance => "Executive Elegance",
            TemplateStyle::CreativePortfolio => "Creative Portfolio",
            TemplateStyle::ModernHybrid => "Modern Hybrid",
        }
    }

    /// DOM id of the page container, e.g. `resume-container-modern-hybrid`.
    pub fn container_id(&self) -> String {
        format!(
            "resume-container-{}",
            self.display_name().to_lowercase().replace(' ', "-")
        )
    }

    pub fn topology(&self) -> &'static Topology {
        match self {
            TemplateStyle::MinimalistTech => &MINIMALIST_TECH,
            TemplateStyle::ExecutiveElegance => &EXECUTIVE_ELEGANCE,
            TemplateStyle::CreativePortfolio => &CREATIVE_PORTFOLIO,
            TemplateStyle::ModernHybrid => &MODERN_HYBRID,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Topology descriptors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnId {
    Main,
    Sidebar,
    Primary,
    Secondary,
}

/// What the first page sets aside above the packed columns. Measured at full content width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    None,
    PersonalHeader,
    PersonalHeaderAndSummary,
}

/// A packed column: its width and the sections that flow into it, in order.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub width: f32,
    pub sections: &'static [Section],
}

/// A column rendered in full on every page and never packed.
#[derive(Debug, Clone, Copy)]
pub struct FixedColumn {
    pub id: ColumnId,
    pub width: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Topology {
    pub capacity: f32,
    pub scale: TypeScale,
    pub reservation: Reservation,
    /// Packed columns in packing order.
    pub columns: &'static [ColumnSpec],
    pub fixed: Option<FixedColumn>,
}

const SINGLE_COLUMN: &[ColumnSpec] = &[ColumnSpec {
    id: ColumnId::Main,
    width: CONTENT_WIDTH_PX,
    sections: &[
        Section::Summary,
        Section::Experience,
        Section::Education,
        Section::Skills,
    ],
}];

static MINIMALIST_TECH: Topology = Topology {
    capacity: 912.0,
    // Small uppercase section headings, `text-md` title line.
    scale: TypeScale {
        title_px: 16.0,
        section_header_px: 36.0,
        ..TypeScale::BASE
    },
    reservation: Reservation::PersonalHeader,
    columns: SINGLE_COLUMN,
    fixed: None,
};

static EXECUTIVE_ELEGANCE: Topology = Topology {
    capacity: 912.0,
    // Serif, `text-base` body, `text-xl` headings with a wider list indent.
    scale: TypeScale {
        font: FontFamily::EbGaramond,
        body_px: 16.0,
        small_px: 14.0,
        title_px: 18.0,
        item_title_px: 18.0,
        section_header_px: 54.0,
        bullet_gap_px: 12.0,
        bullet_indent_px: 20.0,
        ..TypeScale::BASE
    },
    reservation: Reservation::PersonalHeader,
    columns: SINGLE_COLUMN,
    fixed: None,
};

// 70/30 split of the content width.
static CREATIVE_PORTFOLIO: Topology = Topology {
    capacity: 960.0,
    // `text-3xl` name, `text-2xl` headings over a 4px rule.
    scale: TypeScale {
        font: FontFamily::Lato,
        name_px: 30.0,
        title_px: 16.0,
        item_title_px: 18.0,
        section_header_px: 60.0,
        ..TypeScale::BASE
    },
    reservation: Reservation::None,
    columns: &[ColumnSpec {
        id: ColumnId::Main,
        width: 499.2,
        sections: &[Section::Summary, Section::Experience],
    }],
    fixed: Some(FixedColumn {
        id: ColumnId::Sidebar,
        width: 172.8,
    }),
};

// Secondary (skills) is packed before primary.
static MODERN_HYBRID: Topology = Topology {
    capacity: 950.0,
    scale: TypeScale::BASE,
    reservation: Reservation::PersonalHeaderAndSummary,
    columns: &[
        ColumnSpec {
            id: ColumnId::Secondary,
            width: 268.8,
            sections: &[Section::Skills],
        },
        ColumnSpec {
            id: ColumnId::Primary,
            width: 419.2,
            sections: &[Section::Experience, Section::Education],
        },
    ],
    fixed: None,
};

impl Topology {
    pub fn type_scale(&self) -> TypeScale {
        self.scale
    }

    /// Height the first page reserves above the columns.
    pub fn reserved_height(&self, content: &ResumeContent, measurer: &dyn FragmentMeasurer) -> f32 {
        let measure =
            |fragment: Fragment<'_>| sanitize_height(measurer.measure(&fragment, CONTENT_WIDTH_PX));
        let header = || measure(Fragment::PersonalHeader(&content.personal_info));

        match self.reservation {
            Reservation::None => 0.0,
            Reservation::PersonalHeader => header(),
            Reservation::PersonalHeaderAndSummary => {
                header() + measure(Fragment::Summary(&content.summary))
            }
        }
    }

    /// Measured block queues, one per packed column, in packing order.
    pub fn column_blocks(
        &self,
        content: &ResumeContent,
        measurer: &dyn FragmentMeasurer,
    ) -> Vec<Vec<ContentBlock>> {
        self.columns
            .iter()
            .map(|spec| BlockBuilder::new(content, measurer, spec.width).column(spec.sections))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageColumn {
    pub id: ColumnId,
    pub blocks: Vec<ContentBlock>,
    pub used_height: f32,
    pub overflow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub index: usize,
    pub is_first_page: bool,
    pub columns: Vec<PageColumn>,
    pub fill: PageFillAnalysis,
}

impl Page {
    pub fn column(&self, id: ColumnId) -> Option<&PageColumn> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn overflow(&self) -> bool {
        self.columns.iter().any(|c| c.overflow)
    }

    pub fn block_count(&self) -> usize {
        self.columns.iter().map(|c| c.blocks.len()).sum()
    }
}

/// Paginates `content` for one template. Pure: same inputs, same pages.
pub fn paginate(
    content: &ResumeContent,
    style: TemplateStyle,
    measurer: &dyn FragmentMeasurer,
) -> Vec<Page> {
    let topology = style.topology();
    let budget = PageBudget::new(
        topology.capacity,
        topology.reserved_height(content, measurer),
    );
    let queues = topology.column_blocks(content, measurer);

    let pages: Vec<Page> = pack_columns(&queues, &budget)
        .into_iter()
        .enumerate()
        .map(|(index, packed)| {
            let columns: Vec<PageColumn> = topology
                .columns
                .iter()
                .zip(packed.columns)
                .map(|(spec, column)| PageColumn {
                    id: spec.id,
                    blocks: column.blocks,
                    used_height: column.used_height,
                    overflow: column.overflow,
                })
                .collect();

            let used = columns.iter().map(|c| c.used_height).fold(0.0, f32::max);
            let page = Page {
                index,
                is_first_page: index == 0,
                columns,
                fill: analyze_page_fill(used, topology.capacity),
            };

            if page.overflow() {
                tracing::warn!(
                    template = style.display_name(),
                    page = index + 1,
                    used_height = used,
                    capacity = topology.capacity,
                    "block taller than the page was forced onto its own page"
                );
            }
            page
        })
        .collect();

    tracing::debug!(
        template = style.display_name(),
        pages = pages.len(),
        blocks = pages.iter().map(Page::block_count).sum::<usize>(),
        "paginated"
    );
    pages
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
