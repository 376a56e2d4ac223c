// Pagination engine: measure fragments, build blocks, pack them into fixed-height pages.
// Everything here is synchronous and pure apart from the injected measurer.

pub mod blocks;
pub mod font_metrics;
pub mod measure;
pub mod packer;
pub mod page_fill;
pub mod templates;

// Re-export the public API consumed by the session controller, renderer, and handlers.
pub use blocks::{ContentBlock, Section};
pub use measure::Measurement;
pub use templates::{paginate, ColumnId, Page, TemplateStyle};
