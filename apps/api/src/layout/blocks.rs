//! Content blocks: the packing unit.
//!
//! A résumé is flattened into an ordered list of blocks per column. Each section contributes a
//! header block followed by one block per atomic item; empty sections contribute nothing.
//! Blocks reference their source entity by index, so a block list is only meaningful next to
//! the `ResumeContent` it was built from.

use serde::{Deserialize, Serialize};

use crate::layout::measure::{sanitize_height, Fragment, FragmentMeasurer};
use crate::models::resume::ResumeContent;

/// Résumé sections, in the order templates usually stack them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::Experience => "Experience",
            Section::Education => "Education",
            Section::Skills => "Skills",
        }
    }
}

/// What a block holds. Item variants carry the index of the entity in its source collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ref", rename_all = "snake_case")]
pub enum BlockKind {
    Summary,
    SectionHeader(Section),
    ExperienceItem(usize),
    EducationItem(usize),
    SkillItem(usize),
}

/// One indivisible unit of content plus its measured height.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    #[serde(flatten)]
    pub kind: BlockKind,
    pub height: f32,
}

/// Resolves a block back to the fragment it was measured from.
///
/// Returns `None` when the block's index does not exist in `content` (a block list paired
/// with the wrong résumé).
pub fn fragment_for<'a>(kind: BlockKind, content: &'a ResumeContent) -> Option<Fragment<'a>> {
    Some(match kind {
        BlockKind::Summary => Fragment::Summary(&content.summary),
        BlockKind::SectionHeader(section) => Fragment::SectionHeader(section),
        BlockKind::ExperienceItem(i) => Fragment::Experience(content.experience.get(i)?),
        BlockKind::EducationItem(i) => Fragment::Education(content.education.get(i)?),
        BlockKind::SkillItem(i) => Fragment::Skill(content.skills.get(i)?.as_str()),
    })
}

/// Flattens résumé sections into measured blocks for one column width.
pub struct BlockBuilder<'a> {
    content: &'a ResumeContent,
    measurer: &'a dyn FragmentMeasurer,
    width: f32,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(content: &'a ResumeContent, measurer: &'a dyn FragmentMeasurer, width: f32) -> Self {
        Self {
            content,
            measurer,
            width,
        }
    }

    /// Blocks for several sections, concatenated in the given order.
    pub fn column(&self, sections: &[Section]) -> Vec<ContentBlock> {
        sections.iter().flat_map(|s| self.section(*s)).collect()
    }

    /// Blocks for one section. Empty sections yield no header and no items.
    pub fn section(&self, section: Section) -> Vec<ContentBlock> {
        let content = self.content;
        let items: Vec<BlockKind> = match section {
            Section::Summary => {
                // The summary block already includes its heading.
                if content.summary.trim().is_empty() {
                    return Vec::new();
                }
                return vec![self.block(BlockKind::Summary)];
            }
            Section::Experience => (0..content.experience.len())
                .map(BlockKind::ExperienceItem)
                .collect(),
            Section::Education => (0..content.education.len())
                .map(BlockKind::EducationItem)
                .collect(),
            Section::Skills => (0..content.skills.len()).map(BlockKind::SkillItem).collect(),
        };

        if items.is_empty() {
            return Vec::new();
        }

        std::iter::once(BlockKind::SectionHeader(section))
            .chain(items)
            .map(|kind| self.block(kind))
            .collect()
    }

    fn block(&self, kind: BlockKind) -> ContentBlock {
        let height = fragment_for(kind, self.content)
            .map(|fragment| sanitize_height(self.measurer.measure(&fragment, self.width)))
            .unwrap_or(0.0);
        ContentBlock { kind, height }
    }
}
