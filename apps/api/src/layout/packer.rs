//! Page Packer: greedy first-fit-in-order over one or more column queues.
//!
//! # Algorithm
//! For each page, every column (in packing order) starts at the page's reserved height and
//! appends its next block while `used + height <= capacity`. A column stops at the first block
//! that does not fit; blocks are never reordered and there is no look-ahead. Once every column
//! has stopped the page is emitted and each column resumes from its own cursor.
//!
//! # Forced progress
//! If a page would receive no block at all, exactly one block is placed anyway (from the first
//! column, in packing order, that still has blocks). A block taller than the page therefore
//! occupies a page of its own and overflows it, and packing always terminates.
//!
//! At least one page is produced, even when every queue is empty.

use serde::Serialize;

use crate::layout::blocks::ContentBlock;

/// Vertical budget of a page, in the same units as block heights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageBudget {
    pub capacity: f32,
    /// Height already taken on the first page (name header, fixed summary).
    pub first_page_reserved: f32,
}

impl PageBudget {
    pub fn new(capacity: f32, first_page_reserved: f32) -> Self {
        Self {
            capacity,
            first_page_reserved,
        }
    }

    pub fn reserved(&self, page_index: usize) -> f32 {
        if page_index == 0 {
            self.first_page_reserved
        } else {
            0.0
        }
    }
}

/// One column's share of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackedColumn {
    pub blocks: Vec<ContentBlock>,
    /// Height used on this page, reservation included.
    pub used_height: f32,
    /// Set when forced progress placed a block that does not fit.
    pub overflow: bool,
}

/// One emitted page; `columns[i]` corresponds to input queue `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedPage {
    pub columns: Vec<PackedColumn>,
}

/// Packs independent column queues into pages. Queues are given in packing order.
pub fn pack_columns(columns: &[Vec<ContentBlock>], budget: &PageBudget) -> Vec<PackedPage> {
    let mut cursors = vec![0usize; columns.len()];
    let mut pages: Vec<PackedPage> = Vec::new();

    loop {
        let reserved = budget.reserved(pages.len());

        let mut packed: Vec<PackedColumn> = columns
            .iter()
            .zip(cursors.iter_mut())
            .map(|(queue, cursor)| fill_column(queue, cursor, reserved, budget.capacity))
            .collect();

        if packed.iter().all(|c| c.blocks.is_empty()) {
            let next = columns
                .iter()
                .zip(cursors.iter())
                .position(|(queue, &cursor)| cursor < queue.len());
            if let Some(col) = next {
                let block = columns[col][cursors[col]].clone();
                cursors[col] += 1;
                let column = &mut packed[col];
                column.used_height += block.height;
                column.overflow = column.used_height > budget.capacity;
                column.blocks.push(block);
            }
        }

        pages.push(PackedPage { columns: packed });

        let exhausted = columns
            .iter()
            .zip(cursors.iter())
            .all(|(queue, &cursor)| cursor >= queue.len());
        if exhausted {
            break;
        }
    }

    pages
}

/// Greedily takes blocks from `queue` starting at `cursor`, advancing it past what was taken.
fn fill_column(
    queue: &[ContentBlock],
    cursor: &mut usize,
    reserved: f32,
    capacity: f32,
) -> PackedColumn {
    let start = *cursor;
    let mut used = reserved;

    while let Some(block) = queue.get(*cursor) {
        if used + block.height > capacity {
            break;
        }
        used += block.height;
        *cursor += 1;
    }

    PackedColumn {
        blocks: queue[start..*cursor].to_vec(),
        used_height: used,
        overflow: false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
