//! Page Fill Analysis: how well each packed page uses its height.
//!
//! Packing is greedy, so a page ends wherever the next atomic item stops fitting. This module
//! reports the resulting fill so clients can flag pages that are mostly empty or that were
//! forced past their capacity by an oversized item.
//!
//! # Fill bands
//! - fill < 92%            → TooMuchWhitespace
//! - 92% ≤ fill ≤ 100%     → Acceptable
//! - 100% < fill ≤ 105%    → MinorOverflow
//! - fill > 105%           → MajorOverflow
//!
//! The last page of a résumé is normally short; callers decide whether that matters.

use serde::{Deserialize, Serialize};

const WHITESPACE_LIMIT: f32 = 0.08;
const MINOR_OVERFLOW_LIMIT: f32 = 1.05;

/// Overall page fill verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFillVerdict {
    Acceptable,
    TooMuchWhitespace,
    MinorOverflow,
    MajorOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFillAnalysis {
    pub used_height: f32,
    pub capacity: f32,
    pub whitespace_fraction: f32,
    pub overflow_fraction: f32,
    pub verdict: PageFillVerdict,
}

/// Analyzes one page given the height used by its fullest column.
///
/// A non-positive capacity reports the page as empty rather than dividing by zero.
pub fn analyze_page_fill(used_height: f32, capacity: f32) -> PageFillAnalysis {
    let fill_ratio = if capacity > 0.0 {
        used_height / capacity
    } else {
        0.0
    };

    let whitespace_fraction = (1.0_f32 - fill_ratio).max(0.0);
    let overflow_fraction = (fill_ratio - 1.0_f32).max(0.0);

    let verdict = if fill_ratio > MINOR_OVERFLOW_LIMIT {
        PageFillVerdict::MajorOverflow
    } else if fill_ratio > 1.0 {
        PageFillVerdict::MinorOverflow
    } else if whitespace_fraction > WHITESPACE_LIMIT {
        PageFillVerdict::TooMuchWhitespace
    } else {
        PageFillVerdict::Acceptable
    };

    PageFillAnalysis {
        used_height,
        capacity,
        whitespace_fraction,
        overflow_fraction,
        verdict,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptable_fill_verdict() {
        // 880 / 912 = 96.5% fill
        let analysis = analyze_page_fill(880.0, 912.0);
        assert_eq!(analysis.verdict, PageFillVerdict::Acceptable);
        assert!(analysis.whitespace_fraction < 0.08);
        assert_eq!(analysis.overflow_fraction, 0.0);
    }

    #[test]
    fn test_too_much_whitespace_verdict() {
        let analysis = analyze_page_fill(600.0, 912.0);
        assert_eq!(analysis.verdict, PageFillVerdict::TooMuchWhitespace);
        assert!(analysis.whitespace_fraction > 0.3);
    }

    #[test]
    fn test_minor_overflow_verdict() {
        // 950 / 912 = 104.2%
        let analysis = analyze_page_fill(950.0, 912.0);
        assert_eq!(analysis.verdict, PageFillVerdict::MinorOverflow);
        assert!(analysis.overflow_fraction > 0.0 && analysis.overflow_fraction <= 0.05);
    }

    #[test]
    fn test_major_overflow_verdict() {
        let analysis = analyze_page_fill(1400.0, 912.0);
        assert_eq!(analysis.verdict, PageFillVerdict::MajorOverflow);
        assert!(analysis.overflow_fraction > 0.05);
    }

    #[test]
    fn test_exactly_full_is_acceptable() {
        let analysis = analyze_page_fill(960.0, 960.0);
        assert_eq!(analysis.verdict, PageFillVerdict::Acceptable);
        assert_eq!(analysis.whitespace_fraction, 0.0);
    }

    #[test]
    fn test_empty_page_is_whitespace() {
        let analysis = analyze_page_fill(0.0, 950.0);
        assert_eq!(analysis.verdict, PageFillVerdict::TooMuchWhitespace);
        assert!((analysis.whitespace_fraction - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_capacity_does_not_divide() {
        let analysis = analyze_page_fill(100.0, 0.0);
        assert!(analysis.whitespace_fraction.is_finite());
        assert_eq!(analysis.overflow_fraction, 0.0);
    }
}
