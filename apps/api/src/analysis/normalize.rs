//! Local post-processing applied to every oracle reply.
//!
//! The model reliably misreads "AI" as "Al" (lowercase L) in scanned or pasted text, and
//! emits date ranges with inconsistent hyphen spacing. Both are fixed here, after decoding
//! and before schema validation, so nothing downstream ever sees the raw form.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::resume::ResumeContent;

/// Whole-word "Al" only. "Alpha", "Alan", "AL" are left alone. Word boundaries are ASCII, so
/// accented letters count as separators: "éAl" becomes "éAI".
static AI_TYPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)Al(?-u:\b)").unwrap());

/// A hyphen with any surrounding whitespace.
static DATE_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());

pub fn fix_ai_typo(text: &str) -> Cow<'_, str> {
    AI_TYPO_RE.replace_all(text, "AI")
}

/// Applies [`fix_ai_typo`] to every string in a JSON tree. Object keys are untouched.
pub fn fix_ai_typo_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Cow::Owned(fixed) = fix_ai_typo(s) {
                *s = fixed;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(fix_ai_typo_value),
        Value::Object(map) => map.values_mut().for_each(fix_ai_typo_value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// `"2020-2021"`, `"2020  -  2021"` → `"2020 - 2021"`.
pub fn normalize_date_range(dates: &str) -> Cow<'_, str> {
    DATE_DASH_RE.replace_all(dates, " - ")
}

/// Normalizes the date string of every experience and education entry.
pub fn normalize_dates(content: &mut ResumeContent) {
    let dates = content
        .experience
        .iter_mut()
        .map(|job| &mut job.dates)
        .chain(content.education.iter_mut().map(|edu| &mut edu.dates));

    for date in dates {
        if let Cow::Owned(fixed) = normalize_date_range(date) {
            *date = fixed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::blocks::tests::make_content;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_fixes_whole_word_only() {
        assert_eq!(fix_ai_typo("Al Engineer"), "AI Engineer");
        assert_eq!(fix_ai_typo("Built Al/ML pipelines"), "Built AI/ML pipelines");
        assert_eq!(fix_ai_typo("Alpha team"), "Alpha team");
        assert_eq!(fix_ai_typo("Worked with Alan"), "Worked with Alan");
        assert_eq!(fix_ai_typo("AL and al"), "AL and al");
    }

    #[test]
    fn test_word_boundary_is_ascii() {
        assert_eq!(fix_ai_typo("éAl"), "éAI");
        assert_eq!(fix_ai_typo("Alé"), "AIé");
        assert_eq!(fix_ai_typo("Équipe Al, Zürich"), "Équipe AI, Zürich");
        assert_eq!(fix_ai_typo("Al_ops"), "Al_ops");
    }

    #[test]
    fn test_fix_is_borrowed_when_nothing_changes() {
        assert!(matches!(fix_ai_typo("Rust, Go"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fix_recurses_through_json() {
        let mut value = json!({
            "personalInfo": {"title": "Al Engineer", "linkedin": null},
            "skills": ["Al", "Alpha"],
            "Al": 3
        });
        fix_ai_typo_value(&mut value);
        assert_eq!(value["personalInfo"]["title"], "AI Engineer");
        assert_eq!(value["skills"], json!(["AI", "Alpha"]));
        assert_eq!(value["Al"], 3);
        assert!(value["personalInfo"]["linkedin"].is_null());
    }

    #[test]
    fn test_date_range_spacing() {
        for input in ["2020-2021", "2020 - 2021", "2020  -  2021", "2020 -2021", "2020\t-\n2021"] {
            assert_eq!(normalize_date_range(input), "2020 - 2021", "input {input:?}");
        }
        assert_eq!(normalize_date_range("May 2019 – Present"), "May 2019 – Present");
        assert_eq!(normalize_date_range("2019"), "2019");
    }

    #[test]
    fn test_normalize_dates_touches_experience_and_education() {
        let mut content = make_content(1, 1, 0);
        content.experience[0].dates = "2018-2020".to_string();
        content.education[0].dates = "2010 -2014".to_string();
        content.summary = "2001-2002".to_string();

        normalize_dates(&mut content);

        assert_eq!(content.experience[0].dates, "2018 - 2020");
        assert_eq!(content.education[0].dates, "2010 - 2014");
        assert_eq!(content.summary, "2001-2002");
    }

    proptest! {
        #[test]
        fn prop_fix_ai_typo_is_idempotent(text in "[A-Za-l ./]{0,40}") {
            let once = fix_ai_typo(&text).into_owned();
            let twice = fix_ai_typo(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalize_date_range_is_idempotent(text in "[0-9 \\-]{0,24}") {
            let once = normalize_date_range(&text).into_owned();
            let twice = normalize_date_range(&once).into_owned();
            prop_assert_eq!(once, twice);
        }
    }
}
