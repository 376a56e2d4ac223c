use serde::{Deserialize, Serialize};

/// Structured résumé as returned by the structuring oracle.
///
/// Immutable once produced: a new oracle round-trip yields a wholly new value,
/// callers never patch one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeContent {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<WorkExperience>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

impl PersonalInfo {
    /// Contact lines in display order (phone, email, linkedin, location, portfolio).
    pub fn contact_lines(&self) -> Vec<&str> {
        let mut lines = vec![self.phone.as_str(), self.email.as_str()];
        if let Some(linkedin) = self.linkedin.as_deref().filter(|s| !s.is_empty()) {
            lines.push(linkedin);
        }
        lines.push(self.location.as_str());
        if let Some(portfolio) = self.portfolio.as_deref().filter(|s| !s.is_empty()) {
            lines.push(portfolio);
        }
        lines
    }
}

/// One job. Atomic for pagination: never split across pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub title: String,
    /// Free text, never parsed into start/end.
    pub dates: String,
    pub description: Vec<String>,
}

/// One degree. Atomic for pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub dates: String,
}

/// A skill line split for bold-label rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillLine<'a> {
    Labeled { label: &'a str, description: &'a str },
    Plain(&'a str),
}

/// Splits `"Label: description"` on the first colon. Presentation only.
pub fn split_skill(skill: &str) -> SkillLine<'_> {
    match skill.split_once(':') {
        Some((label, description)) => SkillLine::Labeled { label, description },
        None => SkillLine::Plain(skill),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ATS analysis
// ────────────────────────────────────────────────────────────────────────────

/// Score breakdown for one version of the résumé. Every field is in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsScoreBreakdown {
    pub score: u8,
    pub keyword_match: u8,
    pub formatting_compliance: u8,
    pub section_clarity: u8,
}

/// Before/after comparison produced wholesale by the scoring oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsAnalysis {
    pub before: AtsScoreBreakdown,
    pub after: AtsScoreBreakdown,
    pub improvements: Vec<String>,
}

impl AtsAnalysis {
    /// Points gained by the formatted version (negative if the oracle scored it lower).
    pub fn score_delta(&self) -> i16 {
        self.after.score as i16 - self.before.score as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info() -> PersonalInfo {
        PersonalInfo {
            name: "Ada Lovelace".to_string(),
            title: "Engineer".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            location: "London".to_string(),
            linkedin: None,
            portfolio: Some("ada.dev".to_string()),
        }
    }

    #[test]
    fn test_split_skill_on_first_colon_only() {
        assert_eq!(
            split_skill("Languages: Rust: systems, Go"),
            SkillLine::Labeled {
                label: "Languages",
                description: " Rust: systems, Go"
            }
        );
    }

    #[test]
    fn test_split_skill_without_colon_is_plain() {
        assert_eq!(split_skill("Kubernetes"), SkillLine::Plain("Kubernetes"));
    }

    #[test]
    fn test_contact_lines_skip_missing_optionals() {
        let info = make_info();
        assert_eq!(
            info.contact_lines(),
            vec!["555-0100", "ada@example.com", "London", "ada.dev"]
        );
    }

    #[test]
    fn test_personal_info_accepts_null_links() {
        let json = r#"{"name":"A","title":"B","email":"c","phone":"d","location":"e","linkedin":null}"#;
        let info: PersonalInfo = serde_json::from_str(json).unwrap();
        assert!(info.linkedin.is_none());
        assert!(info.portfolio.is_none());
    }

    #[test]
    fn test_resume_content_uses_camel_case_keys() {
        let content = ResumeContent {
            personal_info: make_info(),
            summary: String::new(),
            experience: vec![],
            education: vec![],
            skills: vec![],
        };
        let value = serde_json::to_value(&content).unwrap();
        assert!(value.get("personalInfo").is_some());
    }

    #[test]
    fn test_score_delta() {
        let before = AtsScoreBreakdown {
            score: 52,
            keyword_match: 40,
            formatting_compliance: 60,
            section_clarity: 55,
        };
        let after = AtsScoreBreakdown { score: 81, ..before };
        let analysis = AtsAnalysis {
            before,
            after,
            improvements: vec![],
        };
        assert_eq!(analysis.score_delta(), 29);
    }
}
