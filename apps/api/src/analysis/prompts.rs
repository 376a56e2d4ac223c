// Prompt templates for the structuring and scoring round-trips.
// Placeholders ({raw_text}, {job_description}, {content_json}, {schema}) are filled with
// `str::replace` before sending.

/// System prompt for both round-trips.
pub const ANALYSIS_SYSTEM: &str = "You are an expert résumé writer and ATS \
    (Applicant Tracking System) analyst. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Shape of `ResumeContent`.
pub const RESUME_SCHEMA: &str = r#"{
  "personalInfo": {
    "name": "string",
    "title": "string",
    "email": "string",
    "phone": "string",
    "location": "string",
    "linkedin": "string or null",
    "portfolio": "string or null"
  },
  "summary": "string",
  "experience": [
    {"company": "string", "title": "string", "dates": "string", "description": ["string"]}
  ],
  "education": [
    {"institution": "string", "degree": "string", "dates": "string"}
  ],
  "skills": ["string"]
}"#;

/// Shape of `AtsAnalysis`.
pub const ATS_SCHEMA: &str = r#"{
  "before": {"score": 0, "keywordMatch": 0, "formattingCompliance": 0, "sectionClarity": 0},
  "after": {"score": 0, "keywordMatch": 0, "formattingCompliance": 0, "sectionClarity": 0},
  "improvements": ["string"]
}"#;

/// Structuring without a job description: parse only, keep the wording.
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"Parse the raw résumé text below into structured JSON.

Rules:
- Do NOT change the original wording. Your only job is to parse and structure.
- Keep every fact exactly as written.
- Map headings onto the four sections: summary, experience, education, skills.
- Put each bullet of a job into its own "description" entry.
- If a skill line has a category, write it as "Category: item, item".

Return a JSON object with this EXACT schema (no extra fields):
{schema}

[RAW RÉSUMÉ TEXT]
---
{raw_text}
---"#;

/// Structuring with a job description: rewrite for keyword alignment.
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"Rewrite the raw résumé text below into structured, ATS-friendly JSON tailored to the target job.

Rules:
- Keep every fact. Rephrase, reorder bullets, and surface keywords from the job description where the résumé supports them.
- Start each bullet with a strong action verb.
- Map headings onto the four sections: summary, experience, education, skills.
- If a skill line has a category, write it as "Category: item, item".

Return a JSON object with this EXACT schema (no extra fields):
{schema}

[RAW RÉSUMÉ TEXT]
---
{raw_text}
---

[TARGET JOB DESCRIPTION]
---
{job_description}
---"#;

/// Scoring against a job description.
pub const SCORE_WITH_JD_PROMPT_TEMPLATE: &str = r#"Compare the original résumé text with its improved, structured version and score both for the target job.

Rules:
- Score each version from 0 to 100 (integers). The improved version should score meaningfully higher.
- Break each score into keywordMatch, formattingCompliance, and sectionClarity (integers, 0 to 100).
- List 3 to 5 specific improvements that were made and why each helps for THIS job.

Return a JSON object with this EXACT schema (no extra fields):
{schema}

[ORIGINAL RÉSUMÉ TEXT]
---
{raw_text}
---

[IMPROVED RÉSUMÉ JSON]
---
{content_json}
---

[TARGET JOB DESCRIPTION]
---
{job_description}
---"#;

/// Scoring on general best practice.
pub const SCORE_GENERIC_PROMPT_TEMPLATE: &str = r#"Compare the original résumé text with its improved, structured version and score both on general ATS best practice.

Rules:
- Score each version from 0 to 100 (integers). The improved version should score higher because of its structure and formatting.
- Break each score into keywordMatch, formattingCompliance, and sectionClarity (integers, 0 to 100).
- With no job description, base keywordMatch on strong action verbs and industry-standard skill terms. Keep it realistic.
- List 3 to 5 specific improvements to formatting, clarity, and structure, and why each helps ATS parsing and readability.

Return a JSON object with this EXACT schema (no extra fields):
{schema}

[ORIGINAL RÉSUMÉ TEXT]
---
{raw_text}
---

[IMPROVED RÉSUMÉ JSON]
---
{content_json}
---"#;
