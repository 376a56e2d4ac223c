//! Page Renderer: `Page` values to fixed-size HTML page containers.
//!
//! Output is one `.resume-page` element per page (816 × 1056 px) inside a container whose id
//! is the template's `container_id`. Clients rasterize each page element and post the images
//! to the export endpoint. Only blocks placed on a page are rendered there; section headings
//! are never repeated on continuation pages.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::layout::blocks::fragment_for;
use crate::layout::font_metrics::FontFamily;
use crate::layout::measure::Fragment;
use crate::layout::templates::{
    PageColumn, CONTENT_WIDTH_PX, PAGE_HEIGHT_PX, PAGE_PADDING_PX, PAGE_WIDTH_PX,
};
use crate::layout::{ColumnId, ContentBlock, Page, Section, TemplateStyle};
use crate::models::resume::{
    split_skill, EducationEntry, PersonalInfo, ResumeContent, SkillLine, WorkExperience,
};

const BASE_CSS: &str = "\
* { box-sizing: border-box; margin: 0; }
body { background: #e2e8f0; }
.resume-container { display: flex; flex-direction: column; align-items: center; gap: 16px; padding: 16px 0; }
.resume-page { background: #fff; overflow: hidden; position: relative; }
.page-content { height: 100%; }
h1 { font-size: 36px; line-height: 1.2; }
h2.section-header { font-size: 20px; border-bottom: 2px solid #cbd5e1; padding-bottom: 8px; margin-bottom: 16px; }
h3 { font-size: 16px; }
p, li, .skill { font-size: 14px; line-height: 1.625; }
.personal-header { margin-bottom: 32px; }
.personal-header .title { font-size: 20px; }
.personal-header .contact { font-size: 12px; }
.summary { margin-bottom: 32px; }
.item { margin-bottom: 24px; }
.item-heading { display: flex; justify-content: space-between; align-items: baseline; }
.dates { font-size: 12px; color: #64748b; }
ul { margin-top: 16px; padding-left: 16px; }
li + li { margin-top: 8px; }
.skill { margin-bottom: 8px; }
.columns { display: flex; gap: 32px; }
.creative { display: flex; }
.sidebar { background: #1e293b; color: #fff; padding: 48px 24px 48px 48px; }
.sidebar h2 { font-size: 12px; text-transform: uppercase; letter-spacing: 0.1em; margin: 24px 0 8px; }
";

/// Renders every page of one template as a standalone HTML document.
pub fn render_document(content: &ResumeContent, style: TemplateStyle, pages: &[Page]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>{}</title>\n<style>\n{BASE_CSS}</style>\n</head>\n<body>\n",
        encode_text(&content.personal_info.name)
    ));
    out.push_str(&format!(
        "<div id=\"{}\" class=\"resume-container\" style=\"font-family: {}\">\n",
        encode_double_quoted_attribute(&style.container_id()),
        font_stack(style.topology().scale.font)
    ));

    for page in pages {
        PageWriter {
            out: &mut out,
            content,
            style,
        }
        .page(page);
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn font_stack(font: FontFamily) -> &'static str {
    match font {
        FontFamily::Inter => "'Inter', sans-serif",
        FontFamily::EbGaramond => "'EB Garamond', serif",
        FontFamily::Lato => "'Lato', sans-serif",
    }
}

/// Heading text of a section as each template titles it.
pub fn section_title(style: TemplateStyle, section: Section) -> &'static str {
    match (style, section) {
        (TemplateStyle::CreativePortfolio, Section::Summary) => "Profile",
        (TemplateStyle::CreativePortfolio, Section::Experience) => "Work Experience",
        (TemplateStyle::ExecutiveElegance, Section::Summary) => "Professional Summary",
        (TemplateStyle::ExecutiveElegance, Section::Experience) => "Professional Experience",
        (TemplateStyle::ExecutiveElegance, Section::Skills) => "Core Competencies",
        (_, section) => section.label(),
    }
}

struct PageWriter<'a> {
    out: &'a mut String,
    content: &'a ResumeContent,
    style: TemplateStyle,
}

impl PageWriter<'_> {
    fn page(&mut self, page: &Page) {
        let content = self.content;
        self.out.push_str(&format!(
            "<div class=\"resume-page\" data-page=\"{}\" style=\"width: {PAGE_WIDTH_PX}px; height: {PAGE_HEIGHT_PX}px\">\n",
            page.index + 1
        ));

        match self.style {
            TemplateStyle::MinimalistTech | TemplateStyle::ExecutiveElegance => {
                self.open_padded();
                if page.is_first_page {
                    self.personal_header(&content.personal_info);
                }
                self.column(page.column(ColumnId::Main), CONTENT_WIDTH_PX);
                self.out.push_str("</div>\n");
            }
            TemplateStyle::CreativePortfolio => {
                self.out.push_str("<div class=\"page-content creative\">\n");
                if let Some(fixed) = self.style.topology().fixed {
                    self.sidebar(fixed.width + PAGE_PADDING_PX);
                }
                self.out.push_str(&format!(
                    "<main style=\"padding: {PAGE_PADDING_PX}px {PAGE_PADDING_PX}px {PAGE_PADDING_PX}px 24px\">\n"
                ));
                self.column(page.column(ColumnId::Main), 0.0);
                self.out.push_str("</main>\n</div>\n");
            }
            TemplateStyle::ModernHybrid => {
                self.open_padded();
                if page.is_first_page {
                    self.personal_header(&content.personal_info);
                    self.fragment(Fragment::Summary(&content.summary));
                }
                self.out.push_str("<div class=\"columns\">\n");
                for (id, class) in [(ColumnId::Primary, "primary"), (ColumnId::Secondary, "secondary")] {
                    let width = self
                        .style
                        .topology()
                        .columns
                        .iter()
                        .find(|spec| spec.id == id)
                        .map(|spec| spec.width)
                        .unwrap_or(0.0);
                    self.out
                        .push_str(&format!("<div class=\"column {class}\">\n"));
                    self.column(page.column(id), width);
                    self.out.push_str("</div>\n");
                }
                self.out.push_str("</div>\n</div>\n");
            }
        }

        self.out.push_str("</div>\n");
    }

    fn open_padded(&mut self) {
        self.out.push_str(&format!(
            "<div class=\"page-content\" style=\"padding: {PAGE_PADDING_PX}px\">\n"
        ));
    }

    /// Writes a column's blocks. A zero width means "fill the parent".
    fn column(&mut self, column: Option<&PageColumn>, width: f32) {
        let style = if width > 0.0 {
            format!(" style=\"width: {width}px\"")
        } else {
            String::new()
        };
        self.out.push_str(&format!("<div class=\"column-blocks\"{style}>\n"));
        for block in column.map(|c| c.blocks.as_slice()).unwrap_or_default() {
            self.block(block);
        }
        self.out.push_str("</div>\n");
    }

    fn block(&mut self, block: &ContentBlock) {
        let content = self.content;
        match fragment_for(block.kind, content) {
            Some(fragment) => self.fragment(fragment),
            None => tracing::warn!("Skipping block {:?}: index out of range", block.kind),
        }
    }

    fn fragment(&mut self, fragment: Fragment<'_>) {
        match fragment {
            Fragment::PersonalHeader(info) => self.personal_header(info),
            Fragment::Summary(text) => {
                if text.trim().is_empty() {
                    return;
                }
                self.out.push_str(&format!(
                    "<section class=\"summary\">\n<h2 class=\"section-header\">{}</h2>\n<p>{}</p>\n</section>\n",
                    section_title(self.style, Section::Summary),
                    encode_text(text)
                ));
            }
            Fragment::SectionHeader(section) => {
                self.out.push_str(&format!(
                    "<h2 class=\"section-header\">{}</h2>\n",
                    section_title(self.style, section)
                ));
            }
            Fragment::Experience(job) => self.experience(job),
            Fragment::Education(edu) => self.education(edu),
            Fragment::Skill(skill) => self.skill(skill),
        }
    }

    fn personal_header(&mut self, info: &PersonalInfo) {
        let contact: Vec<String> = info
            .contact_lines()
            .into_iter()
            .map(|line| encode_text(line).into_owned())
            .collect();
        self.out.push_str(&format!(
            "<header class=\"personal-header\">\n<h1>{}</h1>\n<p class=\"title\">{}</p>\n<p class=\"contact\">{}</p>\n</header>\n",
            encode_text(&info.name),
            encode_text(&info.title),
            contact.join(" | ")
        ));
    }

    fn experience(&mut self, job: &WorkExperience) {
        self.out.push_str(&format!(
            "<div class=\"item experience\">\n<div class=\"item-heading\"><h3>{}</h3><span class=\"dates\">{}</span></div>\n<p class=\"company\">{}</p>\n",
            encode_text(&job.title),
            encode_text(&job.dates),
            encode_text(&job.company)
        ));
        if !job.description.is_empty() {
            self.out.push_str("<ul>\n");
            for bullet in &job.description {
                self.out
                    .push_str(&format!("<li>{}</li>\n", encode_text(bullet)));
            }
            self.out.push_str("</ul>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn education(&mut self, edu: &EducationEntry) {
        self.out.push_str(&format!(
            "<div class=\"item education\">\n<div class=\"item-heading\"><h3>{}</h3><span class=\"dates\">{}</span></div>\n<p>{}</p>\n</div>\n",
            encode_text(&edu.institution),
            encode_text(&edu.dates),
            encode_text(&edu.degree)
        ));
    }

    fn skill(&mut self, skill: &str) {
        let body = match split_skill(skill) {
            SkillLine::Labeled { label, description } => format!(
                "<strong>{}:</strong>{}",
                encode_text(label),
                encode_text(description)
            ),
            SkillLine::Plain(text) => encode_text(text).into_owned(),
        };
        self.out
            .push_str(&format!("<div class=\"skill\">{body}</div>\n"));
    }

    /// Creative sidebar: name, contact, education, and skills in full on every page.
    fn sidebar(&mut self, width: f32) {
        let content = self.content;
        let info = &content.personal_info;
        self.out.push_str(&format!(
            "<aside class=\"sidebar\" style=\"width: {width}px\">\n<h1>{}</h1>\n<p class=\"title\">{}</p>\n<h2>Contact</h2>\n",
            encode_text(&info.name),
            encode_text(&info.title)
        ));
        for line in info.contact_lines() {
            self.out.push_str(&format!("<p>{}</p>\n", encode_text(line)));
        }
        if !content.education.is_empty() {
            self.out.push_str("<h2>Education</h2>\n");
            for edu in &content.education {
                self.education(edu);
            }
        }
        if !content.skills.is_empty() {
            self.out.push_str("<h2>Skills</h2>\n");
            for skill in &content.skills {
                self.skill(skill);
            }
        }
        self.out.push_str("</aside>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::blocks::tests::{make_content, FixedMeasurer};
    use crate::layout::measure::UnavailableMeasurer;
    use crate::layout::paginate;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn tall_measurer() -> FixedMeasurer {
        FixedMeasurer {
            header: 100.0,
            summary: 100.0,
            section_header: 40.0,
            item: 400.0,
        }
    }

    #[test]
    fn test_one_page_element_per_page() {
        let content = make_content(5, 1, 3);
        for style in TemplateStyle::ALL {
            let pages = paginate(&content, style, &tall_measurer());
            let html = render_document(&content, style, &pages);
            assert_eq!(count(&html, "class=\"resume-page\""), pages.len());
            assert!(html.contains(&format!("id=\"{}\"", style.container_id())));
        }
    }

    #[test]
    fn test_header_only_on_first_page() {
        let content = make_content(5, 0, 0);
        let pages = paginate(&content, TemplateStyle::MinimalistTech, &tall_measurer());
        assert!(pages.len() > 1);
        let html = render_document(&content, TemplateStyle::MinimalistTech, &pages);
        assert_eq!(count(&html, "class=\"personal-header\""), 1);
        // Experience heading is a block on page 1 only.
        assert_eq!(count(&html, ">Experience</h2>"), 1);
    }

    #[test]
    fn test_creative_sidebar_on_every_page() {
        let content = make_content(5, 2, 2);
        let pages = paginate(&content, TemplateStyle::CreativePortfolio, &tall_measurer());
        assert!(pages.len() > 1);
        let html = render_document(&content, TemplateStyle::CreativePortfolio, &pages);
        assert_eq!(count(&html, "class=\"sidebar\""), pages.len());
        assert_eq!(count(&html, "School 1"), pages.len());
        assert!(html.contains(">Work Experience</h2>"));
        assert!(html.contains(">Profile</h2>"));
    }

    #[test]
    fn test_hybrid_summary_rendered_once_above_columns() {
        let content = make_content(5, 1, 3);
        let pages = paginate(&content, TemplateStyle::ModernHybrid, &tall_measurer());
        let html = render_document(&content, TemplateStyle::ModernHybrid, &pages);
        assert_eq!(count(&html, "class=\"summary\""), 1);
        assert_eq!(count(&html, "class=\"columns\""), pages.len());
    }

    #[test]
    fn test_text_is_escaped() {
        let mut content = make_content(1, 0, 1);
        content.personal_info.name = "<script>alert(1)</script>".to_string();
        content.experience[0].description = vec!["R&D lead".to_string()];
        let pages = paginate(&content, TemplateStyle::MinimalistTech, &UnavailableMeasurer);
        let html = render_document(&content, TemplateStyle::MinimalistTech, &pages);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("R&amp;D lead"));
    }

    #[test]
    fn test_labeled_skill_is_bold() {
        let mut content = make_content(0, 0, 0);
        content.skills = vec!["Languages: Rust, Go".to_string(), "Docker".to_string()];
        let pages = paginate(&content, TemplateStyle::ExecutiveElegance, &UnavailableMeasurer);
        let html = render_document(&content, TemplateStyle::ExecutiveElegance, &pages);
        assert!(html.contains("<strong>Languages:</strong> Rust, Go"));
        assert!(html.contains("<div class=\"skill\">Docker</div>"));
        assert!(html.contains(">Core Competencies</h2>"));
    }
}
