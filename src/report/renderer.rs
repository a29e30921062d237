//! Renders a [`Report`] as a paginated A4 PDF and as an HTML email body.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::ApiError;
use crate::report::{ChildSummary, Report};

pub const REPORT_TITLE: &str = "Weekly Progress Report";

// A4 geometry in millimetres. The child list starts below the header block
// on the first page and at the top margin on continuation pages.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const TITLE_Y: f32 = 277.0;
const SUMMARY_START_Y: f32 = 265.0;
const FIRST_PAGE_CHILD_START: f32 = 240.0;
const NEXT_PAGE_CHILD_START: f32 = 277.0;
const LINE_HEIGHT: f32 = 7.0;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 11.0;
const CHILD_SIZE: f32 = 10.0;

fn summary_lines(report: &Report) -> [String; 3] {
    [
        format!("Parent: {}", report.parent_id),
        format!("Total sessions: {}", report.total_sessions),
        format!("Total progress updates: {}", report.total_progress_updates),
    ]
}

fn child_line(child: &ChildSummary) -> String {
    format!(
        "- {} | Sessions: {} | Goals: {} | Updates: {}",
        child.name, child.session_count, child.goal_count, child.progress_update_count
    )
}

/// Splits the child lines into pages. The cursor is checked against the
/// bottom margin before each line is drawn, so a line never lands below it;
/// the result always holds at least one (possibly empty) page.
fn paginate(lines: &[String]) -> Vec<Vec<String>> {
    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut y = FIRST_PAGE_CHILD_START;
    for line in lines {
        if y < MARGIN_BOTTOM {
            pages.push(std::mem::take(&mut current));
            y = NEXT_PAGE_CHILD_START;
        }
        current.push(line.clone());
        y -= LINE_HEIGHT;
    }
    pages.push(current);
    pages
}

pub fn render_pdf(report: &Report) -> Result<Vec<u8>, ApiError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "report");
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ApiError::Render(e.to_string()))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ApiError::Render(e.to_string()))?;

    let header = doc.get_page(first_page).get_layer(first_layer);
    header.use_text(REPORT_TITLE, TITLE_SIZE, Mm(MARGIN_LEFT), Mm(TITLE_Y), &bold);
    let mut y = SUMMARY_START_Y;
    for line in summary_lines(report) {
        header.use_text(line, BODY_SIZE, Mm(MARGIN_LEFT), Mm(y), &regular);
        y -= LINE_HEIGHT;
    }

    let lines: Vec<String> = report.children.iter().map(child_line).collect();
    for (index, page_lines) in paginate(&lines).into_iter().enumerate() {
        let (layer, mut y) = if index == 0 {
            (doc.get_page(first_page).get_layer(first_layer), FIRST_PAGE_CHILD_START)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "report");
            (doc.get_page(page).get_layer(layer), NEXT_PAGE_CHILD_START)
        };
        for line in page_lines {
            layer.use_text(line, CHILD_SIZE, Mm(MARGIN_LEFT), Mm(y), &regular);
            y -= LINE_HEIGHT;
        }
    }

    doc.save_to_bytes().map_err(|e| ApiError::Render(e.to_string()))
}

/// HTML body for the report email: heading, the three summary lines, and one
/// list item per child carrying the same fields as the PDF lines. A report
/// with no children keeps the empty list.
pub fn render_html_summary(report: &Report) -> String {
    let mut html = String::new();
    html.push_str(&format!("<h2>{REPORT_TITLE}</h2>\n"));
    html.push_str(&format!(
        "<p>Parent: {}<br/>Total sessions: {}<br/>Total progress updates: {}</p>\n",
        report.parent_id, report.total_sessions, report.total_progress_updates
    ));
    html.push_str("<ul>\n");
    for child in &report.children {
        html.push_str(&format!(
            "<li>{} | Sessions: {} | Goals: {} | Updates: {}</li>\n",
            child.name, child.session_count, child.goal_count, child.progress_update_count
        ));
    }
    html.push_str("</ul>\n");
    html
}
