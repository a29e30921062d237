pub mod aggregator;
pub mod renderer;

pub use aggregator::{ChildSummary, Report, weekly_report};
pub use renderer::{REPORT_TITLE, render_html_summary, render_pdf};
