pub mod mailer;

pub use mailer::{ReportMailer, send_weekly_report_email};
