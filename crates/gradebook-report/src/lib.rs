//! gradebook-report: report generation for gradebook.
//!
//! Renders the evaluation list and its summary statistics as a single
//! self-contained HTML page.

pub mod html;

pub use html::{generate_html, write_html_report};
