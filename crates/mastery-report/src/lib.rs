//! mastery-report: Rendering of student progress reports.

pub mod html;
