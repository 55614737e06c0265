//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use mastery_core::report::{StudentReport, UnitSummary};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from a student report.
pub fn generate_html(report: &StudentReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>mastery progress: {}</title>\n",
        html_escape(&report.student_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>Progress for {}</h1>\n",
        html_escape(&report.student_id)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{}/{} units completed | {}</p>\n",
        report.completed_units,
        report.total_units,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Unit overview
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Units</h2>\n");
    if !report.units.is_empty() {
        html.push_str(&generate_bar_chart(&report.units));
    }
    html.push_str("</section>\n");

    // Per-unit topics
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Topics</h2>\n");
    for (index, unit) in report.units.iter().enumerate() {
        let table_id = format!("unit-{index}");
        let status = if unit.completed { " (completed)" } else { "" };
        html.push_str(&format!(
            "<h3>{} &middot; {:.2}%{status}</h3>\n",
            html_escape(&unit.unit),
            unit.progress
        ));
        if let Some(current) = &unit.current_topic {
            html.push_str(&format!(
                "<p class=\"meta\">Current topic: {}</p>\n",
                html_escape(current)
            ));
        }
        html.push_str(&format!("<table class=\"results-table\" id=\"{table_id}\">\n"));
        html.push_str(&format!(
            "<thead><tr><th onclick=\"sortTable('{table_id}', 0)\">Topic</th><th onclick=\"sortTable('{table_id}', 1)\">Attempts</th><th onclick=\"sortTable('{table_id}', 2)\">Average</th><th onclick=\"sortTable('{table_id}', 3)\">Completed</th></tr></thead>\n"
        ));
        html.push_str("<tbody>\n");
        for t in &unit.topics {
            let class = if t.completed {
                "pass"
            } else if t.tracked {
                "active"
            } else {
                "pending"
            };
            html.push_str(&format!(
                "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td></tr>\n",
                html_escape(&t.topic),
                t.attempts,
                t.average_score,
                if t.completed { "yes" } else { "no" }
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &StudentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(units: &[UnitSummary]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = units.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 70,
        total_height
    );

    for (i, unit) in units.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = (unit.progress / 100.0).clamp(0.0, 1.0);
        let width = (fraction * max_width as f64) as usize;

        let color = if unit.completed {
            "#22c55e"
        } else if fraction >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&unit.unit)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.2}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            unit.progress
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --active: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --active: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.active { background: var(--active); }
.pending { color: #6b7280; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use mastery_core::catalog::{Catalog, Unit};
    use mastery_core::model::{StudentProgress, TopicProgress};

    fn make_test_report() -> StudentReport {
        let catalog = Catalog::from_units(vec![
            Unit {
                name: "Trees & Heaps".into(),
                subtopics: vec!["Heaps".into(), "AVL".into()],
            },
            Unit {
                name: "Hashing".into(),
                subtopics: vec!["Probing".into()],
            },
        ])
        .unwrap();

        let mut progress = StudentProgress::new("S<1>");
        progress.topic_progress.insert(
            "Heaps".into(),
            TopicProgress {
                attempts: 3,
                average_score: 8.0,
            },
        );
        progress.completed_topics.insert("Heaps".into());
        progress.unit_progress.insert("Trees & Heaps".into(), 50.0);
        progress.topic_progress.insert(
            "Probing".into(),
            TopicProgress {
                attempts: 4,
                average_score: 9.5,
            },
        );
        progress.completed_topics.insert("Probing".into());
        progress.unit_progress.insert("Hashing".into(), 100.0);
        progress.completed_units.insert("Hashing".into());

        StudentReport::build(&catalog, &progress)
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("1/2 units completed"));
        assert!(html.contains("Current topic: AVL"));
        assert!(html.contains("<td>Heaps</td><td>3</td><td>8.00</td><td>yes</td>"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn html_report_escapes_names() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Progress for S&lt;1&gt;"));
        assert!(html.contains("Trees &amp; Heaps"));
        assert!(!html.contains("<h1>Progress for S<1>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("S1.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }

    #[test]
    fn bar_chart_has_one_bar_per_unit() {
        let report = make_test_report();
        let svg = generate_bar_chart(&report.units);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("#22c55e"));
    }
}
