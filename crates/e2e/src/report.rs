//! Console and HTML reporting

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use html_escape::encode_text;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::E2eResult;
use crate::runner::TestSuiteResult;
use crate::steps::Outcome;

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "PASSED",
        Outcome::Failed => "FAILED",
        Outcome::Skipped => "SKIPPED",
    }
}

/// Summary table for the terminal
pub fn summary_table(results: &TestSuiteResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Suite", "Test", "Outcome", "Time (ms)", "Detail"]);

    for result in &results.results {
        let color = match result.outcome {
            Outcome::Passed => Color::Green,
            Outcome::Failed => Color::Red,
            Outcome::Skipped => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(&result.suite),
            Cell::new(&result.name),
            Cell::new(outcome_label(result.outcome)).fg(color),
            Cell::new(result.duration_ms),
            Cell::new(result.error.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Self-contained HTML report
pub fn render_html(results: &TestSuiteResult) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>E2E report - {base_url}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ddd; padding: 6px 8px; text-align: left; vertical-align: top; }}
.passed {{ color: #1a7f37; }}
.failed {{ color: #cf222e; }}
.skipped {{ color: #9a6700; }}
details {{ font-size: 0.9em; }}
</style>
</head>
<body>
<h1>E2E report</h1>
<p>Target: {base_url}<br>Started: {started}<br>
{total} tests: <span class="passed">{passed} passed</span>,
<span class="failed">{failed} failed</span>,
<span class="skipped">{skipped} skipped</span> in {duration} ms</p>
<table>
<tr><th>Suite</th><th>Test</th><th>Outcome</th><th>Time (ms)</th><th>Detail</th></tr>
"#,
        base_url = encode_text(&results.base_url),
        started = results.started_at.to_rfc3339(),
        total = results.total,
        passed = results.passed,
        failed = results.failed,
        skipped = results.skipped,
        duration = results.duration_ms,
    );

    for result in &results.results {
        let class = outcome_label(result.outcome).to_lowercase();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>",
            encode_text(&result.suite),
            encode_text(&result.name),
            class,
            outcome_label(result.outcome),
            result.duration_ms,
        );

        if let Some(error) = &result.error {
            let _ = write!(html, "<pre>{}</pre>", encode_text(error));
        }
        if let Some(shot) = &result.screenshot {
            let shot = shot.display().to_string();
            let _ = write!(
                html,
                "<a href=\"{}\">screenshot</a>",
                html_escape::encode_double_quoted_attribute(&shot)
            );
        }
        if !result.steps.is_empty() {
            html.push_str("<details><summary>steps</summary><ol>");
            for step in &result.steps {
                let _ = write!(
                    html,
                    "<li class=\"{}\">{} ({} ms)</li>",
                    outcome_label(step.outcome).to_lowercase(),
                    encode_text(&step.step_name),
                    step.duration_ms
                );
            }
            html.push_str("</ol></details>");
        }
        html.push_str("</td></tr>\n");
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Write `report.html` into the output directory
pub fn write_html(results: &TestSuiteResult, output_dir: &Path) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join("report.html");
    std::fs::write(&path, render_html(results))?;
    info!("HTML report written to: {}", path.display());
    Ok(path)
}
