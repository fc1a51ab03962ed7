use crate::config::tolerance::ToleranceConfig;
use crate::domain::model::{Direction, GroupStatistics, Method, VerificationSummary};
use crate::utils::error::{Result, VerifyError};

/// Everything the renderers need about one verification run.
pub struct ReportInputs<'a> {
    pub candidate_version: &'a str,
    pub reference_version: &'a str,
    pub summary: &'a VerificationSummary,
    pub tolerances: &'a ToleranceConfig,
}

fn marker(passed: bool) -> &'static str {
    if passed {
        "✅"
    } else {
        "❌"
    }
}

fn group_for<'a>(
    summary: &'a VerificationSummary,
    method: Method,
    direction: Option<Direction>,
) -> Option<&'a GroupStatistics> {
    summary
        .groups
        .iter()
        .find(|g| g.method == method && g.direction == direction)
}

/// The versioned Markdown report written next to the result files.
pub fn render_markdown(inputs: &ReportInputs) -> String {
    let tolerances = inputs.tolerances;
    let summary = inputs.summary;

    let (slope_min, slope_max) = tolerances.slope_bounds();
    let (_, intercept_max) = tolerances.intercept_bounds();
    let r_squared_min = tolerances.r_squared_min();
    let pass_rate_threshold = tolerances.pass_rate_threshold();

    let mut report = String::new();
    report.push_str("# Verification Report\n");
    report.push_str(&format!("Candidate version: {}\n", inputs.candidate_version));
    report.push_str(&format!("Reference version: {}\n\n", inputs.reference_version));

    report.push_str("## Verification Results\n\n");

    for (method, _) in &summary.methods {
        let mut lines = Vec::new();

        for (heading, direction) in [
            ("Normal", Some(Direction::Normal)),
            ("Inverse", Some(Direction::Inverse)),
        ] {
            if let Some(group) = group_for(summary, *method, direction) {
                let slope_ok = (slope_min..=slope_max).contains(&group.slope);
                let intercept_ok = {
                    let (min, max) = tolerances.intercept_bounds();
                    (min..=max).contains(&group.intercept)
                };
                lines.push(format!(
                    "- {}: R² = {:.6} {}, slope = {:.6} {}, intercept = {:.3} {}",
                    heading,
                    group.r_squared,
                    marker(group.r_squared >= r_squared_min),
                    group.slope,
                    marker(slope_ok),
                    group.intercept,
                    marker(intercept_ok),
                ));
            }
        }

        if let Some(combined) = group_for(summary, *method, None) {
            lines.push(format!(
                "- Combined: {:.1}% {} individual pass rate",
                combined.pass_rate,
                marker(combined.pass_rate >= pass_rate_threshold),
            ));
        }

        if !lines.is_empty() {
            report.push_str(&format!("### {} Method:\n", method.label()));
            report.push_str(&lines.join("\n"));
            report.push_str("\n\n");
        }
    }

    report.push_str("## Verification Tolerances\n\n");

    report.push_str("### Linear regression tolerance\n");
    report.push_str(&format!("  - R² ≥ {:.2}\n", r_squared_min));
    report.push_str(&format!("  - slope = 1 ± {:.2}\n", (1.0 - slope_min).abs()));
    report.push_str(&format!("  - intercept = 0 ± {:.1} cm\n\n", intercept_max));

    report.push_str("### Individual test tolerance\n");
    report.push_str(
        "The individual test tolerances are enforced in aggregate by the group pass rate tolerance.\n\n",
    );

    let small_threshold = tolerances.small_displacement_threshold();
    report.push_str(&format!("Expected values > {} cm:\n", small_threshold));
    report.push_str(&format!(
        "  - Relative error <= {:.0}%\n",
        tolerances.default_relative() * 100.0
    ));
    report.push_str(&format!(
        "  - Absolute error <= {} cm\n\n",
        tolerances.default_absolute()
    ));

    report.push_str(&format!("Expected values <= {} cm:\n", small_threshold));
    report.push_str(&format!(
        "  - Absolute error <= {:.2} cm\n\n",
        tolerances.small_displacement_absolute()
    ));

    report.push_str("### Group pass rate tolerance\n");
    report.push_str(&format!("- Group pass rate ≥ {:.0}%\n", pass_rate_threshold));

    report
}

/// Plain-text run summary for the terminal.
pub fn render_console(inputs: &ReportInputs, include_passed: bool) -> String {
    let summary = inputs.summary;
    let mut out = Vec::new();

    out.push("=".repeat(80));
    out.push(format!(
        "VERIFICATION REPORT - candidate {} vs reference {}",
        inputs.candidate_version, inputs.reference_version
    ));
    out.push("=".repeat(80));
    out.push(String::new());

    out.push("Overall Results:".to_string());
    out.push(format!("  Total Tests: {}", summary.total_tests));
    out.push(format!(
        "  Passing: {} ({:.1}%)",
        summary.passing_tests, summary.overall_pass_rate
    ));
    out.push(format!("  Failing: {}", summary.failing_tests));
    out.push(String::new());

    out.push("Method-Specific Results:".to_string());
    for (method, stats) in &summary.methods {
        out.push(format!("  {}:", method.label()));
        out.push(format!("    Tests: {}", stats.total_tests));
        out.push(format!("    Pass Rate: {:.1}%", stats.pass_rate));
        out.push(format!(
            "    Mean Absolute Error: {:.3} cm",
            stats.mean_absolute_error
        ));
        out.push(format!(
            "    Mean Relative Error: {:.1}%",
            stats.mean_relative_error * 100.0
        ));
    }
    out.push(String::new());

    if !summary.groups.is_empty() {
        out.push("Group Statistical Analysis:".to_string());
        for group in &summary.groups {
            let direction = match group.direction {
                Some(d) => d.to_string(),
                None => "combined".to_string(),
            };
            let status = if group.passes { "PASS" } else { "FAIL" };
            out.push(format!("  {} - {} [{}]:", group.method.label(), direction, status));
            out.push(format!("    Samples: {}", group.samples));
            out.push(format!("    Individual Pass Rate: {:.1}%", group.pass_rate));
            out.push(format!(
                "    Regression: y = {:.4}x + {:.4}",
                group.slope, group.intercept
            ));
            out.push(format!("    R²: {:.4}", group.r_squared));
            out.push(format!(
                "    Mean Relative Error: {:.1}%",
                group.mean_relative_error * 100.0
            ));
        }
        out.push(String::new());
    }

    let failed: Vec<_> = summary.individual.iter().filter(|r| !r.passes).collect();
    if !failed.is_empty() {
        out.push(format!("Failed Tests ({}):", failed.len()));
        for test in failed {
            out.push(format!("  {}:", test.test_id));
            out.push(format!("    Expected: {:.3} cm", test.reference_cm));
            out.push(format!("    Actual: {:.3} cm", test.candidate_cm));
            out.push(format!("    Absolute Error: {:.3} cm", test.absolute_error));
            out.push(format!(
                "    Relative Error: {:.1}%",
                test.relative_error * 100.0
            ));
        }
        out.push(String::new());
    }

    if include_passed {
        let passed: Vec<_> = summary.individual.iter().filter(|r| r.passes).collect();
        if !passed.is_empty() {
            out.push(format!("Passed Tests ({}):", passed.len()));
            for test in passed {
                out.push(format!(
                    "  {}: {:.3} cm (error: {:.1}%)",
                    test.test_id,
                    test.candidate_cm,
                    test.relative_error * 100.0
                ));
            }
            out.push(String::new());
        }
    }

    out.push("=".repeat(80));
    out.join("\n")
}

/// Individual comparison rows for spreadsheet triage.
pub fn render_csv(summary: &VerificationSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "test_id",
        "method",
        "direction",
        "reference_cm",
        "candidate_cm",
        "absolute_error",
        "relative_error",
        "percent_difference",
        "tolerance_relative",
        "tolerance_absolute",
        "passes",
    ])?;

    for row in &summary.individual {
        writer.write_record([
            row.test_id.clone(),
            row.method.to_string(),
            row.direction.to_string(),
            row.reference_cm.to_string(),
            row.candidate_cm.to_string(),
            row.absolute_error.to_string(),
            row.relative_error.to_string(),
            row.percent_difference.to_string(),
            row.tolerance.relative.to_string(),
            row.tolerance.absolute.to_string(),
            row.passes.to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        VerifyError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    String::from_utf8(bytes)
        .map_err(|e| VerifyError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
