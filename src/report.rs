//! Output formatting for review results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateReport;
use crate::analysis::RefactoringPriority;
use crate::detect::Severity;
use crate::narrative::{Narrative, RiskLevel};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON document.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    #[serde(flatten)]
    pub report: AggregateReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
}

/// Render results as pretty-printed JSON.
pub fn to_json(report: &AggregateReport, narrative: Option<&Narrative>) -> serde_json::Result<String> {
    let doc = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        report: report.clone(),
        narrative: narrative.cloned(),
    };
    serde_json::to_string_pretty(&doc)
}

/// Write results in JSON format to stdout.
pub fn write_json(report: &AggregateReport, narrative: Option<&Narrative>) -> anyhow::Result<()> {
    println!("{}", to_json(report, narrative)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results as colored terminal output.
pub fn write_pretty(report: &AggregateReport, narrative: Option<&Narrative>) {
    println!();
    print!("  ");
    print!("{}", "reviewlens".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    write_summary(report);
    println!();

    write_files(report);
    println!();

    if !report.security.file_scans.iter().all(|s| s.findings.is_empty()) {
        write_security(report);
        println!();
    }

    if report.performance.issue_count > 0 {
        write_performance(report);
        println!();
    }

    write_dependencies(report);
    println!();

    if !report.recommendations.is_empty() {
        println!("  {}", "Recommendations:".bold());
        for rec in &report.recommendations {
            println!("    - {}", rec);
        }
        println!();
    }

    if let Some(narrative) = narrative {
        write_narrative(narrative);
        println!();
    }
}

fn write_summary(report: &AggregateReport) {
    let s = &report.structure;
    print!("  {}", "Files: ".dimmed());
    print!("{} ({} parsed)", s.total_files_analyzed, s.parsed_files);
    print!("  {}", "Avg complexity: ".dimmed());
    print!("{:.1}", s.average_complexity);
    print!("  {}", "Avg maintainability: ".dimmed());
    write_colored_maintainability(report.average_maintainability);
    println!();

    print!("  {}", "Security risk: ".dimmed());
    write_colored_risk(report.security.overall_risk_score);
    print!("  {}", "Performance: ".dimmed());
    write_colored_performance(report.performance.performance_score);
    println!();
}

fn write_colored_maintainability(mi: f64) {
    let text = format!("{:.1}", mi);
    match mi {
        m if m >= 70.0 => print!("{}", text.green()),
        m if m >= 30.0 => print!("{}", text.yellow()),
        _ => print!("{}", text.red()),
    }
}

fn write_colored_risk(score: u32) {
    match score {
        0 => print!("{}", "0".green().bold()),
        s if s < 5 => print!("{}", s.to_string().green()),
        s if s < 10 => print!("{}", s.to_string().yellow()),
        s => print!("{}", s.to_string().red().bold()),
    }
}

fn write_colored_performance(score: u32) {
    match score {
        s if s >= 90 => print!("{}", s.to_string().green()),
        s if s >= 70 => print!("{}", s.to_string().yellow()),
        s => print!("{}", s.to_string().red()),
    }
}

fn write_files(report: &AggregateReport) {
    println!("  {} ({}):", "Files".bold(), report.files.len());
    println!();

    for metrics in &report.files {
        let f = &metrics.finding;
        print!("    {:<40}", f.filename.blue());
        if !f.parsed {
            println!(
                "{}",
                format!(
                    "{}: {}",
                    f.language,
                    f.error.as_deref().unwrap_or("not analyzed")
                )
                .dimmed()
            );
            continue;
        }
        print!(
            "{:<11} fn {:<4} cls {:<4} cx {:<4} mi {:<4}",
            f.language, f.function_count, f.class_count, f.complexity_score, metrics.maintainability_index
        );
        write_priority(metrics.refactoring_priority);
        println!();

        for issue in &f.quality_issues {
            println!("            {}", issue.yellow());
        }
    }
}

fn write_priority(priority: RefactoringPriority) {
    match priority {
        RefactoringPriority::Low => print!("{}", "low".green()),
        RefactoringPriority::Medium => print!("{}", "medium".yellow()),
        RefactoringPriority::High => print!("{}", "high".red()),
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Critical => print!("    {} ", "CRIT".red().bold()),
        Severity::High => print!("    {} ", "HIGH".red()),
        Severity::Medium => print!("    {} ", "MED ".yellow()),
        Severity::Low => print!("    {} ", "LOW ".blue()),
    }
}

fn write_security(report: &AggregateReport) {
    let total: usize = report.security.counts.total();
    println!("  {} ({}):", "Security".bold(), total);
    println!();

    for scan in &report.security.file_scans {
        for finding in &scan.findings {
            write_severity_tag(finding.severity);
            print!("{}", finding.filename.blue());
            println!("  {}", finding.description);
        }
    }
}

fn write_performance(report: &AggregateReport) {
    println!(
        "  {} ({}):",
        "Performance".bold(),
        report.performance.issue_count
    );
    println!();

    for issue in &report.performance.issues {
        print!("    {}", issue.filename.blue());
        print!("{}", format!(":{}", issue.line).dimmed());
        println!("  {}", issue.description);
    }
}

fn write_dependencies(report: &AggregateReport) {
    let d = &report.dependencies;
    println!("  {}", "Dependencies:".bold());
    println!(
        "    {} imports, {} external, {} internal, {} cross-file connections",
        d.summary.total_imports,
        d.summary.unique_external_dependencies,
        d.summary.unique_internal_dependencies,
        d.cross_file_connections.len()
    );
    if !d.summary.most_imported_external.is_empty() {
        println!(
            "    {} {}",
            "external:".dimmed(),
            d.summary.most_imported_external.join(", ")
        );
    }
}

fn write_narrative(narrative: &Narrative) {
    println!("  {}", "Narrative review:".bold());
    print!("    {}", "Risk: ".dimmed());
    match narrative.risk_level {
        RiskLevel::Low => print!("{}", "low".green()),
        RiskLevel::Medium => print!("{}", "medium".yellow()),
        RiskLevel::High => print!("{}", "high".red().bold()),
    }
    print!("  {}", "Type: ".dimmed());
    print!("{}", narrative.change_type);
    if let Some(score) = narrative.overall_score {
        print!("  {}", "Score: ".dimmed());
        print!("{}/10", score);
    }
    println!();
    println!();
    println!("    {}", narrative.summary);

    if !narrative.impact_areas.is_empty() {
        println!();
        println!("    {}", "Impact areas:".dimmed());
        for area in &narrative.impact_areas {
            println!("      - {}", area);
        }
    }
    if !narrative.recommendations.is_empty() {
        println!();
        println!("    {}", "Suggestions:".dimmed());
        for rec in &narrative.recommendations {
            println!("      - {}", rec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileRecord;
    use crate::runner::Runner;

    #[test]
    fn test_json_round_trips_report() {
        let files = vec![
            FileRecord::new("a.py", "import os\nos.system('ls')\n"),
            FileRecord::new("b.rb", "puts 1"),
        ];
        let report = Runner::new().analyze(&files).unwrap();
        let json = to_json(&report, None).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["files"][0]["filename"], "a.py");
        assert_eq!(value["files"][0]["refactoring_priority"], "low");
        assert_eq!(value["files"][1]["error"], "Unsupported file type");
        assert_eq!(value["security"]["overall_risk_score"], 5);
        assert!(value.get("narrative").is_none());

        let parsed: JsonReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.report, report);
    }
}
