use crate::analysis;
use crate::error::{RoasError, RoasResult};
use crate::ingest;
use crate::types::{
    AnalysisResult, CanonicalField, ComparisonMode, Direction, InsightType, Metric, PeriodReport,
};
use clap::ValueEnum;
use colored::Colorize;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};

/// How `analyze` prints its result when no output file is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    format!("{:.2}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_period(period: &PeriodReport) -> String {
    match (period.start_date, period.end_date) {
        (Some(start), Some(end)) if start == end => start.to_string(),
        (Some(start), Some(end)) => format!("{} ~ {}", start, end),
        _ => "-".to_string(),
    }
}

/// Execute the analyze command
pub async fn analyze(
    file: PathBuf,
    mode: ComparisonMode,
    format: OutputFormat,
    output: Option<PathBuf>,
    verbose: bool,
) -> RoasResult<()> {
    let data = ingest::ingest_file(&file).await?;

    if verbose {
        eprintln!(
            "{} {} ({} records, {} blank rows skipped)",
            "📖 Read".cyan(),
            file.display(),
            data.records.len(),
            data.blank_rows
        );
    }

    let result = analysis::analyze(&data.records, mode)?;

    if let Some(output_path) = output {
        export_report(&output_path, &result)?;
        println!(
            "{}",
            format!("✅ ROAS report exported to {}", output_path.display())
                .bold()
                .green()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_comparison_table(&result, mode),
        OutputFormat::Json => println!("{}", to_json(&result)?),
        OutputFormat::Yaml => print!("{}", to_yaml(&result)?),
    }

    Ok(())
}

/// Execute the columns command: show which header feeds each canonical field
///
/// Only the header row is matched, so a bad data row does not hide the mapping.
pub async fn columns(file: PathBuf) -> RoasResult<()> {
    let report = ingest::inspect_file(&file).await?;

    println!("{}", "🔎 Column mapping:".bold().cyan());
    println!("{}", "─".repeat(50));
    for field in CanonicalField::ALL {
        match report.columns.get(field) {
            Some(column) => println!(
                "{:<14} ← {} (column {})",
                field.as_str().bright_blue(),
                column.header,
                column.index + 1
            ),
            None if field.is_required() => {
                println!("{:<14} {}", field.as_str().bright_blue(), "✗ missing".red())
            }
            None => println!("{:<14} {}", field.as_str().bright_blue(), "- not present".dimmed()),
        }
    }
    println!("{}", "─".repeat(50));
    println!(
        "   {} format, {} data rows, {} blank rows",
        report.format, report.data_rows, report.blank_rows
    );

    if !report.missing.is_empty() {
        let names: Vec<&str> = report.missing.iter().map(|f| f.as_str()).collect();
        println!(
            "\n{}",
            format!("⚠️  Missing required columns: {}", names.join(", "))
                .yellow()
                .bold()
        );
    }

    Ok(())
}

/// Print the comparison as a colored table followed by the insight
fn print_comparison_table(result: &AnalysisResult, mode: ComparisonMode) {
    let title = match mode {
        ComparisonMode::Day => "📊 Day-over-day ROAS comparison",
        ComparisonMode::Week => "📊 Week-over-week ROAS comparison",
    };
    println!("\n{}", title.bold().cyan());
    println!("   Previous: {}", format_period(&result.previous));
    println!("   Current:  {}", format_period(&result.current));
    println!("{}", "─".repeat(72));

    println!(
        "{:<16} {:>14} {:>14} {:>12} {:>10}",
        "Metric".bold(),
        "Previous".bold(),
        "Current".bold(),
        "Change".bold(),
        "Change %".bold()
    );
    println!("{}", "─".repeat(72));

    let totals = &result.comparison;
    for (metric, delta) in &totals.comparison {
        let favorable = match delta.direction {
            Direction::Increase => !metric.lower_is_better(),
            Direction::Decrease => metric.lower_is_better(),
            Direction::Neutral => true,
        };
        let change = format_number(delta.value);
        let pct = format!("{:+.1}%", delta.percentage);
        let (change, pct) = match (delta.direction, favorable) {
            (Direction::Neutral, _) => (change.normal(), pct.normal()),
            (_, true) => (change.green(), pct.green()),
            (_, false) => (change.red(), pct.red()),
        };

        println!(
            "{:<16} {:>14} {:>14} {:>12} {:>10}",
            metric.label().bright_blue(),
            format_number(totals.previous.value(*metric)),
            format_number(totals.current.value(*metric)),
            change,
            pct
        );
    }
    println!("{}", "─".repeat(72));

    let insight = &result.analysis;
    let headline = match insight.insight_type {
        InsightType::Positive => format!("📈 {}", insight.main_reason).green().bold(),
        InsightType::Negative => format!("📉 {}", insight.main_reason).red().bold(),
        InsightType::Neutral => format!("➖ {}", insight.main_reason).yellow().bold(),
    };
    println!("\n{}", headline);

    if !insight.contributing_factors.is_empty() {
        println!("\n{}", "Contributing factors:".bold());
        for factor in &insight.contributing_factors {
            println!("   • {}", factor);
        }
    }
    if !insight.recommendations.is_empty() {
        println!("\n{}", "Recommendations:".bold());
        for recommendation in &insight.recommendations {
            println!("   → {}", recommendation);
        }
    }
}

fn to_json(result: &AnalysisResult) -> RoasResult<String> {
    serde_json::to_string_pretty(result)
        .map_err(|e| RoasError::Export(format!("Failed to serialize JSON: {}", e)))
}

fn to_yaml(result: &AnalysisResult) -> RoasResult<String> {
    serde_yaml::to_string(result)
        .map_err(|e| RoasError::Export(format!("Failed to serialize YAML: {}", e)))
}

/// Write the report in the format named by the output extension
pub fn export_report(output: &Path, result: &AnalysisResult) -> RoasResult<()> {
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => export_to_excel(output, result),
        "yaml" | "yml" => write_text(output, &to_yaml(result)?),
        "json" => write_text(output, &to_json(result)?),
        _ => Err(RoasError::Export(format!(
            "Unsupported output format: {}. Use .xlsx, .yaml or .json",
            extension
        ))),
    }
}

fn write_text(output: &Path, content: &str) -> RoasResult<()> {
    fs::write(output, content)
        .map_err(|e| RoasError::Export(format!("Failed to write {}: {}", output.display(), e)))
}

fn xlsx_error(e: XlsxError) -> RoasError {
    RoasError::Export(e.to_string())
}

/// Export the report as a workbook with "Comparison" and "Insight" sheets
fn export_to_excel(output: &Path, result: &AnalysisResult) -> RoasResult<()> {
    let mut workbook = Workbook::new();
    write_comparison_sheet(&mut workbook, result).map_err(xlsx_error)?;
    write_insight_sheet(&mut workbook, result).map_err(xlsx_error)?;

    workbook
        .save(output)
        .map_err(|e| RoasError::Export(format!("Failed to save Excel file: {}", e)))
}

fn write_comparison_sheet(workbook: &mut Workbook, result: &AnalysisResult) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let percent_format = Format::new().set_num_format("0.0%");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Comparison")?;
    worksheet.set_column_width(0, 18)?;
    for col in 1..=4 {
        worksheet.set_column_width(col, 14)?;
    }

    worksheet.write_string_with_format(0, 0, "Metric", &header_format)?;
    worksheet.write_string_with_format(0, 1, "Previous", &header_format)?;
    worksheet.write_string_with_format(0, 2, "Current", &header_format)?;
    worksheet.write_string_with_format(0, 3, "Change", &header_format)?;
    worksheet.write_string_with_format(0, 4, "Change %", &header_format)?;

    let totals = &result.comparison;
    for (i, metric) in Metric::ALL.iter().enumerate() {
        let row = (i + 1) as u32;
        let delta = totals.comparison.get(metric).copied().unwrap_or_default();

        worksheet.write_string(row, 0, metric.label())?;
        worksheet.write_number(row, 1, totals.previous.value(*metric))?;
        worksheet.write_number(row, 2, totals.current.value(*metric))?;
        worksheet.write_number(row, 3, delta.value)?;
        // As decimal for %
        worksheet.write_number_with_format(row, 4, delta.percentage / 100.0, &percent_format)?;
    }

    let meta_row = (Metric::ALL.len() + 2) as u32;
    worksheet.write_string(meta_row, 0, "Previous period")?;
    worksheet.write_string(meta_row, 1, format_period(&result.previous))?;
    worksheet.write_string(meta_row + 1, 0, "Current period")?;
    worksheet.write_string(meta_row + 1, 1, format_period(&result.current))?;

    Ok(())
}

fn write_insight_sheet(workbook: &mut Workbook, result: &AnalysisResult) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let insight = &result.analysis;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Insight")?;
    worksheet.set_column_width(0, 22)?;
    worksheet.set_column_width(1, 100)?;

    let insight_type = match insight.insight_type {
        InsightType::Positive => "positive",
        InsightType::Negative => "negative",
        InsightType::Neutral => "neutral",
    };
    worksheet.write_string_with_format(0, 0, "Type", &header_format)?;
    worksheet.write_string(0, 1, insight_type)?;
    worksheet.write_string_with_format(1, 0, "Main reason", &header_format)?;
    worksheet.write_string(1, 1, &insight.main_reason)?;

    let mut row = 3u32;
    worksheet.write_string_with_format(row, 0, "Contributing factors", &header_format)?;
    for factor in &insight.contributing_factors {
        worksheet.write_string(row, 1, factor)?;
        row += 1;
    }
    if insight.contributing_factors.is_empty() {
        row += 1;
    }

    row += 1;
    worksheet.write_string_with_format(row, 0, "Recommendations", &header_format)?;
    for recommendation in &insight.recommendations {
        worksheet.write_string(row, 1, recommendation)?;
        row += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> AnalysisResult {
        let record = |day, ad_spend, revenue| CanonicalRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ad_spend,
            revenue,
            conversions: 10.0,
            clicks: 100.0,
            impressions: 1000.0,
        };
        analysis::analyze(
            &[record(1, 100.0, 300.0), record(2, 100.0, 600.0)],
            ComparisonMode::Day,
        )
        .unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.23456), "1.23");
        assert_eq!(format_number(-0.5), "-0.5");
    }

    #[test]
    fn test_format_period() {
        let result = sample_result();
        assert_eq!(format_period(&result.current), "2024-01-02");
        assert_eq!(format_period(&PeriodReport::default()), "-");
    }

    #[test]
    fn test_export_report_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let result = sample_result();

        let json_path = dir.path().join("report.json");
        export_report(&json_path, &result).unwrap();
        let parsed: AnalysisResult =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.analysis, result.analysis);
        assert_eq!(parsed.comparison.current.roas, 6.0);
        assert_eq!(parsed.current.data.len(), 1);

        let yaml_path = dir.path().join("report.yml");
        export_report(&yaml_path, &result).unwrap();
        let content = fs::read_to_string(&yaml_path).unwrap();
        assert!(content.contains("mainReason"));
    }

    #[test]
    fn test_export_report_xlsx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        export_report(&path, &sample_result()).unwrap();
        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_export_report_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let err = export_report(&dir.path().join("report.txt"), &sample_result()).unwrap_err();
        assert_eq!(err.kind(), "export");
        assert!(err.to_string().contains(".xlsx, .yaml or .json"));
    }
}
