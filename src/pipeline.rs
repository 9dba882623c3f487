use std::collections::BTreeSet;

use colored::Colorize;
use tracing::{error, info, warn};

use crate::aggregate;
use crate::charts::{ChartWriter, RenderedChart};
use crate::columns::slug;
use crate::error::Result;
use crate::loader;
use crate::models::{MonthlySummary, Table};
use crate::profile::{self, dated_values, numeric_values, value_counts, Profile};
use crate::report::{self, ReportOutcome};
use crate::settings::Settings;

const HEAD_ROWS: usize = 5;

pub struct RunSummary {
    pub monthly: Option<MonthlySummary>,
    pub charts: Vec<RenderedChart>,
    pub report: Option<ReportOutcome>,
}

fn keep(chart: Result<RenderedChart>, what: &str, out: &mut Vec<RenderedChart>) {
    match chart {
        Ok(chart) => out.push(chart),
        Err(e) => warn!(chart = what, error = %e, "chart skipped"),
    }
}

/// File-name slug for `column`, suffixed `_2`, `_3`, ... when another column
/// already produced the same one.
fn unique_slug(column: &str, taken: &mut BTreeSet<String>) -> String {
    let base = slug(column);
    let mut name = base.clone();
    let mut n = 1;
    while !taken.insert(name.clone()) {
        n += 1;
        name = format!("{base}_{n}");
    }
    if n > 1 {
        warn!(column, file = %name, "column name collides with another chart, renamed");
    }
    name
}

/// Exploratory charts: value over time, one histogram per numeric column and
/// value counts per text column.
pub fn overview_charts(table: &Table, profile: &Profile, charts: &ChartWriter) -> Vec<RenderedChart> {
    let mut out = Vec::new();
    let mut taken = BTreeSet::new();
    if let (Some(date), Some(value)) = (profile.first_date_column(), profile.numeric_columns().next()) {
        let points = dated_values(table, date.index, value.index);
        keep(charts.temporal(&value.name, &points), "temporal", &mut out);
    }
    for column in profile.numeric_columns() {
        let name = unique_slug(&column.name, &mut taken);
        keep(
            charts.histogram(&name, &numeric_values(table, column.index)),
            &name,
            &mut out,
        );
    }
    for column in profile.text_columns() {
        let name = unique_slug(&column.name, &mut taken);
        keep(
            charts.value_counts(&name, &value_counts(table, column.index)),
            &name,
            &mut out,
        );
    }
    info!(count = out.len(), dir = %charts.dir().display(), "overview charts saved");
    out
}

fn monthly_summary(table: &Table) -> Option<MonthlySummary> {
    match aggregate::monthly_income_vs_expense(table) {
        Ok(summary) => {
            for (label, count) in &summary.unrecognized {
                warn!(label = %label, rows = count, "unrecognized income/expense label, rows left out of the monthly summary");
            }
            if summary.skipped > 0 {
                warn!(rows = summary.skipped, "rows without a valid date or amount left out of the monthly summary");
            }
            Some(summary)
        }
        Err(e) => {
            warn!(reason = %e, "monthly summary skipped");
            None
        }
    }
}

/// Load → profile → overview charts → monthly summary → report. Only a load
/// failure aborts the run; everything else drops its section.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let table = loader::load(&settings.input_path(), &settings.sheet)?;
    info!(
        rows = table.len(),
        sheet = %settings.sheet,
        columns = ?table.columns,
        "data loaded"
    );
    if table.is_empty() {
        warn!("worksheet has a header but no data rows");
    }
    profile::print_head(&table, HEAD_ROWS);
    let profile = profile::profile(&table);
    profile::print_profile(&profile);

    let charts = ChartWriter::new(settings.images_dir());
    let mut rendered = Vec::new();
    if settings.overview_charts {
        rendered.extend(overview_charts(&table, &profile, &charts));
    }

    let monthly = monthly_summary(&table);
    let monthly_chart = match monthly.as_ref().map(|m| charts.monthly_bars(m)) {
        Some(Ok(chart)) => {
            info!(path = %chart.path.display(), "income vs expense chart saved");
            Some(chart)
        }
        Some(Err(e)) => {
            warn!(error = %e, "income vs expense chart skipped");
            None
        }
        None => None,
    };

    let report = match report::generate_report(
        &table,
        monthly.as_ref(),
        monthly_chart.as_ref(),
        &charts,
        &settings.report_dir(),
    ) {
        Ok(outcome) => {
            info!(
                monthly = outcome.has_monthly,
                categories = outcome.has_categories,
                history = outcome.has_history,
                "report sections"
            );
            println!(
                "{}",
                format!("Report written to '{}'", outcome.path.display()).green()
            );
            Some(outcome)
        }
        Err(e) => {
            error!(error = %e, "report could not be written");
            None
        }
    };
    rendered.extend(monthly_chart);

    Ok(RunSummary {
        monthly,
        charts: rendered,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{CATEGORY_CHART, HISTORY_CHART, MONTHLY_CHART, TEMPORAL_CHART};
    use crate::error::FinanzasError;

    const MOVEMENTS: &str = "\
Date,Description,Amount,Category,Income/Expensive
2024-01-05,Nomina,1000,salary,income
2024-01-12,Mercado,200,food,expense
2024-02-03,Cena,150,restaurant,expense
";

    fn settings_for(dir: &std::path::Path, csv: &str) -> Settings {
        let input = dir.join("movements.csv");
        std::fs::write(&input, csv).unwrap();
        Settings {
            input: input.display().to_string(),
            output_dir: dir.join("reporte").display().to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path(), MOVEMENTS);
        let summary = run(&settings).unwrap();

        let monthly = summary.monthly.unwrap();
        assert_eq!(monthly.months(), vec!["2024-01", "2024-02"]);
        assert_eq!(monthly.rows[1].difference, -150.0);

        let report = summary.report.unwrap();
        assert!(report.has_monthly && report.has_categories && report.has_history);
        let html = std::fs::read_to_string(&report.path).unwrap();
        assert!(html.contains(&format!("graficas/{MONTHLY_CHART}")));
        assert!(html.contains(&format!("graficas/{CATEGORY_CHART}")));
        assert!(html.contains(&format!("graficas/{HISTORY_CHART}")));
        assert!(html.contains("<span style=\"color:red\">$ -150.00</span>"));

        let images = settings.images_dir();
        assert!(images.join(MONTHLY_CHART).exists());
        assert!(images.join("histograma_amount.png").exists());
        assert!(images.join("barras_category.png").exists());
        assert!(images.join("barras_income_expensive.png").exists());
    }

    #[test]
    fn test_run_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path(), MOVEMENTS);
        let first = run(&settings).unwrap();
        let html1 = std::fs::read_to_string(first.report.unwrap().path).unwrap();
        let second = run(&settings).unwrap();
        let html2 = std::fs::read_to_string(second.report.unwrap().path).unwrap();
        assert_eq!(html1, html2);
        assert_eq!(first.monthly, second.monthly);
    }

    #[test]
    fn test_run_degrades_without_type_column() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path(), "Date,Amount,Category\n2024-01-05,10,food\n");
        let summary = run(&settings).unwrap();
        assert!(summary.monthly.is_none());
        let report = summary.report.unwrap();
        assert!(!report.has_monthly && !report.has_categories && !report.has_history);
        assert!(report.path.exists());
    }

    #[test]
    fn test_run_without_food_rows_omits_history() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(
            dir.path(),
            "Date,Amount,Category,Income/Expensive\n2024-01-05,10,rent,expense\n",
        );
        let report = run(&settings).unwrap().report.unwrap();
        assert!(report.has_categories);
        assert!(!report.has_history);
    }

    #[test]
    fn test_unique_slug_suffixes_collisions() {
        let mut taken = BTreeSet::new();
        assert_eq!(unique_slug("Income/Expensive", &mut taken), "income_expensive");
        assert_eq!(unique_slug("income expensive", &mut taken), "income_expensive_2");
        assert_eq!(unique_slug(" Income Expensive ", &mut taken), "income_expensive_3");
        assert_eq!(unique_slug("Category", &mut taken), "category");
    }

    #[test]
    fn test_overview_charts_keep_colliding_columns_apart() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(
            dir.path(),
            "Date,Amount,Category,Income/Expensive,income expensive\n\
             2024-01-05,10,food,expense,x\n\
             2024-01-06,20,rent,expense,y\n",
        );
        let summary = run(&settings).unwrap();
        let images = settings.images_dir();
        assert!(images.join("barras_income_expensive.png").exists());
        assert!(images.join("barras_income_expensive_2.png").exists());
        let names: BTreeSet<&str> = summary.charts.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names.len(), summary.charts.len());
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_run_reads_workbook_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            input: std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("tests/fixtures/movements.xlsx")
                .display()
                .to_string(),
            output_dir: dir.path().join("reporte").display().to_string(),
            ..Settings::default()
        };
        let summary = run(&settings).unwrap();
        let monthly = summary.monthly.unwrap();
        assert_eq!(monthly.months(), vec!["2024-01", "2024-02"]);
        assert_eq!(monthly.total().difference, 650.0);
        assert!(summary.report.unwrap().has_history);
        assert!(settings.images_dir().join(TEMPORAL_CHART).exists());
    }

    #[test]
    fn test_run_fails_on_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            input: dir.path().join("missing.xlsx").display().to_string(),
            output_dir: dir.path().join("reporte").display().to_string(),
            ..Settings::default()
        };
        let err = run(&settings).err().unwrap();
        assert!(matches!(err, FinanzasError::Load { .. }));
        assert!(!dir.path().join("reporte").exists());
    }
}
