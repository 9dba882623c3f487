use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate;
use crate::charts::{ChartWriter, RenderedChart};
use crate::error::{FinanzasError, Result};
use crate::fmt::{pesos, sign_color};
use crate::models::{CategorySummary, MonthlySummary, Table};

pub const REPORT_FILE: &str = "reporte.html";

const STYLE: &str = "\
            body { font-family: Arial, sans-serif; margin: 20px; }
            h1, h2 { color: #2c3e50; }
            .section { margin: 20px 0; padding: 20px; background-color: #f8f9fa; border-radius: 5px; }
            table { border-collapse: collapse; width: 100%; }
            th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
            th { background-color: #f2f2f2; }
            tr.total td { font-weight: bold; }";

pub struct MonthlySection<'a> {
    pub summary: Option<&'a MonthlySummary>,
    pub chart: Option<String>,
}

pub struct CategorySection<'a> {
    pub summary: &'a CategorySummary,
    pub chart: String,
}

/// Everything the page shows. Absent sections are left out of the HTML.
#[derive(Default)]
pub struct ReportSections<'a> {
    pub monthly: Option<MonthlySection<'a>>,
    pub categories: Option<CategorySection<'a>>,
    pub history_chart: Option<String>,
}

pub struct ReportOutcome {
    pub path: PathBuf,
    pub has_monthly: bool,
    pub has_categories: bool,
    pub has_history: bool,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn colored_amount(val: f64) -> String {
    format!(
        "<span style=\"color:{}\">{}</span>",
        sign_color(val),
        pesos(val)
    )
}

fn image(src: &str) -> String {
    format!("<img src='{}' width='700'/>", escape(src))
}

fn monthly_table(summary: &MonthlySummary) -> String {
    let mut html = String::from(
        "<table>\n<thead><tr><th>Mes</th><th>Ingresos</th><th>Egresos</th><th>Diferencia</th></tr></thead>\n<tbody>\n",
    );
    let rows = summary.with_total();
    let last = rows.len() - 1;
    for (i, row) in rows.iter().enumerate() {
        let class = if i == last { " class='total'" } else { "" };
        html.push_str(&format!(
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&row.label),
            pesos(row.income),
            pesos(row.expense),
            colored_amount(row.difference),
        ));
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn category_table(summary: &CategorySummary) -> String {
    let mut html = String::from(
        "<table>\n<thead><tr><th>Categoría</th><th>Monto</th></tr></thead>\n<tbody>\n",
    );
    for item in &summary.items {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(&item.name),
            pesos(item.total)
        ));
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn section(title: &str, body: &str) -> String {
    format!("<div class='section'>\n<h2>{title}</h2>\n{body}\n</div>\n")
}

/// Render the static HTML page. Pure; the same sections always give the same
/// bytes.
pub fn render_html(sections: &ReportSections) -> String {
    let mut body = String::new();

    if let Some(monthly) = &sections.monthly {
        let mut parts = Vec::new();
        if let Some(chart) = &monthly.chart {
            parts.push(image(chart));
        }
        if let Some(summary) = monthly.summary {
            parts.push(monthly_table(summary));
        }
        if !parts.is_empty() {
            body.push_str(&section("Ingresos vs Egresos por Mes", &parts.join("\n")));
        }
    }
    if let Some(categories) = &sections.categories {
        let content = format!(
            "{}\n{}",
            image(&categories.chart),
            category_table(categories.summary)
        );
        body.push_str(&section("Gastos por Categoría", &content));
    }
    if let Some(chart) = &sections.history_chart {
        body.push_str(&section(
            "Histórico mensual de gastos: Restaurant y Food",
            &image(chart),
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset='utf-8'>\n<title>Reporte de Análisis Financiero</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n<h1>Reporte de Análisis Financiero</h1>\n{body}</body>\n</html>\n"
    )
}

/// Image reference relative to the report's folder.
fn relative_src(report_dir: &Path, chart: &RenderedChart) -> String {
    chart
        .path
        .strip_prefix(report_dir)
        .unwrap_or(Path::new(&chart.file_name))
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn skipped(section: &str, err: &FinanzasError) {
    match err {
        FinanzasError::MissingColumns { .. } | FinanzasError::NoData(_) => {
            warn!(section, reason = %err, "section skipped")
        }
        _ => warn!(section, error = %err, "section omitted after failure"),
    }
}

/// Build the category and restaurant/food sections from `table`, combine them
/// with the monthly results and write `<report_dir>/reporte.html`, replacing any
/// previous report.
pub fn generate_report(
    table: &Table,
    monthly: Option<&MonthlySummary>,
    monthly_chart: Option<&RenderedChart>,
    charts: &ChartWriter,
    report_dir: &Path,
) -> Result<ReportOutcome> {
    std::fs::create_dir_all(report_dir)?;

    let categories = match aggregate::category_expense_totals(table) {
        Ok(summary) => match charts.category_pie(&summary) {
            Ok(chart) => {
                info!(path = %chart.path.display(), "expenses by category chart saved");
                Some((summary, relative_src(report_dir, &chart)))
            }
            Err(e) => {
                skipped("expenses by category", &e);
                None
            }
        },
        Err(e) => {
            skipped("expenses by category", &e);
            None
        }
    };

    let history_chart = match aggregate::restaurant_food_history(table)
        .and_then(|history| charts.history_lines(&history))
    {
        Ok(chart) => {
            info!(path = %chart.path.display(), "restaurant/food history chart saved");
            Some(relative_src(report_dir, &chart))
        }
        Err(e) => {
            skipped("restaurant/food history", &e);
            None
        }
    };

    let sections = ReportSections {
        monthly: Some(MonthlySection {
            summary: monthly,
            chart: monthly_chart.map(|c| relative_src(report_dir, c)),
        }),
        categories: categories.as_ref().map(|(summary, chart)| CategorySection {
            summary,
            chart: chart.clone(),
        }),
        history_chart,
    };
    let html = render_html(&sections);
    let path = report_dir.join(REPORT_FILE);
    std::fs::write(&path, html)?;

    Ok(ReportOutcome {
        path,
        has_monthly: monthly.is_some() || monthly_chart.is_some(),
        has_categories: sections.categories.is_some(),
        has_history: sections.history_chart.is_some(),
    })
}
