use colored::Colorize;
use comfy_table::{Cell as TableCell, Table as ConsoleTable};

use crate::loader::coerce_date;
use crate::models::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
    Mixed,
    Empty,
}

impl ColumnKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::Text => "text",
            Self::Mixed => "mixed",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub index: usize,
    pub name: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub nulls: usize,
}

/// Descriptive statistics of a numeric column. `std` is the sample standard
/// deviation; quantiles use linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub stats: Vec<(String, NumericStats)>,
}

impl Profile {
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Numeric)
    }

    /// Columns whose values are best shown as category counts.
    pub fn text_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns
            .iter()
            .filter(|c| matches!(c.kind, ColumnKind::Text | ColumnKind::Mixed))
    }

    pub fn first_date_column(&self) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.kind == ColumnKind::Date)
    }
}

fn column_kind(cells: &[&Cell]) -> ColumnKind {
    let present: Vec<&&Cell> = cells.iter().filter(|c| !c.is_empty()).collect();
    if present.is_empty() {
        return ColumnKind::Empty;
    }
    if present.iter().all(|c| matches!(c, Cell::Number(_))) {
        ColumnKind::Numeric
    } else if present.iter().all(|c| matches!(c, Cell::Date(_))) {
        ColumnKind::Date
    } else if present.iter().all(|c| matches!(c, Cell::Text(_) | Cell::Bool(_))) {
        ColumnKind::Text
    } else {
        ColumnKind::Mixed
    }
}

pub fn numeric_values(table: &Table, col: usize) -> Vec<f64> {
    table
        .column(col)
        .filter_map(|c| match c {
            Cell::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        })
        .collect()
}

/// (date, value) pairs for rows where both resolve, sorted by date.
pub fn dated_values(
    table: &Table,
    date_col: usize,
    value_col: usize,
) -> Vec<(chrono::NaiveDate, f64)> {
    let mut points: Vec<_> = (0..table.len())
        .filter_map(|row| {
            let date = coerce_date(table.cell(row, date_col))?;
            match table.cell(row, value_col) {
                Cell::Number(n) if n.is_finite() => Some((date, *n)),
                _ => None,
            }
        })
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0));
    points
}

/// Occurrences of each non-empty value, most frequent first, ties by value.
pub fn value_counts(table: &Table, col: usize) -> Vec<(String, usize)> {
    let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
    for cell in table.column(col).filter(|c| !c.is_empty()) {
        *counts.entry(cell.to_string()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn describe(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };
    Some(NumericStats {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.50),
        q75: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

pub fn profile(table: &Table) -> Profile {
    let mut columns = Vec::with_capacity(table.columns.len());
    let mut stats = Vec::new();
    for (index, name) in table.columns.iter().enumerate() {
        let cells: Vec<&Cell> = table.column(index).collect();
        let non_null = cells.iter().filter(|c| !c.is_empty()).count();
        let kind = column_kind(&cells);
        if kind == ColumnKind::Numeric {
            if let Some(s) = describe(&numeric_values(table, index)) {
                stats.push((name.clone(), s));
            }
        }
        columns.push(ColumnProfile {
            index,
            name: name.clone(),
            kind,
            non_null,
            nulls: cells.len() - non_null,
        });
    }
    Profile {
        rows: table.len(),
        columns,
        stats,
    }
}

// ---------------------------------------------------------------------------
// Console output
// ---------------------------------------------------------------------------

pub fn print_head(table: &Table, n: usize) {
    let mut out = ConsoleTable::new();
    out.set_header(table.columns.iter().map(String::as_str).collect::<Vec<_>>());
    for row in table.head(n) {
        out.add_row(row.iter().map(|c| TableCell::new(c)).collect::<Vec<_>>());
    }
    println!("{}\n{out}", format!("First {n} rows").bold());
}

fn stat(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.2}")
    }
}

pub fn print_profile(profile: &Profile) {
    let mut info = ConsoleTable::new();
    info.set_header(vec!["Column", "Kind", "Non-null", "Null"]);
    for c in &profile.columns {
        info.add_row(vec![
            TableCell::new(&c.name),
            TableCell::new(c.kind.label()),
            TableCell::new(c.non_null),
            TableCell::new(c.nulls),
        ]);
    }
    println!("{} ({} rows)\n{info}", "Dataset".bold(), profile.rows);

    if profile.stats.is_empty() {
        return;
    }
    let mut desc = ConsoleTable::new();
    desc.set_header(vec!["Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    for (name, s) in &profile.stats {
        desc.add_row(vec![
            TableCell::new(name),
            TableCell::new(s.count),
            TableCell::new(stat(s.mean)),
            TableCell::new(stat(s.std)),
            TableCell::new(stat(s.min)),
            TableCell::new(stat(s.q25)),
            TableCell::new(stat(s.q50)),
            TableCell::new(stat(s.q75)),
            TableCell::new(stat(s.max)),
        ]);
    }
    println!("{}\n{desc}", "Descriptive statistics".bold());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let d = |day| Cell::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap());
        Table::new(
            vec!["Date".into(), "Amount".into(), "Category".into(), "Notes".into()],
            vec![
                vec![d(3), Cell::Number(4.0), Cell::Text("food".into()), Cell::Empty],
                vec![d(1), Cell::Number(1.0), Cell::Text("rent".into()), Cell::Number(1.0)],
                vec![d(2), Cell::Number(3.0), Cell::Text("food".into()), Cell::Text("x".into())],
                vec![Cell::Empty, Cell::Number(2.0), Cell::Empty, Cell::Empty],
            ],
        )
    }

    #[test]
    fn test_describe() {
        let s = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.q50, 2.5);
        assert_eq!(s.q75, 3.25);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn test_describe_single_value() {
        let s = describe(&[7.0]).unwrap();
        assert_eq!(s.q50, 7.0);
        assert!(s.std.is_nan());
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_profile_kinds_and_nulls() {
        let p = profile(&sample());
        assert_eq!(p.rows, 4);
        let kinds: Vec<ColumnKind> = p.columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ColumnKind::Date, ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Mixed]
        );
        assert_eq!(p.columns[0].nulls, 1);
        assert_eq!(p.columns[3].non_null, 2);
        assert_eq!(p.stats.len(), 1);
        assert_eq!(p.stats[0].0, "Amount");
        assert_eq!(p.numeric_columns().count(), 1);
        assert_eq!(p.text_columns().count(), 2);
        assert_eq!(p.first_date_column().map(|c| c.index), Some(0));
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(&sample(), 2);
        assert_eq!(counts, vec![("food".to_string(), 2), ("rent".to_string(), 1)]);
    }

    #[test]
    fn test_dated_values_sorted() {
        let points = dated_values(&sample(), 0, 1);
        let values: Vec<f64> = points.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![1.0, 3.0, 4.0]);
    }
}
