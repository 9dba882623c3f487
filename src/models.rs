use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

/// A single spreadsheet value after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Empty cells and whitespace-only text both count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Rows × named columns, as read from the worksheet. Every row holds exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| r.get(col).unwrap_or(&EMPTY))
    }

    pub fn head(&self, n: usize) -> &[Vec<Cell>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Income/expense indicator of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnKind {
    Income,
    Expense,
    Unrecognized(String),
}

impl TxnKind {
    /// `income…` is income, `expens…` (expense, expensive) is expense,
    /// case-insensitive. Anything else is kept as an unrecognized label.
    pub fn classify(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.starts_with("income") {
            Self::Income
        } else if lower.starts_with("expens") {
            Self::Expense
        } else {
            Self::Unrecognized(label.trim().to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySummary {
    /// Chronological, one row per month that had at least one classified row.
    pub rows: Vec<MonthlyRow>,
    /// Type labels that were neither income nor expense, with row counts.
    pub unrecognized: BTreeMap<String, usize>,
    /// Rows dropped for an unresolvable date or non-numeric amount.
    pub skipped: usize,
}

impl MonthlySummary {
    /// Column-wise sum over all months.
    pub fn total(&self) -> MonthlyRow {
        let (income, expense, difference) = self.rows.iter().fold((0.0, 0.0, 0.0), |acc, r| {
            (acc.0 + r.income, acc.1 + r.expense, acc.2 + r.difference)
        });
        MonthlyRow {
            label: "Total".to_string(),
            income,
            expense,
            difference,
        }
    }

    /// Month rows followed by the synthetic Total row.
    pub fn with_total(&self) -> Vec<MonthlyRow> {
        let mut rows = self.rows.clone();
        rows.push(self.total());
        rows
    }

    pub fn months(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySummary {
    /// Sorted by total descending.
    pub items: Vec<CategoryTotal>,
}

impl CategorySummary {
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.total).sum()
    }

    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.items.iter().find(|i| i.name == name).map(|i| i.total)
    }
}

/// Monthly expense totals for restaurant/food categories, pivoted with one
/// column per category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodHistory {
    pub months: Vec<String>,
    pub categories: Vec<String>,
    /// `values[month][category]`, zero where a month had no spending.
    pub values: Vec<Vec<f64>>,
}

impl FoodHistory {
    #[allow(dead_code)]
    pub fn get(&self, month: &str, category: &str) -> Option<f64> {
        let m = self.months.iter().position(|x| x == month)?;
        let c = self.categories.iter().position(|x| x == category)?;
        self.values.get(m).and_then(|row| row.get(c)).copied()
    }

    pub fn series(&self, category: usize) -> Vec<f64> {
        self.values
            .iter()
            .map(|row| row.get(category).copied().unwrap_or(0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kind() {
        assert_eq!(TxnKind::classify("income"), TxnKind::Income);
        assert_eq!(TxnKind::classify(" Income "), TxnKind::Income);
        assert_eq!(TxnKind::classify("expense"), TxnKind::Expense);
        assert_eq!(TxnKind::classify("Expensive"), TxnKind::Expense);
        assert_eq!(
            TxnKind::classify("transfer"),
            TxnKind::Unrecognized("transfer".to_string())
        );
    }

    #[test]
    fn test_table_pads_short_rows() {
        let t = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Number(1.0)]],
        );
        assert_eq!(t.rows[0].len(), 2);
        assert_eq!(t.cell(0, 1), &Cell::Empty);
        assert_eq!(t.cell(5, 5), &Cell::Empty);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(1000.0).to_string(), "1000");
        assert_eq!(Cell::Number(12.5).to_string(), "12.5");
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Cell::Date(d).to_string(), "2024-03-09");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_month_ordering_and_label() {
        let jan = Month { year: 2024, month: 1 };
        let dec = Month { year: 2023, month: 12 };
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2024-01");
    }

    #[test]
    fn test_monthly_total_row() {
        let summary = MonthlySummary {
            rows: vec![
                MonthlyRow { label: "2024-01".into(), income: 1000.0, expense: 200.0, difference: 800.0 },
                MonthlyRow { label: "2024-02".into(), income: 0.0, expense: 150.0, difference: -150.0 },
            ],
            ..Default::default()
        };
        let total = summary.total();
        assert_eq!(total.label, "Total");
        assert_eq!(total.income, 1000.0);
        assert_eq!(total.expense, 350.0);
        assert_eq!(total.difference, 650.0);
        assert_eq!(summary.with_total().len(), 3);
    }
}
