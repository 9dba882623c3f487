use crate::error::{FinanzasError, Result};
use crate::models::Table;

pub const DATE: &str = "date";
pub const AMOUNT: &str = "amount";
pub const CATEGORY: &str = "category";
pub const KIND: &str = "income/expensive";

const KIND_ALIASES: &[&str] = &["income/expensive", "income/expense", "type"];

/// "  Income Expensive " → "income_expensive"
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Normalized header safe to use inside a file name.
pub fn slug(raw: &str) -> String {
    normalize_header(raw).replace(['/', '\\'], "_")
}

/// Lookup of canonical column names against a table's normalized headers.
pub struct ColumnMap {
    names: Vec<String>,
}

impl ColumnMap {
    pub fn new(table: &Table) -> Self {
        Self {
            names: table.columns.iter().map(|c| normalize_header(c)).collect(),
        }
    }

    pub fn find(&self, canonical: &str) -> Option<usize> {
        let aliases: &[&str] = if canonical == KIND { KIND_ALIASES } else { &[] };
        self.names
            .iter()
            .position(|n| n == canonical)
            .or_else(|| {
                aliases
                    .iter()
                    .find_map(|alias| self.names.iter().position(|n| n == alias))
            })
    }

    /// Resolve all `names` or report every one that is absent.
    pub fn require<const N: usize>(
        &self,
        operation: &'static str,
        names: [&'static str; N],
    ) -> Result<[usize; N]> {
        let found = names.map(|n| self.find(n));
        let missing: Vec<&'static str> = names
            .iter()
            .zip(found.iter())
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(FinanzasError::MissingColumns {
                operation,
                columns: missing,
            });
        }
        Ok(found.map(|idx| idx.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cols: &[&str]) -> Table {
        Table::new(cols.iter().map(|c| c.to_string()).collect(), vec![])
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Income/Expensive"), "income/expensive");
        assert_eq!(normalize_header("  Date "), "date");
        assert_eq!(normalize_header("Payment Method"), "payment_method");
    }

    #[test]
    fn test_slug_replaces_slashes() {
        assert_eq!(slug("Income/Expensive"), "income_expensive");
    }

    #[test]
    fn test_find_kind_aliases() {
        let map = ColumnMap::new(&table(&["Date", "Income/Expense"]));
        assert_eq!(map.find(KIND), Some(1));
        let map = ColumnMap::new(&table(&["Type"]));
        assert_eq!(map.find(KIND), Some(0));
    }

    #[test]
    fn test_require_reports_all_missing() {
        let map = ColumnMap::new(&table(&["Amount"]));
        let err = map.require("test", [DATE, AMOUNT, KIND]).unwrap_err();
        match err {
            FinanzasError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec![DATE, KIND]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_require_resolves_indices() {
        let map = ColumnMap::new(&table(&["Category", "Amount", "Date"]));
        let [date, amount] = map.require("test", [DATE, AMOUNT]).unwrap();
        assert_eq!((date, amount), (2, 1));
    }
}
