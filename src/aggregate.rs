use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::columns::{ColumnMap, AMOUNT, CATEGORY, DATE, KIND};
use crate::error::{FinanzasError, Result};
use crate::loader::{coerce_amount, coerce_date};
use crate::models::{
    CategorySummary, CategoryTotal, FoodHistory, Month, MonthlyRow, MonthlySummary, Table,
    TxnKind,
};

const FOOD_PATTERN: &str = r"(?i)restaurant|food";

fn kind_of(table: &Table, row: usize, col: usize) -> TxnKind {
    TxnKind::classify(&table.cell(row, col).to_string())
}

fn category_of(table: &Table, row: usize, col: usize) -> Option<String> {
    let name = table.cell(row, col).to_string();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

// ---------------------------------------------------------------------------
// Income vs expense per month
// ---------------------------------------------------------------------------

pub fn monthly_income_vs_expense(table: &Table) -> Result<MonthlySummary> {
    let [date_col, amount_col, kind_col] =
        ColumnMap::new(table).require("income vs expense by month", [DATE, AMOUNT, KIND])?;

    let mut by_month: BTreeMap<Month, (f64, f64)> = BTreeMap::new();
    let mut unrecognized: BTreeMap<String, usize> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in 0..table.len() {
        let month = coerce_date(table.cell(row, date_col)).map(Month::of);
        let amount = coerce_amount(table.cell(row, amount_col));
        let (Some(month), Some(amount)) = (month, amount) else {
            skipped += 1;
            continue;
        };
        match kind_of(table, row, kind_col) {
            TxnKind::Income => by_month.entry(month).or_default().0 += amount,
            TxnKind::Expense => by_month.entry(month).or_default().1 += amount,
            TxnKind::Unrecognized(label) => {
                let key = if label.is_empty() { "(empty)".to_string() } else { label };
                *unrecognized.entry(key).or_default() += 1;
            }
        }
    }

    let rows = by_month
        .into_iter()
        .map(|(month, (income, expense))| MonthlyRow {
            label: month.to_string(),
            income,
            expense,
            difference: income - expense,
        })
        .collect();

    Ok(MonthlySummary {
        rows,
        unrecognized,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Expense totals per category
// ---------------------------------------------------------------------------

pub fn category_expense_totals(table: &Table) -> Result<CategorySummary> {
    let [category_col, amount_col, kind_col] =
        ColumnMap::new(table).require("expenses by category", [CATEGORY, AMOUNT, KIND])?;

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in 0..table.len() {
        if kind_of(table, row, kind_col) != TxnKind::Expense {
            continue;
        }
        let Some(category) = category_of(table, row, category_col) else {
            continue;
        };
        let Some(amount) = coerce_amount(table.cell(row, amount_col)) else {
            continue;
        };
        *totals.entry(category).or_default() += amount;
    }

    let mut items: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(name, total)| CategoryTotal { name, total })
        .collect();
    // BTreeMap order already sorts names, so the stable sort keeps ties by name.
    items.sort_by(|a, b| b.total.total_cmp(&a.total));
    Ok(CategorySummary { items })
}

// ---------------------------------------------------------------------------
// Restaurant / food history
// ---------------------------------------------------------------------------

/// Monthly restaurant/food spending. Returns [`FinanzasError::NoData`] when no
/// expense row has a matching category.
pub fn restaurant_food_history(table: &Table) -> Result<FoodHistory> {
    let [category_col, amount_col, date_col, kind_col] = ColumnMap::new(table).require(
        "restaurant/food history",
        [CATEGORY, AMOUNT, DATE, KIND],
    )?;
    let pattern = Regex::new(FOOD_PATTERN)?;

    let mut matched = 0usize;
    let mut by_month: BTreeMap<Month, BTreeMap<String, f64>> = BTreeMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();

    for row in 0..table.len() {
        if kind_of(table, row, kind_col) != TxnKind::Expense {
            continue;
        }
        let Some(category) = category_of(table, row, category_col) else {
            continue;
        };
        if !pattern.is_match(&category) {
            continue;
        }
        matched += 1;
        let Some(month) = coerce_date(table.cell(row, date_col)).map(Month::of) else {
            continue;
        };
        let amount = coerce_amount(table.cell(row, amount_col)).unwrap_or(0.0);
        categories.insert(category.clone());
        *by_month.entry(month).or_default().entry(category).or_default() += amount;
    }

    if matched == 0 {
        return Err(FinanzasError::NoData(
            "no restaurant or food expenses".to_string(),
        ));
    }

    let categories: Vec<String> = categories.into_iter().collect();
    let mut months = Vec::with_capacity(by_month.len());
    let mut values = Vec::with_capacity(by_month.len());
    for (month, per_category) in by_month {
        months.push(month.to_string());
        values.push(
            categories
                .iter()
                .map(|c| per_category.get(c).copied().unwrap_or(0.0))
                .collect(),
        );
    }

    Ok(FoodHistory {
        months,
        categories,
        values,
    })
}
