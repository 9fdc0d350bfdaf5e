// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Single worksheet cell, as handed over by the workbook reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// `true` for empty cells and for text made only of whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual representation of the cell, `None` if the cell is empty.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(value) => {
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Cell::Number(value) => Some(value.to_string()),
            Cell::Bool(value) => Some(value.to_string()),
            Cell::Date(value) => Some(value.format("%Y-%m-%d").to_string()),
        }
    }

    /// Coerce the cell into a finite number.
    ///
    /// Numbers pass through, text is trimmed and parsed. With `decimal_comma` set,
    /// commas in text are read as decimal points. Anything else yields `None`.
    pub fn as_number(&self, decimal_comma: bool) -> Option<f64> {
        let value = match self {
            Cell::Number(value) => *value,
            Cell::Text(text) => {
                let text = text.trim();
                let normalized: Cow<str> = if decimal_comma {
                    Cow::Owned(text.replace(',', "."))
                } else {
                    Cow::Borrowed(text)
                };
                normalized.parse::<f64>().ok()?
            }
            _ => return None,
        };

        value.is_finite().then_some(value)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.label().unwrap_or_default())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value as f64)
    }
}

/// Cell contents of one worksheet, anchored at cell A1.
///
/// Rows may have different lengths; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at the given position, or an empty cell when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

impl From<Vec<Vec<Cell>>> for RawGrid {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Self::new(rows)
    }
}

/// Kind of report found in an exported management-report workbook.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    ProfitAndLoss,
    ProfitAndLossVsPriorYear,
    BalanceSheet,
    BudgetVariance,
    BudgetSummary,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::ProfitAndLossVsPriorYear,
        ReportKind::ProfitAndLoss,
        ReportKind::BalanceSheet,
        ReportKind::BudgetVariance,
        ReportKind::BudgetSummary,
    ];

    /// Stable identifier, used as bundle key and output file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::ProfitAndLoss => "profit_and_loss",
            ReportKind::ProfitAndLossVsPriorYear => "profit_and_loss_vs_prior_year",
            ReportKind::BalanceSheet => "balance_sheet",
            ReportKind::BudgetVariance => "budget_variance",
            ReportKind::BudgetSummary => "budget_summary",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReportKind::ProfitAndLoss => "Profit and Loss",
            ReportKind::ProfitAndLossVsPriorYear => "Profit and Loss vs Prior Year",
            ReportKind::BalanceSheet => "Balance Sheet",
            ReportKind::BudgetVariance => "Budget Variance",
            ReportKind::BudgetSummary => "Budget Summary",
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(input: &str) -> Result<ReportKind, Self::Err> {
        let normalized = input.trim().to_lowercase().replace('-', "_");
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown report kind: '{}'", input))
    }
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reconstructed row of a report: the account with its full hierarchy and
/// its values, aligned with the value columns of the owning table.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyRow {
    section: String,
    subsection: String,
    account: String,
    values: Vec<Cell>,
}

impl HierarchyRow {
    pub fn new(
        section: impl Into<String>,
        subsection: impl Into<String>,
        account: impl Into<String>,
        values: Vec<Cell>,
    ) -> Self {
        Self {
            section: section.into(),
            subsection: subsection.into(),
            account: account.into(),
            values,
        }
    }

    /// Broadest level of the hierarchy, e.g. "Revenue".
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn subsection(&self) -> &str {
        &self.subsection
    }

    /// Most granular level of the hierarchy, e.g. "Sales".
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// (section, subsection, account) triple identifying the row.
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.section, &self.subsection, &self.account)
    }

    /// `true` if at least one value cell is non-empty.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|cell| !cell.is_empty())
    }

    /// All three labels are set, but the row carries no value at all.
    pub fn is_label_only(&self) -> bool {
        !self.section.is_empty()
            && !self.subsection.is_empty()
            && !self.account.is_empty()
            && !self.has_values()
    }

    /// Consume the row and return it with both section and subsection set to `group`.
    pub fn regrouped(mut self, group: &str) -> Self {
        self.section = group.to_string();
        self.subsection = group.to_string();
        self
    }
}

/// Long-format fact: one amount of one account for one period or metric.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    legal_entity: String,
    section: String,
    subsection: String,
    account: String,
    /// Column name the amount was melted from (period label or metric name).
    period_label: String,
    /// `None` when the label could not be parsed into a date.
    period_date: Option<NaiveDate>,
    amount: f64,
}

impl FactRow {
    pub fn new(
        legal_entity: &str,
        row: &HierarchyRow,
        period_label: String,
        period_date: Option<NaiveDate>,
        amount: f64,
    ) -> Self {
        Self {
            legal_entity: legal_entity.to_string(),
            section: row.section.clone(),
            subsection: row.subsection.clone(),
            account: row.account.clone(),
            period_label,
            period_date,
            amount,
        }
    }

    pub fn legal_entity(&self) -> &str {
        &self.legal_entity
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn subsection(&self) -> &str {
        &self.subsection
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.section, &self.subsection, &self.account)
    }

    pub fn period_label(&self) -> &str {
        &self.period_label
    }

    pub fn period_date(&self) -> Option<NaiveDate> {
        self.period_date
    }

    /// Calendar year of the period, if the period is known.
    pub fn year(&self) -> Option<i32> {
        self.period_date.map(|date| date.year())
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl Display for FactRow {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}, {}: {:.2}",
            self.section, self.subsection, self.account, self.period_label, self.amount
        )
    }
}

/// What the value columns of a report represent once melted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeltAxis {
    /// Columns are reporting periods, e.g. "Mar 2025".
    #[default]
    Period,
    /// Columns are metrics, e.g. "Actual" or "Budget", for a single report period.
    Metric,
}

impl MeltAxis {
    pub fn label_header(&self) -> &'static str {
        match self {
            MeltAxis::Period => "Period",
            MeltAxis::Metric => "Metric",
        }
    }

    pub fn date_header(&self) -> &'static str {
        match self {
            MeltAxis::Period => "Period Date",
            MeltAxis::Metric => "Report Period",
        }
    }

    pub fn amount_header(&self) -> &'static str {
        match self {
            MeltAxis::Period => "Amount",
            MeltAxis::Metric => "Value",
        }
    }
}

/// Report in wide format: one row per account, one column per period or metric.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub kind: ReportKind,
    pub legal_entity: String,
    /// Period taken from the report banner, for reports that carry one.
    pub report_period: Option<NaiveDate>,
    /// Names of the value columns, in worksheet order.
    pub columns: Vec<String>,
    pub rows: Vec<HierarchyRow>,
}

impl WideTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Value of the given row in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|row| row.values().get(index))
    }
}

/// Report in long format: one row per (account, period-or-metric) fact.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub kind: ReportKind,
    pub legal_entity: String,
    pub axis: MeltAxis,
    pub rows: Vec<FactRow>,
}

/// Output of a single report transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Wide(WideTable),
    Long(LongTable),
}

impl Table {
    pub fn kind(&self) -> ReportKind {
        match self {
            Table::Wide(table) => table.kind,
            Table::Long(table) => table.kind,
        }
    }

    pub fn legal_entity(&self) -> &str {
        match self {
            Table::Wide(table) => &table.legal_entity,
            Table::Long(table) => &table.legal_entity,
        }
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        match self {
            Table::Wide(table) => table.rows.len(),
            Table::Long(table) => table.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_wide(&self) -> Option<&WideTable> {
        match self {
            Table::Wide(table) => Some(table),
            Table::Long(_) => None,
        }
    }

    pub fn as_long(&self) -> Option<&LongTable> {
        match self {
            Table::Long(table) => Some(table),
            Table::Wide(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_text_is_empty() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::from("   ").is_empty());
        assert!(!Cell::from(" x ").is_empty());
        assert!(!Cell::from(0.0).is_empty());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Cell::from(12.5).as_number(false), Some(12.5));
        assert_eq!(Cell::from(" 100 ").as_number(false), Some(100.0));
        assert_eq!(Cell::from("1,5").as_number(false), None);
        assert_eq!(Cell::from("1,5").as_number(true), Some(1.5));
        assert_eq!(Cell::from("n/a").as_number(false), None);
        assert_eq!(Cell::from("NaN").as_number(false), None);
        assert_eq!(Cell::from(f64::INFINITY).as_number(false), None);
        assert_eq!(Cell::Bool(true).as_number(false), None);
        assert_eq!(Cell::Empty.as_number(false), None);
    }

    #[test]
    fn labels_are_trimmed() {
        assert_eq!(Cell::from("  Sales ").label().as_deref(), Some("Sales"));
        assert_eq!(Cell::from(2025.0).label().as_deref(), Some("2025"));
        assert_eq!(Cell::Empty.label(), None);
    }

    #[test]
    fn grid_cell_out_of_range_is_empty() {
        let grid = RawGrid::new(vec![vec![Cell::from("a")], vec![]]);
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.cell(0, 0), &Cell::from("a"));
        assert_eq!(grid.cell(1, 0), &Cell::Empty);
        assert_eq!(grid.cell(7, 3), &Cell::Empty);
    }

    #[test]
    fn report_kind_round_trips_through_str() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>(), Ok(kind));
        }
        assert_eq!(
            "Balance-Sheet".parse::<ReportKind>(),
            Ok(ReportKind::BalanceSheet)
        );
        assert!("cash_flow".parse::<ReportKind>().is_err());
    }

    #[test]
    fn label_only_rows() {
        let row = HierarchyRow::new("Assets", "Bank", "Cheque Account", vec![Cell::Empty]);
        assert!(row.is_label_only());

        let row = HierarchyRow::new("Assets", "Bank", "Cheque Account", vec![Cell::from(1.0)]);
        assert!(!row.is_label_only());
    }

    #[test]
    fn regrouping_overrides_section_and_subsection() {
        let row = HierarchyRow::new("Expenses", "Expenses", "Net Profit", vec![Cell::from(5.0)])
            .regrouped("Net Profit");
        assert_eq!(row.triple(), ("Net Profit", "Net Profit", "Net Profit"));
    }
}
