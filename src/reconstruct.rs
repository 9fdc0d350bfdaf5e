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

//! Section/subsection reconstruction.
//!
//! Exported reports encode their hierarchy implicitly, through the shape of the rows.
//! This module recovers it with a single forward pass over the report body.
//!
//! # Algorithm
//!
//! The pass carries a small state: the current section and the current subsection.
//! Every row is classified, in this order:
//!
//! 1. A label starting with "total" is a total row. It ends the group it summarizes:
//!    a section-level total clears both section and subsection, an account-level
//!    total (split layout) clears only the subsection.
//! 2. A row without any label is skipped.
//! 3. A labelled row without values is a header. Section-column labels and single-column
//!    labels open a new section. Account labels open a new subsection, or a section when
//!    no section is known yet.
//! 4. Any other labelled row is a data row. It inherits the current section (or uses its
//!    own label when there is none) and the current subsection (or the section).
//!
//! Rows that don't fit a cleaner category end up as data rows. This is permissive on
//! purpose: malformed rows leak through rather than being dropped silently.
//!
//! "Gross Profit" / "Net Profit" rows are tagged, and the state is cleared after them,
//! since such summary lines close the preceding group.

use report_types::HierarchyRow;

use crate::config::LabelLayout;
use crate::filter::{is_profit_label, is_total_label};
use crate::frame::LabelledRow;

/// Running state of the reconstruction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionState {
    pub current_section: Option<String>,
    pub current_subsection: Option<String>,
}

/// Classification of a single row, as produced by one reconstruction step.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    SectionHeader(String),
    SubsectionHeader(String),
    Total(String),
    Skipped,
    Data { row: HierarchyRow, profit: bool },
}

impl SectionState {
    /// Classify one row and advance the state accordingly.
    pub fn step(&mut self, row: &LabelledRow, layout: LabelLayout) -> RowOutcome {
        match layout {
            LabelLayout::Split => self.step_split(row),
            LabelLayout::Single => self.step_single(row),
        }
    }

    fn step_single(&mut self, row: &LabelledRow) -> RowOutcome {
        let Some(label) = row.label.clone() else {
            return RowOutcome::Skipped;
        };

        if is_total_label(&label) {
            self.reset();
            RowOutcome::Total(label)
        } else if !row.has_values() {
            self.enter_section(&label);
            RowOutcome::SectionHeader(label)
        } else {
            self.emit(label, row)
        }
    }

    fn step_split(&mut self, row: &LabelledRow) -> RowOutcome {
        if let Some(section) = row.section_label.as_deref().filter(|s| is_total_label(s)) {
            self.reset();
            return RowOutcome::Total(section.to_string());
        }
        if let Some(account) = row.label.as_deref().filter(|a| is_total_label(a)) {
            self.current_subsection = None;
            return RowOutcome::Total(account.to_string());
        }

        let has_values = row.has_values();

        match (row.section_label.clone(), row.label.clone()) {
            (None, None) => RowOutcome::Skipped,
            (Some(section), None) if !has_values => {
                self.enter_section(&section);
                RowOutcome::SectionHeader(section)
            }
            (Some(section), Some(account)) if !has_values => {
                self.enter_section(&section);
                self.current_subsection = Some(account.clone());
                RowOutcome::SubsectionHeader(account)
            }
            (None, Some(account)) if !has_values => {
                if self.current_section.is_some() {
                    self.current_subsection = Some(account.clone());
                    RowOutcome::SubsectionHeader(account)
                } else {
                    self.enter_section(&account);
                    RowOutcome::SectionHeader(account)
                }
            }
            (Some(section), account) => {
                // A section-column label with values, e.g. "Net Assets", stands on its own.
                self.enter_section(&section);
                self.emit(account.unwrap_or(section), row)
            }
            (None, Some(account)) => self.emit(account, row),
        }
    }

    fn emit(&mut self, account: String, row: &LabelledRow) -> RowOutcome {
        let profit = is_profit_label(&account);

        let section = self
            .current_section
            .clone()
            .unwrap_or_else(|| account.clone());
        let subsection = self
            .current_subsection
            .clone()
            .unwrap_or_else(|| section.clone());
        let row = HierarchyRow::new(section, subsection, account, row.values.clone());

        if profit {
            self.reset();
        }

        RowOutcome::Data { row, profit }
    }

    fn enter_section(&mut self, section: &str) {
        self.current_section = Some(section.to_string());
        self.current_subsection = None;
    }

    fn reset(&mut self) {
        self.current_section = None;
        self.current_subsection = None;
    }
}

/// Classify every row of the report body, in order.
pub fn reconstruct(rows: &[LabelledRow], layout: LabelLayout) -> Vec<RowOutcome> {
    let (_, outcomes) = rows.iter().fold(
        (SectionState::default(), Vec::with_capacity(rows.len())),
        |(mut state, mut outcomes), row| {
            let outcome = state.step(row, layout);
            log::trace!("{:?} -> {:?}", row.label, outcome);
            outcomes.push(outcome);
            (state, outcomes)
        },
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::classify;
    use report_types::Cell;

    fn single(label: &str, values: &[Option<f64>]) -> LabelledRow {
        LabelledRow {
            section_label: None,
            label: Some(label.to_string()),
            values: cells(values),
        }
    }

    fn split(section: Option<&str>, account: Option<&str>, values: &[Option<f64>]) -> LabelledRow {
        LabelledRow {
            section_label: section.map(str::to_string),
            label: account.map(str::to_string),
            values: cells(values),
        }
    }

    fn cells(values: &[Option<f64>]) -> Vec<Cell> {
        values
            .iter()
            .map(|value| value.map(Cell::from).unwrap_or_default())
            .collect()
    }

    fn triples(rows: &[HierarchyRow]) -> Vec<(&str, &str, &str)> {
        rows.iter().map(HierarchyRow::triple).collect()
    }

    #[test]
    fn single_layout_header_data_total() {
        let rows = vec![
            single("Revenue", &[None, None]),
            single("Sales", &[Some(100.0), Some(200.0)]),
            single("Total Revenue", &[Some(100.0), Some(200.0)]),
        ];

        let outcomes = reconstruct(&rows, LabelLayout::Single);

        assert_eq!(outcomes[0], RowOutcome::SectionHeader("Revenue".to_string()));
        assert_eq!(
            outcomes[1],
            RowOutcome::Data {
                row: HierarchyRow::new(
                    "Revenue",
                    "Revenue",
                    "Sales",
                    vec![Cell::from(100.0), Cell::from(200.0)]
                ),
                profit: false,
            }
        );
        assert_eq!(outcomes[2], RowOutcome::Total("Total Revenue".to_string()));
    }

    #[test]
    fn single_step_is_testable_in_isolation() {
        let mut state = SectionState {
            current_section: Some("Expenses".to_string()),
            current_subsection: None,
        };

        let outcome = state.step(&single("total expenses", &[None]), LabelLayout::Single);

        assert_eq!(outcome, RowOutcome::Total("total expenses".to_string()));
        assert_eq!(state, SectionState::default());
    }

    #[test]
    fn rows_after_a_total_use_their_own_label_as_section() {
        let rows = vec![
            single("Income", &[None]),
            single("Sales", &[Some(1.0)]),
            single("Total Income", &[Some(1.0)]),
            single("Other Income", &[Some(2.0)]),
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Single), true);

        assert_eq!(
            triples(&hierarchy),
            vec![
                ("Income", "Income", "Sales"),
                ("Other Income", "Other Income", "Other Income")
            ]
        );
    }

    #[test]
    fn split_layout_balance_sheet() {
        let rows = vec![
            split(Some("Assets"), None, &[None, None]),
            split(None, Some("Bank"), &[None, None]),
            split(None, Some("Business Account"), &[Some(10.0), Some(8.0)]),
            split(None, Some("Total Bank"), &[Some(10.0), Some(8.0)]),
            split(None, Some("Accounts Receivable"), &[Some(5.0), None]),
            split(None, Some("Current Assets"), &[None, None]),
            split(None, Some("Prepayments"), &[None, Some(1.0)]),
            split(Some("Total Assets"), None, &[Some(15.0), Some(9.0)]),
            split(Some("Liabilities"), None, &[None, None]),
            split(None, Some("GST"), &[Some(-2.0), Some(-1.0)]),
            split(Some("Total Liabilities"), None, &[Some(-2.0), Some(-1.0)]),
            split(Some("Net Assets"), None, &[Some(13.0), Some(8.0)]),
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Split), false);

        assert_eq!(
            triples(&hierarchy),
            vec![
                ("Assets", "Bank", "Business Account"),
                ("Assets", "Assets", "Accounts Receivable"),
                ("Assets", "Current Assets", "Prepayments"),
                ("Liabilities", "Liabilities", "GST"),
                ("Net Assets", "Net Assets", "Net Assets"),
            ]
        );
    }

    #[test]
    fn split_layout_header_with_both_labels() {
        let rows = vec![
            split(Some("Equity"), Some("Retained Earnings"), &[None]),
            split(None, Some("Opening Balance"), &[Some(4.0)]),
        ];

        let outcomes = reconstruct(&rows, LabelLayout::Split);

        assert_eq!(
            outcomes[0],
            RowOutcome::SubsectionHeader("Retained Earnings".to_string())
        );
        let hierarchy = classify(outcomes, true);
        assert_eq!(
            triples(&hierarchy),
            vec![("Equity", "Retained Earnings", "Opening Balance")]
        );
    }

    #[test]
    fn account_header_without_section_opens_a_section() {
        let rows = vec![
            split(None, Some("Trading Income"), &[None]),
            split(None, Some("Sales"), &[Some(3.0)]),
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Split), true);

        assert_eq!(
            triples(&hierarchy),
            vec![("Trading Income", "Trading Income", "Sales")]
        );
    }

    #[test]
    fn net_profit_is_regrouped_under_its_own_name() {
        let rows = vec![
            single("Operating Expenses", &[None]),
            single("Rent", &[Some(5.0)]),
            single("Net Profit", &[Some(20.0)]),
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Single), false);

        assert_eq!(
            triples(&hierarchy),
            vec![
                ("Operating Expenses", "Operating Expenses", "Rent"),
                ("Net Profit", "Net Profit", "Net Profit")
            ]
        );
    }

    #[test]
    fn profit_rows_close_their_group() {
        let rows = vec![
            split(Some("Cost of Sales"), None, &[None]),
            split(None, Some("Purchases"), &[Some(4.0)]),
            split(Some("Gross Profit"), None, &[Some(6.0)]),
            split(None, Some("Interest Income"), &[Some(1.0)]),
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Split), true);

        assert_eq!(
            triples(&hierarchy),
            vec![
                ("Cost of Sales", "Cost of Sales", "Purchases"),
                ("Interest Income", "Interest Income", "Interest Income")
            ]
        );
    }

    #[test]
    fn total_rows_never_survive() {
        let rows = vec![
            single("Revenue", &[None]),
            single("TOTAL revenue", &[None]),
            single("Sales", &[Some(1.0)]),
            single("  Total Sales ", &[Some(1.0)]),
        ];

        for drop_profit_rows in [true, false] {
            let hierarchy = classify(reconstruct(&rows, LabelLayout::Single), drop_profit_rows);
            assert!(hierarchy
                .iter()
                .all(|row| !row.account().trim().to_lowercase().starts_with("total")));
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let rows = vec![
            split(Some("Income"), None, &[None]),
            split(None, Some("Sales"), &[Some(1.0)]),
            split(None, Some("Total Income"), &[Some(1.0)]),
            split(Some("Gross Profit"), None, &[Some(1.0)]),
        ];

        assert_eq!(
            reconstruct(&rows, LabelLayout::Split),
            reconstruct(&rows, LabelLayout::Split)
        );
    }

    #[test]
    fn permissive_policy_keeps_rows_with_non_numeric_values() {
        // A row that is neither a clean header nor a clean data row is treated as data.
        let rows = vec![
            single("Revenue", &[None]),
            LabelledRow {
                section_label: None,
                label: Some("Memo".to_string()),
                values: vec![Cell::from("see note 4"), Cell::Empty],
            },
        ];

        let hierarchy = classify(reconstruct(&rows, LabelLayout::Single), true);

        assert_eq!(triples(&hierarchy), vec![("Revenue", "Revenue", "Memo")]);
    }

    #[test]
    fn unlabelled_rows_are_skipped() {
        let rows = vec![split(None, None, &[Some(1.0)])];

        assert_eq!(
            reconstruct(&rows, LabelLayout::Split),
            vec![RowOutcome::Skipped]
        );
    }
}
