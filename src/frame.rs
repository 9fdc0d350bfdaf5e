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

//! Turns a raw worksheet grid into a report body: header row promoted to
//! column names, label columns separated from value columns, empty rows removed.

use itertools::Itertools;
use std::collections::HashMap;

use report_types::{Cell, RawGrid, ReportError, Result};

use crate::config::{LabelLayout, ReportConfig};
use crate::period::month_year_label;

/// Body row of a report, with its labels separated from its values.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledRow {
    /// Text of the section column. Only the split layout has one.
    pub section_label: Option<String>,
    /// Text of the account column, or of the single label column.
    pub label: Option<String>,
    /// Cells of the value columns, aligned with `ReportFrame::columns`.
    pub values: Vec<Cell>,
}

impl LabelledRow {
    /// `true` if at least one value cell is non-empty.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|cell| !cell.is_empty())
    }
}

/// Report body, ready for hierarchy reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFrame {
    /// Names of the value columns.
    pub columns: Vec<String>,
    pub rows: Vec<LabelledRow>,
    /// Label layout the rows were read with. A split-layout report whose
    /// account column is the first column is read with the single layout.
    pub layout: LabelLayout,
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Name of a header cell. Blank headers are named after their position.
fn header_name(cell: &Cell, index: usize) -> String {
    match cell {
        Cell::Date(date) => month_year_label(date),
        _ => cell
            .label()
            .unwrap_or_else(|| format!("Unnamed: {}", index)),
    }
}

/// Column names for the header row, padded to `width`.
///
/// Repeated names get a numeric suffix, so the second "Variance" column becomes "Variance.1".
pub fn column_names(header: &[Cell], width: usize) -> Vec<String> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    (0..width.max(header.len()))
        .map(|index| {
            let name = header_name(header.get(index).unwrap_or(&EMPTY_CELL), index);
            let count = occurrences.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Build the report body of `grid` according to the report configuration.
pub fn build_frame(grid: &RawGrid, sheet: &str, config: &ReportConfig) -> Result<ReportFrame> {
    let header = grid
        .rows()
        .get(config.skip_rows)
        .ok_or_else(|| ReportError::HeaderRowMissing {
            sheet: sheet.to_string(),
            skip_rows: config.skip_rows,
        })?;

    let names = column_names(header, grid.width());
    let (section_column, label_column) = label_columns(&names, config)?;
    let layout = match section_column {
        Some(_) => LabelLayout::Split,
        None => LabelLayout::Single,
    };
    let value_indices = value_columns(&names, config, section_column, label_column);

    log::debug!(
        "Sheet '{}': label column '{}', value columns {:?}",
        sheet,
        names[label_column],
        value_indices.iter().map(|&index| &names[index]).collect::<Vec<_>>()
    );

    let rows: Vec<LabelledRow> = grid
        .rows()
        .iter()
        .skip(config.skip_rows + 1)
        .filter(|row| !row.iter().all(Cell::is_empty))
        .map(|row| {
            let cell = |index: usize| row.get(index).unwrap_or(&EMPTY_CELL);
            LabelledRow {
                section_label: section_column.and_then(|index| cell(index).label()),
                label: cell(label_column).label(),
                values: value_indices.iter().map(|&index| cell(index).clone()).collect(),
            }
        })
        .collect();

    Ok(ReportFrame {
        columns: value_indices
            .into_iter()
            .map(|index| names[index].clone())
            .collect(),
        rows,
        layout,
    })
}

/// Position of the section column (split layout only) and of the label column.
///
/// A split-layout sheet whose first column holds the account label has no section
/// column; it is read with the single layout.
fn label_columns(names: &[String], config: &ReportConfig) -> Result<(Option<usize>, usize)> {
    let aliases: Vec<String> = config
        .label_aliases
        .iter()
        .map(|alias| alias.trim().to_lowercase())
        .collect();
    let is_label = |name: &String| aliases.contains(&name.trim().to_lowercase());

    let not_found = || ReportError::ColumnNotFound {
        report: config.kind,
        column: "account".to_string(),
        available: names.iter().map(|name| format!("'{}'", name)).join(", "),
    };

    match config.layout {
        LabelLayout::Single => names
            .iter()
            .position(is_label)
            .map(|index| (None, index))
            .ok_or_else(not_found),
        LabelLayout::Split => {
            // The first column carries the sections, the account column follows it.
            if let Some(index) = names.iter().skip(1).position(is_label) {
                return Ok((Some(0), index + 1));
            }

            match names.first() {
                Some(first) if is_label(first) => {
                    log::info!(
                        "Report '{}' has its account column first, reading it without sections",
                        config.kind
                    );
                    Ok((None, 0))
                }
                _ => Err(not_found()),
            }
        }
    }
}

/// Positions of the value columns, after applying the report's column filters.
fn value_columns(
    names: &[String],
    config: &ReportConfig,
    section_column: Option<usize>,
    label_column: usize,
) -> Vec<usize> {
    let contains: Vec<String> = config
        .drop_column_contains
        .iter()
        .map(|value| value.to_lowercase())
        .collect();
    let equals: Vec<String> = config
        .drop_column_equals
        .iter()
        .map(|value| value.trim().to_lowercase())
        .collect();

    let (kept, dropped): (Vec<usize>, Vec<usize>) = (0..names.len())
        .filter(|&index| index != label_column && Some(index) != section_column)
        .partition(|&index| {
            let lower = names[index].trim().to_lowercase();
            !contains.iter().any(|value| lower.contains(value.as_str()))
                && !equals.iter().any(|value| lower == *value)
        });

    if !dropped.is_empty() {
        log::info!(
            "Dropping column(s) for report '{}': {}",
            config.kind,
            dropped.iter().map(|&index| &names[index]).join(", ")
        );
    }

    match &config.keep_columns {
        Some(keep) => keep
            .iter()
            .filter_map(|wanted| kept.iter().copied().find(|&index| names[index] == *wanted))
            .collect(),
        None => kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_types::ReportKind;

    fn text_row(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|value| {
                if value.is_empty() {
                    Cell::Empty
                } else {
                    Cell::from(*value)
                }
            })
            .collect()
    }

    #[test]
    fn header_names_are_unique_and_never_blank() {
        let march = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let header = vec![
            Cell::Empty,
            Cell::from("Account"),
            Cell::Date(march),
            Cell::from("Variance"),
            Cell::from("Variance"),
            Cell::from("Variance"),
        ];

        assert_eq!(
            column_names(&header, 7),
            vec![
                "Unnamed: 0",
                "Account",
                "Mar 2025",
                "Variance",
                "Variance.1",
                "Variance.2",
                "Unnamed: 6"
            ]
        );
    }

    #[test]
    fn split_layout_frame() {
        let grid = RawGrid::new(vec![
            text_row(&["Profit and Loss"]),
            text_row(&["Demo Company"]),
            text_row(&["For the 3 months ended 31 March 2025"]),
            vec![],
            text_row(&["", "Account", "Jan 2025", "Feb 2025", "Year to date"]),
            text_row(&["Income"]),
            vec![Cell::Empty; 5],
            vec![
                Cell::Empty,
                Cell::from("Sales"),
                Cell::from(10.0),
                Cell::from(20.0),
                Cell::from(30.0),
            ],
        ]);
        let config = ReportConfig::defaults(ReportKind::ProfitAndLoss);

        let frame = build_frame(&grid, "Profit and Loss", &config).unwrap();

        assert_eq!(frame.layout, LabelLayout::Split);
        assert_eq!(frame.columns, vec!["Jan 2025", "Feb 2025"]);
        assert_eq!(
            frame.rows,
            vec![
                LabelledRow {
                    section_label: Some("Income".to_string()),
                    label: None,
                    values: vec![Cell::Empty, Cell::Empty],
                },
                LabelledRow {
                    section_label: None,
                    label: Some("Sales".to_string()),
                    values: vec![Cell::from(10.0), Cell::from(20.0)],
                },
            ]
        );
    }

    #[test]
    fn single_layout_keeps_configured_columns_in_order() {
        let grid = RawGrid::new(vec![
            text_row(&["Budget Variance"]),
            text_row(&["For the month ended 31 March 2025"]),
            vec![],
            vec![],
            text_row(&[
                "Description",
                "Budget",
                "Actual",
                "Variance",
                "Notes",
                "Total",
                "Variance",
            ]),
            vec![
                Cell::from("Sales"),
                Cell::from(90.0),
                Cell::from(100.0),
                Cell::from(10.0),
                Cell::from("ok"),
                Cell::from(100.0),
                Cell::from(11.0),
            ],
        ]);
        let config = ReportConfig::defaults(ReportKind::BudgetVariance);

        let frame = build_frame(&grid, "Budget Variance", &config).unwrap();

        assert_eq!(frame.columns, vec!["Actual", "Budget", "Variance", "Variance.1"]);
        assert_eq!(frame.rows[0].label.as_deref(), Some("Sales"));
        assert_eq!(frame.rows[0].section_label, None);
        assert_eq!(
            frame.rows[0].values,
            vec![
                Cell::from(100.0),
                Cell::from(90.0),
                Cell::from(10.0),
                Cell::from(11.0)
            ]
        );
    }

    #[test]
    fn missing_label_column() {
        let grid = RawGrid::new(vec![text_row(&["Name", "Jan 2025"])]);
        let mut config = ReportConfig::defaults(ReportKind::BudgetSummary);
        config.skip_rows = 0;

        match build_frame(&grid, "Budget Summary", &config) {
            Err(ReportError::ColumnNotFound {
                report, available, ..
            }) => {
                assert_eq!(report, ReportKind::BudgetSummary);
                assert_eq!(available, "'Name', 'Jan 2025'");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn split_layout_with_account_column_first_has_no_sections() {
        let grid = RawGrid::new(vec![
            text_row(&["Account", "Jan 2025", "Feb 2025"]),
            text_row(&["Revenue"]),
            vec![Cell::from("Sales"), Cell::from(100.0), Cell::from(200.0)],
        ]);
        let mut config = ReportConfig::defaults(ReportKind::ProfitAndLoss);
        config.skip_rows = 0;

        let frame = build_frame(&grid, "Profit and Loss", &config).unwrap();

        assert_eq!(frame.layout, LabelLayout::Single);
        assert_eq!(frame.columns, vec!["Jan 2025", "Feb 2025"]);
        assert_eq!(frame.rows[1].section_label, None);
        assert_eq!(frame.rows[1].label.as_deref(), Some("Sales"));
        assert_eq!(
            frame.rows[1].values,
            vec![Cell::from(100.0), Cell::from(200.0)]
        );
    }

    #[test]
    fn split_layout_without_account_column() {
        let grid = RawGrid::new(vec![text_row(&["Name", "Jan 2025"])]);
        let mut config = ReportConfig::defaults(ReportKind::BalanceSheet);
        config.skip_rows = 0;

        assert!(matches!(
            build_frame(&grid, "Balance Sheet", &config),
            Err(ReportError::ColumnNotFound {
                report: ReportKind::BalanceSheet,
                ..
            })
        ));
    }

    #[test]
    fn sheet_shorter_than_banner() {
        let grid = RawGrid::new(vec![text_row(&["Balance Sheet"]), vec![]]);
        let config = ReportConfig::defaults(ReportKind::BalanceSheet);

        assert!(matches!(
            build_frame(&grid, "Balance Sheet", &config),
            Err(ReportError::HeaderRowMissing { skip_rows: 4, .. })
        ));
    }
}
