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

use chrono::NaiveDate;
use itertools::Itertools;

use report_types::{FactRow, LongTable, MeltAxis, ReportError, Result, WideTable};

use crate::config::ReportConfig;
use crate::period::parse_month_year;

/// Options of the wide-to-long reshaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeltOptions {
    pub axis: MeltAxis,
    /// Date attached to every fact on the metric axis.
    pub report_period: Option<NaiveDate>,
    pub decimal_comma: bool,
    pub drop_zero_amounts: bool,
}

impl MeltOptions {
    pub fn for_report(config: &ReportConfig, report_period: Option<NaiveDate>) -> Self {
        Self {
            axis: config.melt_axis,
            report_period,
            decimal_comma: config.decimal_comma,
            drop_zero_amounts: config.drop_zero_amounts,
        }
    }
}

/// Collapse runs of whitespace in a metric name, e.g. `"YTD   Actual "` into `"YTD Actual"`.
pub fn normalize_metric(name: &str) -> String {
    name.split_whitespace().join(" ")
}

/// Melt the wide table into one fact per (row, value column) pair holding a number.
///
/// Facts are ordered column by column. Cells that are empty or not numeric carry no fact
/// and are skipped. The hierarchy of every fact is copied from its row unchanged.
pub fn melt(table: &WideTable, options: &MeltOptions) -> Result<LongTable> {
    if table.columns.is_empty() {
        return Err(ReportError::NothingToMelt { report: table.kind });
    }

    let mut facts = Vec::new();

    for (index, column) in table.columns.iter().enumerate() {
        let (label, date) = match options.axis {
            MeltAxis::Period => (column.clone(), parse_month_year(column)),
            MeltAxis::Metric => (normalize_metric(column), options.report_period),
        };

        if options.axis == MeltAxis::Period && date.is_none() {
            log::debug!(
                "Column '{}' of report '{}' is not a month-year label, facts will have no date",
                column,
                table.kind
            );
        }

        for row in &table.rows {
            let cell = row.values().get(index);
            let Some(amount) = cell.and_then(|cell| cell.as_number(options.decimal_comma)) else {
                if let Some(cell) = cell.filter(|cell| !cell.is_empty()) {
                    log::trace!(
                        "Dropping non-numeric value {:?} of '{}' in column '{}'",
                        cell,
                        row.account(),
                        column
                    );
                }
                continue;
            };

            if options.drop_zero_amounts && amount == 0.0 {
                continue;
            }

            facts.push(FactRow::new(
                &table.legal_entity,
                row,
                label.clone(),
                date,
                amount,
            ));
        }
    }

    log::debug!(
        "Melted {} rows x {} columns of report '{}' into {} facts",
        table.rows.len(),
        table.columns.len(),
        table.kind,
        facts.len()
    );

    Ok(LongTable {
        kind: table.kind,
        legal_entity: table.legal_entity.clone(),
        axis: options.axis,
        rows: facts,
    })
}
