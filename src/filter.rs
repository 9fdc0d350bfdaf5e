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

//! Row classification: keeps the rows that carry facts, removes headers,
//! totals and label-only rows, and applies the profit-row policy.

use once_cell::sync::Lazy;
use regex::Regex;

use report_types::HierarchyRow;

use crate::reconstruct::RowOutcome;

static PROFIT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)gross\s*profit|net\s*profit").expect("Pattern is valid."));

/// `true` for "Total ..." labels, case-insensitive.
pub fn is_total_label(label: &str) -> bool {
    label.trim().to_lowercase().starts_with("total")
}

/// `true` for "Gross Profit" / "Net Profit" summary lines.
pub fn is_profit_label(label: &str) -> bool {
    PROFIT_ROW.is_match(label)
}

/// Reduce the reconstructed rows to the ones carrying facts.
///
/// With `drop_profit_rows` set, profit rows are removed. Otherwise they are kept
/// with section and subsection set to their own account name.
pub fn classify(outcomes: Vec<RowOutcome>, drop_profit_rows: bool) -> Vec<HierarchyRow> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            RowOutcome::Data { row, profit } => keep_data_row(row, profit, drop_profit_rows),
            RowOutcome::SectionHeader(label) | RowOutcome::SubsectionHeader(label) => {
                log::trace!("Discarding header row '{}'", label);
                None
            }
            RowOutcome::Total(label) => {
                log::trace!("Discarding total row '{}'", label);
                None
            }
            RowOutcome::Skipped => None,
        })
        .collect()
}

fn keep_data_row(row: HierarchyRow, profit: bool, drop_profit_rows: bool) -> Option<HierarchyRow> {
    let row = if profit {
        if drop_profit_rows {
            log::debug!("Dropping profit row '{}'", row.account());
            return None;
        }
        let account = row.account().to_string();
        row.regrouped(&account)
    } else {
        row
    };

    if row.is_label_only() {
        log::debug!("Dropping label-only row {:?}", row.triple());
        return None;
    }

    // Totals never reach this point from the reconstructor; guard anyway for rows built elsewhere.
    if is_total_label(row.account()) {
        log::debug!("Dropping total row '{}'", row.account());
        return None;
    }

    Some(row)
}
