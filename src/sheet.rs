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

use itertools::Itertools;

use report_types::{ReportError, Result};

use crate::config::ReportConfig;

/// Find the sheet holding the configured report.
///
/// Returns the first sheet, in workbook order, whose lowercase name contains one of
/// the report's aliases and none of its exclusions.
pub fn locate_sheet<'a>(sheet_names: &'a [String], config: &ReportConfig) -> Result<&'a str> {
    let aliases = lowercase(&config.sheet_aliases);
    let excludes = lowercase(&config.sheet_excludes);

    sheet_names
        .iter()
        .find(|name| {
            let lower = name.to_lowercase();
            aliases.iter().any(|alias| lower.contains(alias.as_str()))
                && !excludes.iter().any(|exclude| lower.contains(exclude.as_str()))
        })
        .map(String::as_str)
        .ok_or_else(|| ReportError::SheetNotFound {
            report: config.kind,
            aliases: config
                .sheet_aliases
                .iter()
                .map(|alias| format!("'{}'", alias))
                .join(", "),
        })
}

fn lowercase(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.trim().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_types::ReportKind;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn first_match_in_workbook_order_wins() {
        let config = ReportConfig::defaults(ReportKind::BalanceSheet);
        let sheets = names(&["Cover", "PJM Balance Sheet", "Balance Sheet (2)"]);

        assert_eq!(locate_sheet(&sheets, &config).unwrap(), "PJM Balance Sheet");
    }

    #[test]
    fn matching_is_case_insensitive_and_uses_aliases() {
        let config = ReportConfig::defaults(ReportKind::ProfitAndLoss);

        let sheets = names(&["Cover", "PROFIT AND LOSS"]);
        assert_eq!(locate_sheet(&sheets, &config).unwrap(), "PROFIT AND LOSS");

        let sheets = names(&["Cover", "Monthly P&L"]);
        assert_eq!(locate_sheet(&sheets, &config).unwrap(), "Monthly P&L");
    }

    #[test]
    fn plain_profit_and_loss_skips_prior_year_comparison() {
        let sheets = names(&["Profit and Loss - vs PY", "Profit and Loss"]);

        let plain = ReportConfig::defaults(ReportKind::ProfitAndLoss);
        assert_eq!(locate_sheet(&sheets, &plain).unwrap(), "Profit and Loss");

        let prior_year = ReportConfig::defaults(ReportKind::ProfitAndLossVsPriorYear);
        assert_eq!(
            locate_sheet(&sheets, &prior_year).unwrap(),
            "Profit and Loss - vs PY"
        );
    }

    #[test]
    fn missing_sheet_is_reported() {
        let config = ReportConfig::defaults(ReportKind::BudgetVariance);
        let sheets = names(&["Profit and Loss", "Balance Sheet"]);

        match locate_sheet(&sheets, &config) {
            Err(ReportError::SheetNotFound { report, aliases }) => {
                assert_eq!(report, ReportKind::BudgetVariance);
                assert_eq!(aliases, "'budget variance'");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
