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

//! Per-report configuration of the transformation pipeline.
//!
//! Every report runs through the same pipeline; the quirks of each export
//! (where the header row sits, how labels are laid out, which columns to ignore)
//! are captured as values here. Built-in defaults match the accounting system's
//! standard exports and can be overridden from a TOML file:
//!
//! ```toml
//! [[report]]
//! kind = "balance_sheet"
//! sheet_aliases = ["statement of financial position"]
//! skip_rows = 5
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use report_types::{MeltAxis, ReportError, ReportKind};

/// How the hierarchy labels are laid out in a report.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLayout {
    /// First column carries section labels, a separate account column carries
    /// subsection and account labels.
    Split,
    /// A single label column; sections are inferred from rows without values.
    Single,
}

/// Everything the pipeline needs to know about one report kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub kind: ReportKind,
    /// Case-insensitive substrings identifying the sheet.
    pub sheet_aliases: Vec<String>,
    /// Case-insensitive substrings disqualifying an otherwise matching sheet.
    pub sheet_excludes: Vec<String>,
    /// Number of banner rows above the header row.
    pub skip_rows: usize,
    pub layout: LabelLayout,
    /// Accepted names of the account (or single label) column, case-insensitive.
    pub label_aliases: Vec<String>,
    /// Value columns whose name contains any of these are ignored.
    pub drop_column_contains: Vec<String>,
    /// Value columns whose name equals any of these are ignored.
    pub drop_column_equals: Vec<String>,
    /// If set, only these value columns are kept, in this order.
    pub keep_columns: Option<Vec<String>>,
    pub melt_axis: MeltAxis,
    /// Default for dropping "Gross Profit" / "Net Profit" rows.
    pub drop_profit_rows: bool,
    /// Default for returning the long format.
    pub melt_to_long: bool,
    /// Read commas in textual amounts as decimal points.
    pub decimal_comma: bool,
    /// Drop facts with an amount of exactly zero when melting.
    pub drop_zero_amounts: bool,
    /// Fail with `EmptyResult` if no data row survives filtering.
    pub require_rows: bool,
    /// Number of top rows searched for a report period banner, if the report has one.
    pub banner_scan_rows: Option<usize>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl ReportConfig {
    /// Built-in configuration for the given report kind.
    pub fn defaults(kind: ReportKind) -> Self {
        let base = ReportConfig {
            kind,
            sheet_aliases: Vec::new(),
            sheet_excludes: Vec::new(),
            skip_rows: 4,
            layout: LabelLayout::Split,
            label_aliases: strings(&["account"]),
            drop_column_contains: strings(&["year to date"]),
            drop_column_equals: Vec::new(),
            keep_columns: None,
            melt_axis: MeltAxis::Period,
            drop_profit_rows: true,
            melt_to_long: false,
            decimal_comma: false,
            drop_zero_amounts: false,
            require_rows: false,
            banner_scan_rows: None,
        };

        match kind {
            ReportKind::ProfitAndLoss => ReportConfig {
                sheet_aliases: strings(&["profit and loss", "p&l"]),
                sheet_excludes: strings(&["vs py", "vs prior year"]),
                ..base
            },
            ReportKind::ProfitAndLossVsPriorYear => ReportConfig {
                sheet_aliases: strings(&["profit and loss - vs py", "p&l - vs py"]),
                decimal_comma: true,
                drop_zero_amounts: true,
                ..base
            },
            ReportKind::BalanceSheet => ReportConfig {
                sheet_aliases: strings(&["balance sheet"]),
                drop_profit_rows: false,
                ..base
            },
            ReportKind::BudgetVariance => ReportConfig {
                sheet_aliases: strings(&["budget variance"]),
                layout: LabelLayout::Single,
                label_aliases: strings(&[
                    "account",
                    "gl account",
                    "account description",
                    "description",
                    "account name",
                    "ledger account",
                    "account code",
                ]),
                drop_column_contains: Vec::new(),
                drop_column_equals: strings(&["total"]),
                keep_columns: Some(strings(&[
                    "Actual",
                    "Budget",
                    "Variance",
                    "Variance %",
                    "YTD Actual",
                    "YTD Budget",
                    "Variance.1",
                    "Variance %.1",
                ])),
                melt_axis: MeltAxis::Metric,
                drop_profit_rows: false,
                banner_scan_rows: Some(10),
                ..base
            },
            ReportKind::BudgetSummary => ReportConfig {
                sheet_aliases: strings(&["budget summary"]),
                skip_rows: 5,
                layout: LabelLayout::Single,
                drop_column_contains: Vec::new(),
                drop_column_equals: strings(&["total"]),
                melt_to_long: true,
                require_rows: true,
                ..base
            },
        }
    }

    fn apply(&mut self, update: ReportOverride) {
        let ReportOverride {
            kind: _,
            sheet_aliases,
            sheet_excludes,
            skip_rows,
            layout,
            label_aliases,
            drop_column_contains,
            drop_column_equals,
            keep_columns,
            melt_axis,
            drop_profit_rows,
            melt_to_long,
            decimal_comma,
            drop_zero_amounts,
            require_rows,
            banner_scan_rows,
        } = update;

        if let Some(value) = sheet_aliases {
            self.sheet_aliases = value;
        }
        if let Some(value) = sheet_excludes {
            self.sheet_excludes = value;
        }
        if let Some(value) = skip_rows {
            self.skip_rows = value;
        }
        if let Some(value) = layout {
            self.layout = value;
        }
        if let Some(value) = label_aliases {
            self.label_aliases = value;
        }
        if let Some(value) = drop_column_contains {
            self.drop_column_contains = value;
        }
        if let Some(value) = drop_column_equals {
            self.drop_column_equals = value;
        }
        if let Some(value) = keep_columns {
            // An empty list switches the restriction off.
            self.keep_columns = (!value.is_empty()).then_some(value);
        }
        if let Some(value) = melt_axis {
            self.melt_axis = value;
        }
        if let Some(value) = drop_profit_rows {
            self.drop_profit_rows = value;
        }
        if let Some(value) = melt_to_long {
            self.melt_to_long = value;
        }
        if let Some(value) = decimal_comma {
            self.decimal_comma = value;
        }
        if let Some(value) = drop_zero_amounts {
            self.drop_zero_amounts = value;
        }
        if let Some(value) = require_rows {
            self.require_rows = value;
        }
        if let Some(value) = banner_scan_rows {
            self.banner_scan_rows = (value > 0).then_some(value);
        }
    }
}

/// Partial report configuration, as read from the TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportOverride {
    kind: ReportKind,
    sheet_aliases: Option<Vec<String>>,
    sheet_excludes: Option<Vec<String>>,
    skip_rows: Option<usize>,
    layout: Option<LabelLayout>,
    label_aliases: Option<Vec<String>>,
    drop_column_contains: Option<Vec<String>>,
    drop_column_equals: Option<Vec<String>>,
    keep_columns: Option<Vec<String>>,
    melt_axis: Option<MeltAxis>,
    drop_profit_rows: Option<bool>,
    melt_to_long: Option<bool>,
    decimal_comma: Option<bool>,
    drop_zero_amounts: Option<bool>,
    require_rows: Option<bool>,
    banner_scan_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReportsFile {
    #[serde(default)]
    report: Vec<ReportOverride>,
}

/// Configuration of all report kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    reports: BTreeMap<ReportKind, ReportConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reports: ReportKind::ALL
                .into_iter()
                .map(|kind| (kind, ReportConfig::defaults(kind)))
                .collect(),
        }
    }
}

impl Config {
    /// Create a new `Config` from the defaults, overridden by the TOML file at the given path.
    pub fn new(path: &str) -> Result<Self, ReportError> {
        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("Failed to read '{}', with error: {}", path, e))
        })?;

        Self::from_toml_str(&toml_content)
    }

    /// Defaults, overridden by the `[[report]]` tables of the given TOML document.
    pub fn from_toml_str(toml_content: &str) -> Result<Self, ReportError> {
        let file: ReportsFile = toml::from_str(toml_content)
            .map_err(|e| ReportError::Config(format!("Invalid report configuration: {}", e)))?;

        let mut config = Self::default();
        let mut seen = HashSet::new();

        for update in file.report {
            if !seen.insert(update.kind) {
                log::warn!(
                    "Duplicate configuration entry for report '{}', later values win",
                    update.kind
                );
            }

            log::debug!("Applying configuration override for report '{}'", update.kind);
            config.report_mut(update.kind).apply(update);
        }

        Ok(config)
    }

    /// Configuration of the given report kind.
    pub fn report(&self, kind: ReportKind) -> &ReportConfig {
        &self.reports[&kind]
    }

    fn report_mut(&mut self, kind: ReportKind) -> &mut ReportConfig {
        self.reports
            .entry(kind)
            .or_insert_with(|| ReportConfig::defaults(kind))
    }
}
