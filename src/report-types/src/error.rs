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

use thiserror::Error;

use crate::ReportKind;

/// Failures that abort the transformation of a single report.
///
/// Problems with individual cells or period labels are never reported here;
/// those cells are dropped and those dates are left empty.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No sheet found for report '{report}', looked for: {aliases}")]
    SheetNotFound { report: ReportKind, aliases: String },

    #[error("Could not find {column} column for report '{report}'. Available: {available}")]
    ColumnNotFound {
        report: ReportKind,
        column: String,
        available: String,
    },

    #[error("No valid data rows found for report '{report}' after filtering")]
    EmptyResult { report: ReportKind },

    #[error("Sheet '{sheet}' has no header row after skipping {skip_rows} rows")]
    HeaderRowMissing { sheet: String, skip_rows: usize },

    #[error("No value columns found to melt for report '{report}'")]
    NothingToMelt { report: ReportKind },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
