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

//! Single-report transformation: sheet lookup, frame building, hierarchy
//! reconstruction, filtering and optional reshaping to the long format.

use report_types::{RawGrid, ReportError, ReportKind, Result, Table, WideTable, WorkbookSource};

use crate::config::{Config, ReportConfig};
use crate::filter::classify;
use crate::frame::build_frame;
use crate::period::find_report_period;
use crate::reconstruct::reconstruct;
use crate::reshape::{melt, MeltOptions};
use crate::sheet::locate_sheet;
use crate::xlsx_parser::CalamineWorkbook;

/// Transform one report of the workbook into a table.
///
/// # Arguments
/// * `workbook` - source of the sheet contents.
/// * `config` - configuration of the report to transform.
/// * `legal_entity` - identifier stamped on every fact of the long format.
/// * `drop_profit_rows` - drop "Gross Profit" / "Net Profit" rows instead of regrouping them.
/// * `melt_to_long` - return the long format instead of the wide one.
pub fn transform<W: WorkbookSource>(
    workbook: &mut W,
    config: &ReportConfig,
    legal_entity: &str,
    drop_profit_rows: bool,
    melt_to_long: bool,
) -> Result<Table> {
    let sheet_names = workbook.sheet_names();
    let sheet = locate_sheet(&sheet_names, config)?;

    log::debug!("Report '{}' is read from sheet '{}'", config.kind, sheet);

    let grid = workbook.read_sheet(sheet)?;
    transform_grid(
        &grid,
        sheet,
        config,
        legal_entity,
        drop_profit_rows,
        melt_to_long,
    )
}

/// Transform the contents of an already located sheet.
pub fn transform_grid(
    grid: &RawGrid,
    sheet: &str,
    config: &ReportConfig,
    legal_entity: &str,
    drop_profit_rows: bool,
    melt_to_long: bool,
) -> Result<Table> {
    let report_period = config.banner_scan_rows.and_then(|scan_rows| {
        let period = find_report_period(grid, scan_rows);
        if period.is_none() {
            log::warn!(
                "No report period found in the first {} rows of sheet '{}'",
                scan_rows,
                sheet
            );
        }
        period
    });

    let frame = build_frame(grid, sheet, config)?;
    let outcomes = reconstruct(&frame.rows, frame.layout);
    let rows = classify(outcomes, drop_profit_rows);

    if rows.is_empty() {
        if config.require_rows {
            return Err(ReportError::EmptyResult {
                report: config.kind,
            });
        }
        log::warn!("Report '{}' has no data rows", config.kind);
    }

    let wide = WideTable {
        kind: config.kind,
        legal_entity: legal_entity.to_string(),
        report_period,
        columns: frame.columns,
        rows,
    };

    if melt_to_long {
        let options = MeltOptions::for_report(config, report_period);
        Ok(Table::Long(melt(&wide, &options)?))
    } else {
        Ok(Table::Wide(wide))
    }
}

/// Open the workbook at `file_path` and transform the given report.
pub fn transform_file(
    file_path: &str,
    kind: ReportKind,
    config: &Config,
    legal_entity: &str,
    drop_profit_rows: bool,
    melt_to_long: bool,
) -> Result<Table> {
    let mut workbook = CalamineWorkbook::open(file_path)?;
    transform(
        &mut workbook,
        config.report(kind),
        legal_entity,
        drop_profit_rows,
        melt_to_long,
    )
}
