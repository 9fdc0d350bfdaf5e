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

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::BufReader;

use report_types::{Cell, RawGrid, ReportError, Result, WorkbookSource};

/// Workbook read from disk with `calamine`.
///
/// Any format `calamine` can auto-detect is accepted (xlsx, xlsm, xlsb, xls, ods).
pub struct CalamineWorkbook {
    file_path: String,
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    /// Open the workbook at the given path.
    pub fn open(file_path: &str) -> Result<Self> {
        let sheets = open_workbook_auto(file_path).map_err(|e| {
            ReportError::Workbook(format!("Failed to open '{}', with error: {}", file_path, e))
        })?;

        log::debug!("Opened workbook '{}'", file_path);

        Ok(Self {
            file_path: file_path.to_string(),
            sheets,
        })
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawGrid> {
        let range = self.sheets.worksheet_range(name).map_err(|e| {
            ReportError::Workbook(format!(
                "File: '{}', Sheet: '{}' could not be read, with error: {}",
                self.file_path, name, e
            ))
        })?;

        let grid = anchored_grid(&range);

        log::debug!(
            "Read {} rows from file: {}, sheet: {}",
            grid.len(),
            self.file_path,
            name
        );

        Ok(grid)
    }
}

/// Convert the used range of a sheet into a grid anchored at A1.
///
/// `calamine` only returns the used range, so leading empty rows and columns
/// are restored here to keep row offsets absolute.
fn anchored_grid(range: &Range<Data>) -> RawGrid {
    let Some((start_row, start_column)) = range.start() else {
        return RawGrid::default();
    };

    let leading_rows = (0..start_row).map(|_| Vec::<Cell>::new());
    let used_rows = range.rows().map(|row| {
        std::iter::repeat(Cell::Empty)
            .take(start_column as usize)
            .chain(row.iter().map(to_cell))
            .collect::<Vec<_>>()
    });

    RawGrid::new(leading_rows.chain(used_rows).collect())
}

/// Convert a single `calamine` cell. Error cells become empty.
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(value) => Cell::Text(value.clone()),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Bool(*value),
        Data::DateTime(value) => match value.as_datetime() {
            Some(date_time) => Cell::Date(date_time),
            None => {
                log::trace!("Cannot convert {:?} to a date, keeping it empty", value);
                Cell::Empty
            }
        },
        Data::DateTimeIso(value) => parse_iso_date_time(value)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(value.clone())),
        Data::DurationIso(value) => Cell::Text(value.clone()),
        Data::Error(error) => {
            log::trace!("Cell holds error {:?}, keeping it empty", error);
            Cell::Empty
        }
    }
}

fn parse_iso_date_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn cells_are_converted() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(
            to_cell(&Data::String("Sales".to_string())),
            Cell::from("Sales")
        );
        assert_eq!(to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(to_cell(&Data::Int(-3)), Cell::Number(-3.0));
        assert_eq!(to_cell(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(to_cell(&Data::Error(CellErrorType::Div0)), Cell::Empty);
        assert_eq!(
            to_cell(&Data::DurationIso("PT1H".to_string())),
            Cell::from("PT1H")
        );
    }

    #[test]
    fn iso_dates_become_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(
            to_cell(&Data::DateTimeIso("2025-03-01".to_string())),
            Cell::Date(expected)
        );
        assert_eq!(
            to_cell(&Data::DateTimeIso("2025-03-01T00:00:00".to_string())),
            Cell::Date(expected)
        );
        assert_eq!(
            to_cell(&Data::DateTimeIso("March".to_string())),
            Cell::from("March")
        );
    }

    #[test]
    fn grid_is_anchored_at_a1() {
        let mut range = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Profit and Loss".to_string()));
        range.set_value((3, 2), Data::Float(10.0));

        let grid = anchored_grid(&range);

        assert_eq!(grid.len(), 4);
        assert!(grid.rows()[0].is_empty());
        assert_eq!(grid.cell(2, 1), &Cell::from("Profit and Loss"));
        assert_eq!(grid.cell(2, 0), &Cell::Empty);
        assert_eq!(grid.cell(3, 2), &Cell::Number(10.0));
    }

    #[test]
    fn empty_range_gives_empty_grid() {
        let range: Range<Data> = Range::empty();
        assert!(anchored_grid(&range).is_empty());
    }

    #[test]
    fn missing_file_is_a_workbook_error() {
        assert!(matches!(
            CalamineWorkbook::open("/definitely/not/here.xlsx"),
            Err(ReportError::Workbook(_))
        ));
    }
}
