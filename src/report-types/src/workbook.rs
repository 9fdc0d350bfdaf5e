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

use crate::{RawGrid, ReportError, Result};

/// Source of worksheet contents for the report pipeline.
///
/// Expectations:
/// * `sheet_names` returns the names in workbook order.
/// * `read_sheet` returns the full sheet, anchored at cell A1.
/// * Grids handed out are never modified afterwards.
pub trait WorkbookSource {
    /// Names of all sheets, in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Read the contents of the named sheet.
    fn read_sheet(&mut self, name: &str) -> Result<RawGrid>;
}

/// Workbook held entirely in memory.
///
/// Useful when the caller already has the sheet contents, e.g. from another reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, RawGrid)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the workbook and return it with an extra sheet appended.
    pub fn with_sheet(mut self, name: &str, grid: RawGrid) -> Self {
        self.sheets.push((name.to_string(), grid));
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawGrid> {
        self.sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| ReportError::Workbook(format!("Sheet '{}' not found", name)))
    }
}
