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

//! Shared data model for the report transformation pipeline.

mod core;
mod csv;
mod error;
mod workbook;

pub use core::{
    Cell, FactRow, HierarchyRow, LongTable, MeltAxis, RawGrid, ReportKind, Table, WideTable,
};
pub use csv::{CsvHelper, CsvLineData};
pub use error::{ReportError, Result};
pub use workbook::{MemoryWorkbook, WorkbookSource};
