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

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use report_types::{CsvHelper, CsvLineData, FactRow, HierarchyRow, LongTable, Table, WideTable};

/// Row of a wide table, together with the legal entity of its table.
struct WideLine<'a> {
    legal_entity: &'a str,
    row: &'a HierarchyRow,
}

impl CsvLineData for WideLine<'_> {
    fn legal_entity(&self) -> Cow<str> {
        Cow::Borrowed(self.legal_entity)
    }

    fn section(&self) -> Cow<str> {
        Cow::Borrowed(self.row.section())
    }

    fn subsection(&self) -> Cow<str> {
        Cow::Borrowed(self.row.subsection())
    }

    fn account(&self) -> Cow<str> {
        Cow::Borrowed(self.row.account())
    }

    fn value_fields(&self) -> Vec<Cow<str>> {
        self.row
            .values()
            .iter()
            .map(|cell| Cow::Owned(cell.to_string()))
            .collect()
    }
}

fn render_wide(table: &WideTable, delimiter: &str) -> Vec<String> {
    let helper = CsvHelper::<WideLine>::new(delimiter.to_string(), table.columns.clone());

    std::iter::once(helper.csv_header())
        .chain(table.rows.iter().map(|row| {
            helper.to_csv_line(&WideLine {
                legal_entity: &table.legal_entity,
                row,
            })
        }))
        .collect()
}

fn render_long(table: &LongTable, delimiter: &str) -> Vec<String> {
    let headers = [
        table.axis.label_header(),
        table.axis.date_header(),
        "Year",
        table.axis.amount_header(),
    ];
    let helper = CsvHelper::<FactRow>::new(
        delimiter.to_string(),
        headers.iter().map(|header| header.to_string()).collect(),
    );

    std::iter::once(helper.csv_header())
        .chain(table.rows.iter().map(|fact| helper.to_csv_line(fact)))
        .collect()
}

/// Render the table as delimited text lines, header first.
pub fn render(table: &Table, delimiter: &str) -> Vec<String> {
    match table {
        Table::Wide(table) => render_wide(table, delimiter),
        Table::Long(table) => render_long(table, delimiter),
    }
}

/// Write the table to `<output_dir>/<report kind>.csv` and return the file path.
pub fn write_table(table: &Table, output_dir: &Path, delimiter: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.csv", table.kind()));

    let mut writer = BufWriter::new(File::create(&path)?);
    for line in render(table, delimiter) {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    log::info!("Wrote {} records to {}", table.len(), path.display());

    Ok(path)
}
