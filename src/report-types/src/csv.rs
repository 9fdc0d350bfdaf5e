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

use crate::FactRow;

/// Trait for the data that will be written to the CSV file.
///
/// Provides data for a single line in the CSV file.
pub trait CsvLineData {
    /// Legal entity the report belongs to.
    fn legal_entity(&self) -> Cow<str>;

    /// Section of the account, e.g. "Revenue".
    fn section(&self) -> Cow<str>;

    /// Subsection of the account. Equals the section when the report has no subsections.
    fn subsection(&self) -> Cow<str>;

    /// Account name.
    fn account(&self) -> Cow<str>;

    /// Fields following the hierarchy columns.
    /// Their number must match the value headers given to the `CsvHelper`.
    fn value_fields(&self) -> Vec<Cow<str>>;
}

/// Helper for writing data to the CSV file.
///
/// Provides utility functions like converting data to a single line in the CSV file & generating the header.
pub struct CsvHelper<T: CsvLineData> {
    delimiter: String,
    value_headers: Vec<String>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: CsvLineData> CsvHelper<T> {
    const HEADER_ELEMENTS: [&'static str; 4] = ["Legal Entity", "Section", "Subsection", "Account"];

    /// Create a new `CsvHelper` instance.
    pub fn new(delimiter: String, value_headers: Vec<String>) -> Self {
        Self {
            delimiter,
            value_headers,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Delimiter used in the CSV file.
    fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Discrete elements of the CSV header.
    pub fn csv_header_elements(&self) -> Vec<&str> {
        Self::HEADER_ELEMENTS
            .iter()
            .copied()
            .chain(self.value_headers.iter().map(String::as_str))
            .collect()
    }

    /// Full CSV header, as a single string.
    pub fn csv_header(&self) -> String {
        self.csv_header_elements()
            .into_iter()
            .map(|element| self.escape(element))
            .collect::<Vec<_>>()
            .join(self.delimiter())
    }

    /// Convert the data to the discrete elements of a single line in the CSV file.
    pub fn to_csv_line_elements(&self, data: &T) -> Vec<String> {
        let mut elements = vec![
            data.legal_entity().into_owned(),
            data.section().into_owned(),
            data.subsection().into_owned(),
            data.account().into_owned(),
        ];
        elements.extend(data.value_fields().into_iter().map(Cow::into_owned));

        if elements.len() != Self::HEADER_ELEMENTS.len() + self.value_headers.len() {
            log::warn!(
                "CSV line has {} fields, header has {}: {:?}",
                elements.len(),
                Self::HEADER_ELEMENTS.len() + self.value_headers.len(),
                elements
            );
        }

        elements
    }

    /// Convert the data to a single line in the CSV file.
    pub fn to_csv_line(&self, data: &T) -> String {
        self.to_csv_line_elements(data)
            .iter()
            .map(|element| self.escape(element))
            .collect::<Vec<_>>()
            .join(self.delimiter())
    }

    /// Quote the field if it contains the delimiter, a quote or a line break.
    fn escape<'a>(&self, field: &'a str) -> Cow<'a, str> {
        if field.contains(self.delimiter()) || field.contains(['"', '\n', '\r']) {
            Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(field)
        }
    }
}

impl CsvLineData for FactRow {
    fn legal_entity(&self) -> Cow<str> {
        Cow::Borrowed(FactRow::legal_entity(self))
    }

    fn section(&self) -> Cow<str> {
        Cow::Borrowed(FactRow::section(self))
    }

    fn subsection(&self) -> Cow<str> {
        Cow::Borrowed(FactRow::subsection(self))
    }

    fn account(&self) -> Cow<str> {
        Cow::Borrowed(FactRow::account(self))
    }

    fn value_fields(&self) -> Vec<Cow<str>> {
        vec![
            Cow::Borrowed(self.period_label()),
            Cow::Owned(
                self.period_date()
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Cow::Owned(self.year().map(|year| year.to_string()).unwrap_or_default()),
            Cow::Owned(self.amount().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, HierarchyRow};
    use chrono::NaiveDate;

    fn helper() -> CsvHelper<FactRow> {
        CsvHelper::new(
            ",".to_string(),
            vec![
                "Period".to_string(),
                "Period Date".to_string(),
                "Year".to_string(),
                "Amount".to_string(),
            ],
        )
    }

    #[test]
    fn header_contains_hierarchy_and_value_columns() {
        assert_eq!(
            helper().csv_header(),
            "Legal Entity,Section,Subsection,Account,Period,Period Date,Year,Amount"
        );
    }

    #[test]
    fn fact_line_is_rendered() {
        let row = HierarchyRow::new("Revenue", "Revenue", "Sales, Product A", vec![Cell::Empty]);
        let fact = FactRow::new(
            "42",
            &row,
            "Jan 2025".to_string(),
            NaiveDate::from_ymd_opt(2025, 1, 1),
            100.5,
        );

        assert_eq!(
            helper().to_csv_line(&fact),
            "42,Revenue,Revenue,\"Sales, Product A\",Jan 2025,2025-01-01,2025,100.5"
        );
    }

    #[test]
    fn missing_date_is_an_empty_field() {
        let row = HierarchyRow::new("Assets", "Bank", "Cash", vec![]);
        let fact = FactRow::new("7", &row, "Unnamed: 4".to_string(), None, -3.0);

        assert_eq!(
            helper().to_csv_line_elements(&fact),
            vec!["7", "Assets", "Bank", "Cash", "Unnamed: 4", "", "", "-3"]
        );
    }
}
