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

//! Runs several report transformations against one workbook.
//!
//! Every report is processed on its own: a failing report is recorded in the
//! bundle and the remaining reports still run.

use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use report_types::{ReportKind, Table, WorkbookSource};

use crate::config::Config;
use crate::pipeline::transform;
use crate::xlsx_parser::CalamineWorkbook;

/// Lifecycle of a single report within a bundle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReportStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Succeeded | ReportStatus::Failed)
    }

    fn can_become(&self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (ReportStatus::NotStarted, ReportStatus::Running)
                | (ReportStatus::Running, ReportStatus::Succeeded)
                | (ReportStatus::Running, ReportStatus::Failed)
        )
    }
}

/// Why a report could not be produced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReportFailure {
    pub kind: ReportKind,
    pub message: String,
}

impl Display for ReportFailure {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind.display_name(), self.message)
    }
}

/// State and, once finished, outcome of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    status: ReportStatus,
    outcome: Option<Result<Table, ReportFailure>>,
}

impl ReportEntry {
    fn new() -> Self {
        Self {
            status: ReportStatus::NotStarted,
            outcome: None,
        }
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    /// Outcome of the report, `None` until it is finished.
    pub fn outcome(&self) -> Option<&Result<Table, ReportFailure>> {
        self.outcome.as_ref()
    }

    pub fn table(&self) -> Option<&Table> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().ok())
    }

    pub fn failure(&self) -> Option<&ReportFailure> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }
}

/// Status of the whole bundle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JobStatus {
    InProgress,
    Completed,
}

/// Per-report results of one workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    entries: BTreeMap<ReportKind, ReportEntry>,
}

impl ReportBundle {
    /// Bundle with every given report not started yet.
    pub fn new(kinds: &[ReportKind]) -> Self {
        Self {
            entries: kinds
                .iter()
                .map(|&kind| (kind, ReportEntry::new()))
                .collect(),
        }
    }

    /// Mark the report as running.
    pub fn start(&mut self, kind: ReportKind) -> Result<(), String> {
        self.advance(kind, ReportStatus::Running).map(|_| ())
    }

    /// Record the outcome of a running report. Each outcome is written exactly once.
    pub fn finish(
        &mut self,
        kind: ReportKind,
        outcome: Result<Table, ReportFailure>,
    ) -> Result<(), String> {
        let next = match outcome {
            Ok(_) => ReportStatus::Succeeded,
            Err(_) => ReportStatus::Failed,
        };
        let entry = self.advance(kind, next)?;
        entry.outcome = Some(outcome);
        Ok(())
    }

    fn advance(&mut self, kind: ReportKind, next: ReportStatus) -> Result<&mut ReportEntry, String> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| format!("Report '{}' is not part of this bundle", kind))?;

        if !entry.status.can_become(next) {
            return Err(format!(
                "Report '{}' cannot go from {:?} to {:?}",
                kind, entry.status, next
            ));
        }

        entry.status = next;
        Ok(entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = (ReportKind, &ReportEntry)> {
        self.entries.iter().map(|(kind, entry)| (*kind, entry))
    }

    /// Tables of all succeeded reports.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.entries.values().filter_map(ReportEntry::table)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportFailure> {
        self.entries.values().filter_map(ReportEntry::failure)
    }

    /// `Completed` once every report reached a terminal status.
    pub fn status(&self) -> JobStatus {
        if self.entries.values().all(|entry| entry.status.is_terminal()) {
            JobStatus::Completed
        } else {
            JobStatus::InProgress
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status() == JobStatus::Completed
    }

    /// Summary handed over to the import record.
    ///
    /// The import counts as failed when no report succeeded, or when the bundle
    /// still has unfinished reports.
    pub fn summary(&self) -> ImportSummary {
        let rows_processed = self.tables().map(Table::len).sum();

        if self.status() != JobStatus::Completed {
            let unfinished = self
                .entries
                .iter()
                .filter(|(_, entry)| !entry.status.is_terminal())
                .map(|(kind, _)| kind.display_name())
                .join(", ");
            log::warn!("Summarizing a bundle with unfinished reports: {}", unfinished);

            return ImportSummary {
                status: ImportStatus::Failed,
                rows_processed,
                error_message: Some(format!("Unfinished reports: {}", unfinished)),
            };
        }

        let all_failed = !self.entries.is_empty()
            && self
                .entries
                .values()
                .all(|entry| entry.status == ReportStatus::Failed);

        if all_failed {
            ImportSummary {
                status: ImportStatus::Failed,
                rows_processed,
                error_message: Some(self.failures().join("; ")),
            }
        } else {
            ImportSummary {
                status: ImportStatus::Completed,
                rows_processed,
                error_message: None,
            }
        }
    }
}

/// Kind of import: which reports a workbook is expected to contain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DatasetType {
    ManagementReports,
    BudgetSummary,
}

impl DatasetType {
    pub fn kinds(&self) -> &'static [ReportKind] {
        match self {
            DatasetType::ManagementReports => &[
                ReportKind::ProfitAndLossVsPriorYear,
                ReportKind::ProfitAndLoss,
                ReportKind::BalanceSheet,
                ReportKind::BudgetVariance,
            ],
            DatasetType::BudgetSummary => &[ReportKind::BudgetSummary],
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImportStatus {
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }
}

/// Outcome of an import, as stored by the caller.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImportSummary {
    pub status: ImportStatus,
    pub rows_processed: usize,
    pub error_message: Option<String>,
}

/// Run all report kinds against the workbook at `file_path`, with default configuration.
pub fn process_all(file_path: &str, legal_entity: &str) -> ReportBundle {
    process_reports(
        &ReportKind::ALL,
        file_path,
        legal_entity,
        &Config::default(),
    )
}

/// Run the reports belonging to the dataset type against the workbook at `file_path`.
pub fn process_dataset(
    dataset: DatasetType,
    file_path: &str,
    legal_entity: &str,
    config: &Config,
) -> ReportBundle {
    process_reports(dataset.kinds(), file_path, legal_entity, config)
}

/// Run the given reports against the workbook at `file_path`.
///
/// The workbook is opened once. If it cannot be opened, every report fails with the same message.
pub fn process_reports(
    kinds: &[ReportKind],
    file_path: &str,
    legal_entity: &str,
    config: &Config,
) -> ReportBundle {
    match CalamineWorkbook::open(file_path) {
        Ok(mut workbook) => process_workbook(&mut workbook, kinds, legal_entity, config),
        Err(e) => {
            log::error!("Cannot process workbook '{}': {}", file_path, e);
            fail_all(kinds, &e.to_string())
        }
    }
}

fn fail_all(kinds: &[ReportKind], message: &str) -> ReportBundle {
    let mut bundle = ReportBundle::new(kinds);
    for &kind in kinds {
        let failure = ReportFailure {
            kind,
            message: message.to_string(),
        };
        if let Err(e) = bundle
            .start(kind)
            .and_then(|_| bundle.finish(kind, Err(failure)))
        {
            log::error!("{}", e);
        }
    }
    bundle
}

/// Run the given reports against an open workbook, using each report's configured defaults.
pub fn process_workbook<W: WorkbookSource>(
    workbook: &mut W,
    kinds: &[ReportKind],
    legal_entity: &str,
    config: &Config,
) -> ReportBundle {
    let mut bundle = ReportBundle::new(kinds);

    for &kind in kinds {
        if let Err(e) = bundle.start(kind) {
            log::error!("{}", e);
            continue;
        }

        log::info!("Processing {}", kind.display_name());

        let report = config.report(kind);
        let outcome = transform(
            workbook,
            report,
            legal_entity,
            report.drop_profit_rows,
            report.melt_to_long,
        )
        .map_err(|e| ReportFailure {
            kind,
            message: e.to_string(),
        });

        match &outcome {
            Ok(table) => log::info!("{}: {} rows", kind.display_name(), table.len()),
            Err(failure) => log::warn!("{} failed: {}", kind.display_name(), failure.message),
        }

        if let Err(e) = bundle.finish(kind, outcome) {
            log::error!("{}", e);
        }
    }

    bundle
}
