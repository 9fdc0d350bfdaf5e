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

mod config;
mod filter;
mod frame;
mod orchestrator;
mod output;
mod period;
mod pipeline;
mod reconstruct;
mod reshape;
mod sheet;
mod xlsx_parser;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use report_types::{ReportKind, Table};

use config::Config;
use orchestrator::{DatasetType, ReportBundle, ReportStatus};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum DatasetArg {
    ManagementReports,
    BudgetSummary,
    All,
}

/// Transform exported financial report workbooks into hierarchical tables.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the exported workbook.
    file: String,

    /// Identifier of the legal entity the workbook belongs to.
    #[arg(long)]
    legal_entity: String,

    /// Reports to process, when no single report is requested.
    #[arg(long, value_enum, default_value_t = DatasetArg::All)]
    dataset: DatasetArg,

    /// Process a single report, e.g. `balance_sheet`.
    #[arg(long)]
    report: Option<ReportKind>,

    /// Produce the long format of a single report.
    #[arg(long, requires = "report")]
    long: bool,

    /// Keep "Gross Profit" / "Net Profit" rows of a single report.
    #[arg(long, requires = "report")]
    keep_profit_rows: bool,

    /// TOML file overriding the built-in report configuration.
    #[arg(long)]
    config: Option<String>,

    /// Directory receiving one CSV file per produced report.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::new(path)?,
        None => Config::default(),
    };

    if let Some(kind) = args.report {
        let table = pipeline::transform_file(
            &args.file,
            kind,
            &config,
            &args.legal_entity,
            !args.keep_profit_rows,
            args.long,
        )?;
        log::info!("{}: {} rows", kind.display_name(), table.len());
        emit(&table, &args)?;
        return Ok(());
    }

    let bundle = match args.dataset {
        DatasetArg::ManagementReports => orchestrator::process_dataset(
            DatasetType::ManagementReports,
            &args.file,
            &args.legal_entity,
            &config,
        ),
        DatasetArg::BudgetSummary => orchestrator::process_dataset(
            DatasetType::BudgetSummary,
            &args.file,
            &args.legal_entity,
            &config,
        ),
        DatasetArg::All => orchestrator::process_reports(
            &ReportKind::ALL,
            &args.file,
            &args.legal_entity,
            &config,
        ),
    };

    if !bundle.is_completed() {
        log::error!("Not every report of '{}' was processed", args.file);
    }

    report(&bundle, &args)?;

    let summary = bundle.summary();
    println!(
        "Import {}: {} rows processed",
        summary.status.as_str(),
        summary.rows_processed
    );
    if let Some(message) = summary.error_message {
        return Err(message.into());
    }

    Ok(())
}

/// Log the outcome of every report and write the produced tables.
fn report(bundle: &ReportBundle, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    for (kind, entry) in bundle.entries() {
        match (entry.status(), entry.outcome()) {
            (ReportStatus::Succeeded, Some(Ok(table))) => {
                log::info!("{}: {} rows", kind.display_name(), table.len());
                emit(table, args)?;
            }
            (_, Some(Err(failure))) => log::warn!("{}", failure),
            (status, _) => log::warn!("{}: unexpected status {:?}", kind.display_name(), status),
        }
    }

    Ok(())
}

fn emit(table: &Table, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let delimiter = args.delimiter.to_string();

    match &args.output_dir {
        Some(output_dir) => {
            let path = output::write_table(table, output_dir, &delimiter)?;
            println!("{}: {}", table.kind().display_name(), path.display());
        }
        None => {
            println!("{}", table.kind().display_name());
            for line in output::render(table, &delimiter) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
