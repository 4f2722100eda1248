//! CSV report infrastructure.
//!
//! A report is a serde-serializable row type registered with `define_report!`. Each
//! registered type gets its own CSV file `<directory>/<prefix><short_name>.csv`; rows are
//! written with `send_report`. Reporting never stops a simulation: write failures are
//! returned to the caller, which logs them, and counted.
use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::trace;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::MalariaError;
use crate::{HashMap, HashMapExt};

pub trait Report: 'static {
    fn type_id(&self) -> TypeId;
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), csv::Error>;
}

/// Implements `Report` for a `Serialize` row type.
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::csv::Error> {
                writer.serialize(self)
            }
        }
    };
}
pub use define_report;

/// Where report files go and whether existing files may be replaced.
#[derive(Clone, Debug)]
pub struct ConfigReportOptions {
    pub file_prefix: String,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl ConfigReportOptions {
    #[must_use]
    pub fn new() -> Self {
        ConfigReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }

    /// Prepended to every report file name.
    pub fn file_prefix(&mut self, file_prefix: String) -> &mut ConfigReportOptions {
        self.file_prefix = file_prefix;
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut ConfigReportOptions {
        self.output_dir = directory;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut ConfigReportOptions {
        self.overwrite = overwrite;
        self
    }
}

impl Default for ConfigReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
    config: ConfigReportOptions,
    write_failures: Cell<usize>,
}

define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::new()),
        config: ConfigReportOptions::new(),
        write_failures: Cell::new(0),
    }
);

fn create_report_file(path: &Path, overwrite: bool) -> Result<File, MalariaError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    if path.exists() && !overwrite {
        return Err(MalariaError::ReportError(format!(
            "{} already exists; pass --force-overwrite to replace it",
            path.display()
        )));
    }
    Ok(File::create(path)?)
}

pub trait ContextReportExt {
    /// Creates the CSV file for report type `T` and writes its header on the first row.
    ///
    /// # Errors
    ///
    /// `ReportError` if the file exists and overwriting is off; `IoError` if it cannot be
    /// created.
    fn add_report<T: Report>(&mut self, short_name: &str) -> Result<(), MalariaError>;

    /// Appends one row to the file of report type `T` and flushes it.
    ///
    /// # Errors
    ///
    /// `ReportError` if `T` was never added; `CsvError` or `IoError` if the write fails.
    /// Failures are also counted in `report_write_failures`.
    fn send_report<T: Report>(&self, report: T) -> Result<(), MalariaError>;

    /// Options used by subsequent calls to `add_report`.
    fn report_options(&mut self) -> &mut ConfigReportOptions;

    /// Number of rows that could not be written.
    fn report_write_failures(&self) -> usize;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, short_name: &str) -> Result<(), MalariaError> {
        let data_container = self.get_data_mut(ReportPlugin);
        let config = &data_container.config;
        let path = config
            .output_dir
            .join(format!("{}{short_name}.csv", config.file_prefix));
        let file = create_report_file(&path, config.overwrite)?;
        trace!("writing {short_name} report to {}", path.display());
        data_container
            .file_writers
            .get_mut()
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    fn send_report<T: Report>(&self, report: T) -> Result<(), MalariaError> {
        let Some(data_container) = self.try_get_data(ReportPlugin) else {
            return Err(MalariaError::ReportError(
                "no report has been added".to_string(),
            ));
        };
        let result = {
            let mut writers = data_container.file_writers.borrow_mut();
            match writers.get_mut(&report.type_id()) {
                None => Err(MalariaError::ReportError(format!(
                    "no writer found for report type {}",
                    std::any::type_name::<T>()
                ))),
                Some(writer) => report
                    .serialize(writer)
                    .map_err(MalariaError::from)
                    .and_then(|()| writer.flush().map_err(MalariaError::from)),
            }
        };
        if result.is_err() {
            data_container
                .write_failures
                .set(data_container.write_failures.get() + 1);
        }
        result
    }

    fn report_options(&mut self) -> &mut ConfigReportOptions {
        &mut self.get_data_mut(ReportPlugin).config
    }

    fn report_write_failures(&self) -> usize {
        self.try_get_data(ReportPlugin)
            .map_or(0, |data| data.write_failures.get())
    }
}
