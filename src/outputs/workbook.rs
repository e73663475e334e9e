//! Spreadsheet output.
//!
//! Records go to a single named sheet under a fixed header row:
//!
//! | Title | Description | Date | Image Filename | Search Count | Contains Money |
//! |-------|-------------|------|----------------|--------------|----------------|
//!
//! `Date` holds the date exactly as the site displayed it. Counts are
//! written as numbers and the money flag as a boolean cell.

use crate::error::ScrapeError;
use crate::models::NewsRecord;
use rust_xlsxwriter::{Format, Workbook};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Column headers, in order.
pub const HEADERS: [&str; 6] = [
    "Title",
    "Description",
    "Date",
    "Image Filename",
    "Search Count",
    "Contains Money",
];

/// An open workbook with one sheet that rows are appended to.
pub struct WorkbookWriter {
    workbook: Workbook,
    path: PathBuf,
    next_row: u32,
}

impl WorkbookWriter {
    /// Create a workbook bound for `path` with a sheet named `sheet` and
    /// the header row already written.
    pub fn create(path: impl Into<PathBuf>, sheet: &str) -> Result<Self, ScrapeError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet)?;
        for (col, header) in (0u16..).zip(HEADERS) {
            worksheet.write_string_with_format(0, col, header, &bold)?;
        }
        Ok(Self {
            workbook,
            path: path.into(),
            next_row: 1,
        })
    }

    /// Rows written so far, excluding the header.
    pub fn rows(&self) -> u32 {
        self.next_row - 1
    }

    /// Append `records` below the rows already written.
    pub fn append_rows(&mut self, records: &[NewsRecord]) -> Result<(), ScrapeError> {
        let worksheet = self.workbook.worksheet_from_index(0)?;
        for record in records {
            let row = self.next_row;
            worksheet.write_string(row, 0, &record.title)?;
            worksheet.write_string(row, 1, &record.description)?;
            worksheet.write_string(row, 2, &record.raw_date)?;
            worksheet.write_string(row, 3, &record.image_filename)?;
            worksheet.write_number(row, 4, record.search_count as f64)?;
            worksheet.write_boolean(row, 5, record.contains_money)?;
            self.next_row += 1;
        }
        Ok(())
    }

    /// Write the workbook to disk and release it.
    #[instrument(level = "info", skip(self), fields(path = %self.path.display(), rows = self.rows()))]
    pub fn save(mut self) -> Result<PathBuf, ScrapeError> {
        self.workbook.save(&self.path)?;
        info!("Workbook saved");
        Ok(self.path)
    }
}
