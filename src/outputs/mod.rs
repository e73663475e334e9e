//! Output generation for a run.
//!
//! # Submodules
//!
//! - [`workbook`]: Writes extracted records to the spreadsheet
//! - [`summary`]: Writes the machine-readable run summary
//!
//! # Output Structure
//!
//! ```text
//! output/
//! ├── news_data.xlsx
//! ├── run_summary.json
//! └── images/
//!     ├── IMG_20240718_153012123456.jpg
//!     └── ...
//! ```

pub mod summary;
pub mod workbook;
