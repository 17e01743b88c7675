//! I/O module
//!
//! Handles report output.
//!
//! # Components
//!
//! - `csv_format` - CSV export of table rows

pub mod csv_format;

pub use csv_format::write_rows_csv;
