//! Boundary codecs. The engine never touches files; these modules turn
//! files into `Table`s and results back into files.

pub mod csv;
pub mod report;
pub mod workbook;
