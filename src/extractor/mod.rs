pub mod concatenator;
pub mod report;
pub mod table_writer;

pub use concatenator::{ConcatenatedTable, SourceTable, TableConcatenator, SOURCE_TABLE_FIELD};
pub use report::{RunMode, RunReport, ScanProgress, TableSummary};
pub use table_writer::{TableWriter, WrittenTable, ROW_ID_FIELD};
