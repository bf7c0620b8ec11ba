//! IO utilities for loading raw record tables.

pub mod table_reader;

pub use table_reader::{load, read_table, read_table_from_reader, DataSource};
