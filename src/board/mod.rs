mod columns;

pub use columns::{ColumnSequence, Direction};
