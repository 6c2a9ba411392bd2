//! Schema-less row representation shared by both decoders.

use serde_json::{Map, Value};

/// One decoded record: column name to value, in column order.
///
/// Values pass through untyped; nothing here inspects or coerces them.
pub type Row = Map<String, Value>;

/// Rows from one decode pass of one file, in the decoder's order.
pub type RowSet = Vec<Row>;
