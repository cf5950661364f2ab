use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    storage::{
        page::{Cell, LeafPage},
        schema::{TableColumn, TableSchema},
    },
    types::{
        PageId,
        error::{DatabaseError, Result},
        value::{Value, decode_value, encode_value},
    },
};

/// One logical row: primary-key columns and non-key columns, keyed by
/// column name. Column *order* is not carried here; it comes from the
/// table schema at encode/decode time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key_cols: HashMap<String, Value>,
    pub value_cols: HashMap<String, Value>,
}

/// The two opaque blobs a row becomes on disk. The application layer
/// decodes them against a schema as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub val: Vec<u8>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: impl Into<String>, value: Value) -> Self {
        self.key_cols.insert(name.into(), value);
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.value_cols.insert(name.into(), value);
        self
    }

    /// Serialize this row against the schema's column order. The key blob
    /// holds one object per primary-key column, the value blob one per
    /// non-key column, in schema order.
    pub fn encode(&self, schema: &TableSchema) -> Result<KeyValue> {
        Ok(KeyValue {
            key: cols_to_bytes(&schema.primary_key, &self.key_cols)?,
            val: cols_to_bytes(&schema.columns, &self.value_cols)?,
        })
    }

    /// Reverse of [`Row::encode`]. Both blobs must be consumed exactly:
    /// short input is `Truncated`, leftover bytes are `Garbage`.
    pub fn decode(schema: &TableSchema, kv: &KeyValue) -> Result<Row> {
        Ok(Row {
            key_cols: bytes_to_cols(&schema.primary_key, &kv.key)?,
            value_cols: bytes_to_cols(&schema.columns, &kv.val)?,
        })
    }
}

fn cols_to_bytes(order: &[TableColumn], cols: &HashMap<String, Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for col in order {
        let value = cols
            .get(&col.name)
            .ok_or_else(|| DatabaseError::MissingColumn(col.name.clone()))?;
        encode_value(&mut buf, value)?;
    }
    Ok(buf)
}

fn bytes_to_cols(order: &[TableColumn], bytes: &[u8]) -> Result<HashMap<String, Value>> {
    let mut input = bytes;
    let mut cols = HashMap::with_capacity(order.len());
    for col in order {
        let value = decode_value(&mut input, &col.name, col.data_type)?;
        cols.insert(col.name.clone(), value);
    }
    if !input.is_empty() {
        return Err(DatabaseError::Garbage { len: input.len() });
    }
    Ok(cols)
}

/// Build a single leaf page from rows, laid out as alternating key/value
/// cells `[k0, v0, k1, v1, ...]`. Fails with `PageOverflow` when the rows
/// do not fit.
pub fn encode_rows(schema: &TableSchema, rows: &[Row], page_size: usize) -> Result<LeafPage> {
    let mut cells = Vec::with_capacity(2 * rows.len());
    for row in rows {
        let kv = row.encode(schema)?;
        cells.push(Cell::new(kv.key));
        cells.push(Cell::new(kv.val));
    }
    LeafPage::from_cells(cells, page_size)
}

/// Decode every row stored on a leaf page. Cells pair up as key then
/// value, so the cell count must be even.
pub fn decode_rows(schema: &TableSchema, page: &LeafPage, page_id: PageId) -> Result<Vec<Row>> {
    if page.num_cells % 2 != 0 {
        return Err(DatabaseError::PageCorruption {
            page_id,
            what: "row page cell count must be even".to_string(),
            expected: u64::from(page.num_cells & !1),
            got: u64::from(page.num_cells),
        });
    }
    let mut rows = Vec::with_capacity(page.cells.len() / 2);
    for pair in page.cells.chunks_exact(2) {
        let kv = KeyValue {
            key: pair[0].payload_initial.clone(),
            val: pair[1].payload_initial.clone(),
        };
        rows.push(Row::decode(schema, &kv)?);
    }
    Ok(rows)
}
