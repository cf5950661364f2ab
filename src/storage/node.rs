use std::collections::HashMap;

use crate::{
    storage::{page::LeafPage, pager::Pager, schema::TableSchema},
    types::{
        error::{DatabaseError, Result},
        row::{Row, decode_rows, encode_rows},
        value::DataType,
    },
};

/// One user table held in memory: its schema, a name-to-type map for
/// validation, and the rows destined for its root leaf page. Inserts only
/// touch memory; [`persist`](TableNode::persist) turns the rows into a
/// page image and hands it to the pager.
pub struct TableNode {
    pub schema: TableSchema,
    column_types: HashMap<String, DataType>,
    rows: Vec<Row>,
}

impl TableNode {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            column_types: schema.column_types(),
            schema,
            rows: Vec::new(),
        }
    }

    /// Rebuild a node from its on-disk root page.
    pub fn load(schema: TableSchema, pager: &mut Pager) -> Result<Self> {
        let mut handle = pager.request(schema.root_page_id)?;
        let rows = decode_rows(&schema, &handle.page, handle.id)?;
        pager.release(&mut handle);

        Ok(Self {
            column_types: schema.column_types(),
            schema,
            rows,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Append a row after checking it against the schema: every provided
    /// column must exist with a conforming value, and every declared
    /// column must be provided. Rows are not sorted or persisted here.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        for (name, value) in row.key_cols.iter().chain(row.value_cols.iter()) {
            let declared =
                self.column_types
                    .get(name)
                    .ok_or_else(|| DatabaseError::ColumnNotFound {
                        name: name.clone(),
                        table: self.schema.name.clone(),
                    })?;
            if !value.conforms_to(*declared) {
                return Err(DatabaseError::TypeMismatch {
                    column: name.clone(),
                    expected: declared.to_string(),
                    got: value.data_type().to_string(),
                });
            }
        }
        for col in &self.schema.primary_key {
            if !row.key_cols.contains_key(&col.name) {
                return Err(DatabaseError::MissingColumn(col.name.clone()));
            }
        }
        for col in &self.schema.columns {
            if !row.value_cols.contains_key(&col.name) {
                return Err(DatabaseError::MissingColumn(col.name.clone()));
            }
        }

        self.rows.push(row);
        Ok(())
    }

    /// Encode all rows as this table's single leaf page. `PageOverflow`
    /// when they no longer fit.
    pub fn encode_page(&self, page_size: usize) -> Result<LeafPage> {
        encode_rows(&self.schema, &self.rows, page_size)
    }

    /// Write the table's page at its root. Encoding happens before any
    /// byte reaches the file, so a failed encode leaves the on-disk page
    /// as it was.
    pub fn persist(&self, pager: &mut Pager) -> Result<()> {
        let page = self.encode_page(pager.page_size())?;
        pager.write_page(self.schema.root_page_id, &page)
    }
}
