use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    storage::page::LeafPage,
    types::{
        PageId, SCHEMA_PAGE_ID,
        error::{DatabaseError, Result},
        row::{Row, decode_rows},
        value::{DataType, Value},
    },
};

pub const SCHEMA_TABLE_NAME: &str = "rashdb_schema";

/// One column: a name and what goes into it. Persisted inside schema rows
/// as the two-element array `[name, type_tag]` so that column order
/// survives the trip to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub data_type: DataType,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Str(self.name.clone()),
            Value::Int(i64::from(self.data_type.as_u8())),
        ])
    }

    fn from_value(table: &str, value: &Value) -> Result<Self> {
        let invalid = |reason: String| DatabaseError::InvalidSchema {
            table: table.to_string(),
            reason,
        };

        let Value::Array(items) = value else {
            return Err(invalid("column entry is not an array".to_string()));
        };
        let [Value::Str(name), Value::Int(tag)] = items.as_slice() else {
            return Err(invalid(format!(
                "column entry must be [name, type_tag], got {} items",
                items.len()
            )));
        };
        let data_type = u8::try_from(*tag)
            .ok()
            .and_then(DataType::from_u8)
            .ok_or_else(|| invalid(format!("unknown column type tag {}", tag)))?;

        Ok(Self {
            name: name.clone(),
            data_type,
        })
    }
}

/// A table's shape: name, root page, and its key/non-key columns in
/// positional order. The row codec walks `primary_key` then `columns` in
/// exactly this order on both the write and read path; that ordering is
/// the only thing linking encoded bytes back to named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub root_page_id: PageId,
    pub primary_key: Vec<TableColumn>,
    pub columns: Vec<TableColumn>,
}

impl TableSchema {
    pub fn new(
        name: impl Into<String>,
        root_page_id: PageId,
        primary_key: Vec<TableColumn>,
        columns: Vec<TableColumn>,
    ) -> Result<Self> {
        let name = name.into();
        if primary_key.is_empty() {
            return Err(DatabaseError::MissingPrimaryKey(name));
        }
        if root_page_id <= SCHEMA_PAGE_ID {
            return Err(DatabaseError::InvalidSchema {
                table: name,
                reason: format!("user table root page id must be >= 2, got {}", root_page_id),
            });
        }
        for key_col in &primary_key {
            if columns.iter().any(|col| col.name == key_col.name) {
                return Err(DatabaseError::InvalidSchema {
                    table: name,
                    reason: format!(
                        "column '{}' appears in both the primary key and the columns",
                        key_col.name
                    ),
                });
            }
        }

        Ok(Self {
            name,
            root_page_id,
            primary_key,
            columns,
        })
    }

    /// The compiled-in schema of the schema table itself. Its root is
    /// always page 1 and it is never persisted; this hard-coded identity
    /// is what terminates the bootstrap recursion.
    pub fn meta() -> Self {
        Self {
            name: SCHEMA_TABLE_NAME.to_string(),
            root_page_id: SCHEMA_PAGE_ID,
            primary_key: vec![TableColumn::new("name", DataType::Str)],
            columns: vec![
                TableColumn::new("root", DataType::Int),
                TableColumn::new("primary_key", DataType::JsonArray),
                TableColumn::new("columns", DataType::JsonArray),
            ],
        }
    }

    /// Column name to declared type, for O(1) validation on insert.
    pub fn column_types(&self) -> HashMap<String, DataType> {
        self.primary_key
            .iter()
            .chain(self.columns.iter())
            .map(|col| (col.name.clone(), col.data_type))
            .collect()
    }

    /// This table's row in the schema table.
    pub fn to_row(&self) -> Row {
        Row::new()
            .key("name", Value::Str(self.name.clone()))
            .value("root", Value::Int(i64::from(self.root_page_id)))
            .value(
                "primary_key",
                Value::Array(self.primary_key.iter().map(TableColumn::to_value).collect()),
            )
            .value(
                "columns",
                Value::Array(self.columns.iter().map(TableColumn::to_value).collect()),
            )
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        let name = match row.key_cols.get("name") {
            Some(Value::Str(name)) => name.clone(),
            _ => {
                return Err(DatabaseError::InvalidSchema {
                    table: SCHEMA_TABLE_NAME.to_string(),
                    reason: "schema row is missing its 'name' key".to_string(),
                });
            }
        };
        let invalid = |reason: String| DatabaseError::InvalidSchema {
            table: name.clone(),
            reason,
        };

        let root_page_id = match row.value_cols.get("root") {
            Some(Value::Int(root)) => PageId::try_from(*root)
                .map_err(|_| invalid(format!("root page id {} out of range", root)))?,
            _ => return Err(invalid("schema row is missing 'root'".to_string())),
        };

        let primary_key = match row.value_cols.get("primary_key") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| TableColumn::from_value(&name, item))
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid("schema row is missing 'primary_key'".to_string())),
        };
        let columns = match row.value_cols.get("columns") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| TableColumn::from_value(&name, item))
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid("schema row is missing 'columns'".to_string())),
        };

        Self::new(name, root_page_id, primary_key, columns)
    }

    /// The schema page rows for a set of tables, one per table, in order.
    pub fn encode_as_rows<'a>(schemas: impl IntoIterator<Item = &'a TableSchema>) -> Vec<Row> {
        schemas.into_iter().map(TableSchema::to_row).collect()
    }

    /// Reconstruct every user table's schema from the schema page. This
    /// runs through the ordinary row codec before any user data is
    /// touched.
    pub fn decode_from_page(page: &LeafPage) -> Result<Vec<TableSchema>> {
        let meta = Self::meta();
        decode_rows(&meta, page, SCHEMA_PAGE_ID)?
            .iter()
            .map(Self::from_row)
            .collect()
    }
}
