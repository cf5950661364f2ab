use rashdb::{
    DatabaseError,
    storage::{
        page::{Cell, LeafPage},
        schema::{TableColumn, TableSchema},
    },
    types::{
        row::{Row, decode_rows, encode_rows},
        value::{DataType, Value},
    },
};

fn events_schema() -> TableSchema {
    TableSchema::new(
        "events",
        2,
        vec![TableColumn::new("id", DataType::Int)],
        vec![
            TableColumn::new("title", DataType::Str),
            TableColumn::new("body", DataType::Text),
            TableColumn::new("score", DataType::Real),
            TableColumn::new("payload", DataType::Blob),
            TableColumn::new("tags", DataType::JsonArray),
            TableColumn::new("attrs", DataType::JsonObject),
        ],
    )
    .unwrap()
}

fn sample_row() -> Row {
    Row::new()
        .key("id", Value::Int(42))
        .value("title", Value::Str("deploy".to_string()))
        .value("body", Value::Text("rolled out to prod".to_string()))
        .value("score", Value::Real(0.75))
        .value("payload", Value::Blob(vec![0xde, 0xad, 0xbe, 0xef]))
        .value(
            "tags",
            Value::Array(vec![
                Value::Str("infra".to_string()),
                Value::Str("urgent".to_string()),
            ]),
        )
        .value(
            "attrs",
            Value::Object(vec![
                ("region".to_string(), Value::Str("us-east".to_string())),
                ("retries".to_string(), Value::Int(3)),
            ]),
        )
}

#[test]
fn test_roundtrip() {
    let schema = events_schema();
    let row = sample_row();

    let kv = row.encode(&schema).unwrap();
    let decoded = Row::decode(&schema, &kv).unwrap();
    assert_eq!(decoded, row);
}

#[test]
fn test_null_is_accepted_for_any_column() {
    let schema = events_schema();
    let mut row = sample_row();
    row.value_cols.insert("score".to_string(), Value::Null);

    let kv = row.encode(&schema).unwrap();
    let decoded = Row::decode(&schema, &kv).unwrap();
    assert_eq!(decoded.value_cols["score"], Value::Null);
}

#[test]
fn test_missing_column_on_encode() {
    let schema = events_schema();
    let mut row = sample_row();
    row.value_cols.remove("score");

    let result = row.encode(&schema);
    assert!(
        matches!(result, Err(DatabaseError::MissingColumn(name)) if name == "score"),
        "missing column should be named"
    );
}

#[test]
fn test_truncated_value_stream() {
    let schema = events_schema();
    let mut kv = sample_row().encode(&schema).unwrap();
    kv.val.truncate(kv.val.len() - 3);

    assert!(matches!(
        Row::decode(&schema, &kv),
        Err(DatabaseError::Truncated { .. })
    ));
}

#[test]
fn test_garbage_after_values() {
    let schema = events_schema();
    let mut kv = sample_row().encode(&schema).unwrap();
    kv.val.extend_from_slice(&[0x00, 0x01]);

    assert!(matches!(
        Row::decode(&schema, &kv),
        Err(DatabaseError::Garbage { len: 2 })
    ));
}

#[test]
fn test_type_mismatch_on_decode() {
    let schema = events_schema();
    // Encoding does not type-check, so an Int where "title" expects a
    // string makes it into the bytes and must be caught on the way out
    let mut row = sample_row();
    row.value_cols.insert("title".to_string(), Value::Int(9));

    let kv = row.encode(&schema).unwrap();
    let result = Row::decode(&schema, &kv);
    assert!(
        matches!(result, Err(DatabaseError::TypeMismatch { column, .. }) if column == "title")
    );
}

#[test]
fn test_multi_column_primary_key_order() {
    let schema = TableSchema::new(
        "metrics",
        2,
        vec![
            TableColumn::new("host", DataType::Str),
            TableColumn::new("minute", DataType::Int),
        ],
        vec![TableColumn::new("value", DataType::Real)],
    )
    .unwrap();

    let row = Row::new()
        .key("host", Value::Str("db-1".to_string()))
        .key("minute", Value::Int(1695885687))
        .value("value", Value::Real(3.5));

    let kv = row.encode(&schema).unwrap();
    assert_eq!(Row::decode(&schema, &kv).unwrap(), row);
}

#[test]
fn test_page_rows_roundtrip() {
    let schema = events_schema();
    let rows: Vec<Row> = (0..5)
        .map(|i| {
            let mut row = sample_row();
            row.key_cols.insert("id".to_string(), Value::Int(i));
            row
        })
        .collect();

    let page = encode_rows(&schema, &rows, 4096).unwrap();
    assert_eq!(page.num_cells, 10);

    let decoded = decode_rows(&schema, &page, 2).unwrap();
    assert_eq!(decoded, rows);
}

#[test]
fn test_odd_cell_count_is_corruption() {
    let schema = events_schema();
    let page = LeafPage::from_cells(vec![Cell::new(vec![0xc0])], 4096).unwrap();

    assert!(matches!(
        decode_rows(&schema, &page, 2),
        Err(DatabaseError::PageCorruption { page_id: 2, .. })
    ));
}

#[test]
fn test_rows_overflow_page() {
    let schema = events_schema();
    let mut row = sample_row();
    row.value_cols
        .insert("payload".to_string(), Value::Blob(vec![7u8; 5000]));

    assert!(matches!(
        encode_rows(&schema, &[row], 4096),
        Err(DatabaseError::PageOverflow { .. })
    ));
}
