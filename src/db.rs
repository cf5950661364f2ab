use std::{
    fs::OpenOptions,
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    storage::{
        DB_HEADER_SIZE, DB_VERSION,
        header::{Header, validate_page_size},
        node::TableNode,
        page::LeafPage,
        pager::Pager,
        schema::{SCHEMA_TABLE_NAME, TableColumn, TableSchema},
    },
    types::{
        DEFAULT_PAGE_SIZE, PageId, SCHEMA_PAGE_ID,
        error::{DatabaseError, Result},
        row::{Row, encode_rows},
    },
};

/// A single-file database: the 128-byte header, the schema page at page 1,
/// and one leaf page per user table. Tables are kept in creation order so
/// the schema page is rewritten deterministically.
pub struct Database {
    path: PathBuf,
    header: Header,
    pager: Pager,
    tables: Vec<TableNode>,
}

impl Database {
    /// Open the database at `path`, creating it with the default page size
    /// if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_page_size(path, DEFAULT_PAGE_SIZE as u16)
    }

    /// Like [`Database::open`], but new files are created with the given
    /// page size. An existing file keeps the page size in its header.
    pub fn open_with_page_size<P: AsRef<Path>>(path: P, page_size: u16) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open_existing(path)
        } else {
            Self::create_new(path, page_size)
        }
    }

    fn create_new(path: &Path, page_size: u16) -> Result<Self> {
        validate_page_size(page_size)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let header = Header {
            page_size,
            ..Header::default()
        };
        file.write_all(&header.to_bytes()?)?;

        let mut pager = Pager::new(file, usize::from(page_size))?;
        pager.write_page(SCHEMA_PAGE_ID, &LeafPage::empty())?;
        pager.sync()?;
        tracing::debug!(path = %path.display(), page_size, "database created");

        Ok(Self {
            path: path.to_path_buf(),
            header,
            pager,
            tables: Vec::new(),
        })
    }

    fn open_existing(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut header_buf = vec![0u8; DB_HEADER_SIZE];
        file.read_exact(&mut header_buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                DatabaseError::Truncated {
                    what: "database header".to_string(),
                }
            } else {
                DatabaseError::Io(e)
            }
        })?;
        let header = Header::from_bytes(&header_buf)?;
        if header.version > DB_VERSION {
            return Err(DatabaseError::InvalidDatabase {
                reason: format!("unsupported format version: {}", header.version),
            });
        }

        let mut pager = Pager::new(file, usize::from(header.page_size))?;

        // Bootstrap: page 1 describes every user table in the meta-table's
        // own row format, then each table's data page is loaded through
        // the ordinary read path.
        let mut schema_handle = pager.request(SCHEMA_PAGE_ID)?;
        let schemas = TableSchema::decode_from_page(&schema_handle.page)?;
        pager.release(&mut schema_handle);

        let mut tables = Vec::with_capacity(schemas.len());
        for schema in schemas {
            tables.push(TableNode::load(schema, &mut pager)?);
        }
        tracing::debug!(path = %path.display(), tables = tables.len(), "database opened");

        Ok(Self {
            path: path.to_path_buf(),
            header,
            pager,
            tables,
        })
    }

    /// Declare a new table and return its root page id. The id is
    /// allocated immediately; nothing reaches disk until
    /// [`Database::sync_all`].
    pub fn create_table(
        &mut self,
        name: impl Into<String>,
        primary_key: Vec<TableColumn>,
        columns: Vec<TableColumn>,
    ) -> Result<PageId> {
        let name = name.into();
        if name == SCHEMA_TABLE_NAME {
            return Err(DatabaseError::InvalidSchema {
                table: name,
                reason: "the schema table name is reserved".to_string(),
            });
        }
        if self.find_table(&name).is_some() {
            return Err(DatabaseError::TableAlreadyExists(name));
        }

        let root_page_id = self.pager.allocate();
        let schema = TableSchema::new(name, root_page_id, primary_key, columns)?;
        self.tables.push(TableNode::new(schema));
        Ok(root_page_id)
    }

    /// Append a row to a table's in-memory page.
    pub fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        let node = self
            .tables
            .iter_mut()
            .find(|node| node.schema.name == table)
            .ok_or_else(|| DatabaseError::UnknownTable(table.to_string()))?;
        node.insert(row)
    }

    /// The in-memory image of a table's rows.
    pub fn rows(&self, table: &str) -> Result<&[Row]> {
        self.find_table(table)
            .map(TableNode::rows)
            .ok_or_else(|| DatabaseError::UnknownTable(table.to_string()))
    }

    pub fn schema(&self, table: &str) -> Result<&TableSchema> {
        self.find_table(table)
            .map(|node| &node.schema)
            .ok_or_else(|| DatabaseError::UnknownTable(table.to_string()))
    }

    /// Table names in creation order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .map(|node| node.schema.name.as_str())
            .collect()
    }

    /// Persist everything: data pages first, then the schema page, then
    /// fsync. The ordering guarantees a schema row never points at a data
    /// page that was not written.
    pub fn sync_all(&mut self) -> Result<()> {
        for node in &self.tables {
            node.persist(&mut self.pager)?;
        }

        let meta = TableSchema::meta();
        let schema_rows = TableSchema::encode_as_rows(self.tables.iter().map(|node| &node.schema));
        let schema_page = encode_rows(&meta, &schema_rows, self.pager.page_size())?;
        self.pager.write_page(SCHEMA_PAGE_ID, &schema_page)?;

        self.pager.sync()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn find_table(&self, name: &str) -> Option<&TableNode> {
        self.tables.iter().find(|node| node.schema.name == name)
    }
}
