use std::fs::{File, OpenOptions};

use rashdb::{
    DatabaseError,
    storage::{
        header::Header,
        page::{Cell, LeafPage},
        pager::Pager,
    },
};
use tempfile::TempDir;

const PAGE_SIZE: usize = 4096;

/// A file holding a default header and an empty schema page, the smallest
/// valid database image.
fn new_db_file(dir: &TempDir, name: &str) -> File {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(dir.path().join(name))
        .unwrap();

    use std::io::Write;
    file.write_all(&Header::default().to_bytes().unwrap())
        .unwrap();

    let mut pager = Pager::new(file.try_clone().unwrap(), PAGE_SIZE).unwrap();
    pager.write_page(1, &LeafPage::empty()).unwrap();
    file
}

#[test]
fn test_request_null_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut pager = Pager::new(new_db_file(&dir, "a.db"), PAGE_SIZE).unwrap();

    assert!(matches!(
        pager.request(0),
        Err(DatabaseError::NullPage)
    ));
}

#[test]
fn test_request_release_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut pager = Pager::new(new_db_file(&dir, "a.db"), PAGE_SIZE).unwrap();

    let mut handle = pager.request(1).unwrap();
    assert_eq!(handle.id, 1);
    assert!(!handle.is_released());
    assert!(pager.is_borrowed(1));

    pager.release(&mut handle);
    assert!(handle.is_released());
    assert!(!pager.is_borrowed(1));

    // Double release is a no-op
    pager.release(&mut handle);
    assert!(handle.is_released());
}

#[test]
fn test_write_releases_handle() {
    let dir = tempfile::tempdir().unwrap();
    let mut pager = Pager::new(new_db_file(&dir, "a.db"), PAGE_SIZE).unwrap();

    let mut handle = pager.request(1).unwrap();
    handle.page = LeafPage::from_cells(vec![Cell::new(b"k".to_vec())], PAGE_SIZE).unwrap();
    pager.write(&mut handle).unwrap();
    assert!(handle.is_released());
    assert!(!pager.is_borrowed(1));

    // Writing through a released handle is an error
    assert!(matches!(
        pager.write(&mut handle),
        Err(DatabaseError::HandleReleased { page_id: 1 })
    ));

    let reread = pager.request(1).unwrap();
    assert_eq!(reread.page.cells[0].payload_initial, b"k".to_vec());
}

#[test]
fn test_request_past_end_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut pager = Pager::new(new_db_file(&dir, "a.db"), PAGE_SIZE).unwrap();

    assert!(matches!(
        pager.request(2),
        Err(DatabaseError::Truncated { .. })
    ));
}

#[test]
fn test_allocate_starts_past_schema_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut pager = Pager::new(new_db_file(&dir, "a.db"), PAGE_SIZE).unwrap();

    assert_eq!(pager.allocate(), 2);
    assert_eq!(pager.allocate(), 3);
}

#[test]
fn test_allocate_resumes_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = new_db_file(&dir, "a.db");

    {
        let mut pager = Pager::new(file.try_clone().unwrap(), PAGE_SIZE).unwrap();
        let id = pager.allocate();
        pager.write_page(id, &LeafPage::empty()).unwrap();
        let id = pager.allocate();
        pager.write_page(id, &LeafPage::empty()).unwrap();
    }

    // Three pages on disk now; a fresh pager must not hand out any of them
    let mut pager = Pager::new(file, PAGE_SIZE).unwrap();
    assert_eq!(pager.allocate(), 4);
}

#[test]
fn test_write_page_grows_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = new_db_file(&dir, "a.db");
    let mut pager = Pager::new(file.try_clone().unwrap(), PAGE_SIZE).unwrap();

    let id = pager.allocate();
    pager.write_page(id, &LeafPage::empty()).unwrap();
    pager.sync().unwrap();

    assert_eq!(file.metadata().unwrap().len(), (128 + 2 * PAGE_SIZE) as u64);
}

#[test]
fn test_page_offsets_leave_room_for_header() {
    let dir = tempfile::tempdir().unwrap();
    let file = new_db_file(&dir, "a.db");
    let mut pager = Pager::new(file.try_clone().unwrap(), PAGE_SIZE).unwrap();

    let page = LeafPage::from_cells(vec![Cell::new(b"first".to_vec())], PAGE_SIZE).unwrap();
    pager.write_page(1, &page).unwrap();

    let bytes = std::fs::read(dir.path().join("a.db")).unwrap();
    // The header region is untouched and page 1 begins right after it
    assert_eq!(&bytes[0..16], b"rashdb format A\0");
    assert_eq!(bytes[128], 0x01);
}
