use virascan_core::upload::UploadedFileMeta;
use virascan_store::{Slot, SqliteBacking, WorkflowStore};

#[test]
fn test_upload_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.db");
    let meta = UploadedFileMeta::new("phage.fna", 14, "text/x-fasta");

    {
        let mut store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
        store.save_upload(&meta, ">phage\nACGTAC").unwrap();
    }

    let store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
    let (loaded, content) = store.load_upload().unwrap();
    assert_eq!(loaded, meta);
    assert_eq!(content, ">phage\nACGTAC");
    assert!(store.load_results().is_none());
}

#[test]
fn test_clear_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.db");
    let meta = UploadedFileMeta::new("a.fa", 6, "text/x-fasta");

    {
        let mut store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
        store.save_upload(&meta, ">a\nAC").unwrap();
        store.clear(Slot::Upload).unwrap();
    }

    let store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
    assert!(!store.has(Slot::Upload));
}

#[test]
fn test_pending_upload_and_clear_all_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.db");
    let meta = UploadedFileMeta::new("a.fa", 6, "text/x-fasta");

    {
        let mut store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
        store.save_upload(&meta, ">a\nAC").unwrap();
    }

    {
        let mut store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
        assert!(store.upload_pending());
        store.clear_all().unwrap();
    }

    let store = WorkflowStore::new(SqliteBacking::open(&path).unwrap());
    assert!(!store.upload_pending());
    assert!(!store.has(Slot::Upload));
    assert!(!store.has(Slot::Results));
}
