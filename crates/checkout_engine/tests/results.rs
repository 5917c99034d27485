mod common;

use std::fs;
use std::sync::Arc;

use checkout_core::{RemoteError, WorkItem};
use checkout_engine::{
    render_results_csv, render_return_file, write_results, BatchScheduler, OutputDir,
    ResultsOptions,
};
use common::{config, work_items, ScriptedRemote};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn finished_items() -> Vec<WorkItem> {
    let remote = Arc::new(
        ScriptedRemote::new().script("BC0001", vec![Err(RemoteError::new(404, "Not Found"))]),
    );
    let scheduler = BatchScheduler::new(remote);
    scheduler.run(work_items(3), &config(3)).await.unwrap();
    scheduler.items()
}

#[tokio::test]
async fn results_table_lists_every_item() {
    let csv = String::from_utf8(render_results_csv(&finished_items().await).unwrap()).unwrap();
    assert_eq!(
        csv,
        "Primary Identifier,Barcode,Status,Message\n\
         user0,BC0000,success,Checked out successfully\n\
         user1,BC0001,error,User or item not found\n\
         user2,BC0002,success,Checked out successfully\n"
    );
}

#[tokio::test]
async fn return_file_holds_successful_barcodes_only() {
    let items = finished_items().await;
    assert_eq!(render_return_file(&items).as_deref(), Some("BC0000\nBC0002"));
    assert_eq!(render_return_file(&work_items(2)), None);
}

#[tokio::test]
async fn write_results_creates_both_files() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path().join("out"));

    let files = write_results(&dir, &finished_items().await, &ResultsOptions::default()).unwrap();

    assert_eq!(files.results_path, temp.path().join("out/checkout_results.csv"));
    assert_eq!(files.returned, 2);
    let return_path = files.return_path.expect("return file");
    assert_eq!(fs::read_to_string(return_path).unwrap(), "BC0000\nBC0002");
}

#[test]
fn write_results_skips_empty_return_file() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());

    let files = write_results(&dir, &work_items(1), &ResultsOptions::default()).unwrap();

    assert_eq!(files.return_path, None);
    assert_eq!(files.returned, 0);
    assert!(!temp.path().join("return_barcodes.txt").exists());
    let csv = fs::read_to_string(files.results_path).unwrap();
    assert!(csv.ends_with("user0,BC0000,pending,\n"));
}
