use futures_util::StreamExt;
use in_memory_table::InMemoryTable;
use std::sync::Arc;
use tabula_core::{
    completion::CompletionQueue,
    filter::Filter,
    mutation::{
        BulkMutation, CellTimestamp, SingleRowMutation, delete_from_row, set_cell,
    },
    proto::v2::row_range::StartKey,
    row_set::{RowRange, RowSet},
    table::{Table, TableOptions, table_name},
    tonic::Code,
};


fn table(service: &Arc<InMemoryTable>, completion_queue: CompletionQueue) -> Table {
    Table::new(
        service.clone(),
        table_name("p", "i", "users"),
        TableOptions::default(),
        completion_queue,
    )
    .unwrap()
}

fn write(row_key: &str, value: &str) -> SingleRowMutation {
    SingleRowMutation::new(
        row_key.to_string(),
        [set_cell("cf", "col", CellTimestamp::Micros(1_000), value.to_string())],
    )
}

fn seed(service: &InMemoryTable, keys: &[&str]) {
    for key in keys {
        service.insert(key, "cf", "col", key);
    }
}

#[tokio::test(start_paused = true)]
async fn test_apply_then_read_row() {
    let service = Arc::new(InMemoryTable::new());
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    table.async_apply(&cq, write("user#1", "Ada")).await.unwrap();

    let (found, row) = table
        .async_read_row(&cq, "user#1", Filter::default())
        .await
        .unwrap();

    assert!(found);
    assert_eq!(row.key().as_ref(), b"user#1");
    assert_eq!(row.cells().len(), 1);
    assert_eq!(row.cells()[0].value.as_ref(), b"Ada");
}

#[tokio::test(start_paused = true)]
async fn test_read_row_of_missing_key() {
    let service = Arc::new(InMemoryTable::new());
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    let (found, row) = table
        .async_read_row(&cq, "ghost", Filter::default())
        .await
        .unwrap();

    assert!(!found);
    assert_eq!(row.key().as_ref(), b"ghost");
    assert!(row.cells().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_apply_survives_transient_failures() {
    let service = Arc::new(InMemoryTable::new());
    service.fail_next_calls(&[Code::Unavailable, Code::Aborted]);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    table.async_apply(&cq, write("user#1", "Ada")).await.unwrap();

    assert_eq!(service.mutate_row_calls.lock().unwrap().len(), 3);
    assert_eq!(service.value("user#1", "cf", "col").as_deref(), Some("Ada"));
}

#[tokio::test(start_paused = true)]
async fn test_server_timestamp_write_is_not_replayed() {
    let service = Arc::new(InMemoryTable::new());
    service.fail_next_calls(&[Code::Unavailable]);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    let mutation = SingleRowMutation::new(
        "user#1",
        [set_cell("cf", "col", CellTimestamp::ServerAssigned, "Ada")],
    );
    let err = table.async_apply(&cq, mutation).await.unwrap_err();

    assert_eq!(err.code(), Code::Unavailable);
    assert_eq!(service.mutate_row_calls.lock().unwrap().len(), 1);
    assert!(!service.contains_row("user#1"));
}

#[tokio::test(start_paused = true)]
async fn test_bulk_apply_reports_only_permanent_failures() {
    let service = Arc::new(InMemoryTable::new());
    service.fail_entry("b", &[Code::Unavailable]);
    service.fail_entry("c", &[Code::PermissionDenied]);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    let batch: BulkMutation = ["a", "b", "c", "d"]
        .into_iter()
        .map(|key| write(key, key))
        .collect();
    let failures = table.async_bulk_apply(&cq, batch).await.unwrap();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].original_index(), 2);
    assert_eq!(failures[0].status().code(), Code::PermissionDenied);

    let calls = service.mutate_rows_calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].entries.len(), 1);
    assert_eq!(calls[1].entries[0].row_key.as_ref(), b"b");
    drop(calls);

    for key in ["a", "b", "d"] {
        assert!(service.contains_row(key), "row {key} was not written");
    }
    assert!(!service.contains_row("c"));
}

#[tokio::test(start_paused = true)]
async fn test_scan_resumes_after_broken_stream() {
    let service = Arc::new(InMemoryTable::new());
    seed(&service, &["a", "b", "c", "d", "e"]);
    service.break_next_read_after(2);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq);

    let rows: Vec<_> = table
        .read_rows(RowSet::all(), Filter::default())
        .into_stream()
        .map(|row| row.unwrap())
        .collect()
        .await;

    let keys: Vec<_> = rows.iter().map(|row| row.key().clone()).collect();
    assert_eq!(keys, ["a", "b", "c", "d", "e"]);

    let calls = service.read_rows_calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    let resumed = calls[1].rows.as_ref().unwrap();
    assert_eq!(
        resumed.row_ranges[0].start_key,
        Some(StartKey::StartKeyOpen("b".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_limited_scan_asks_only_for_what_is_left() {
    let service = Arc::new(InMemoryTable::new());
    seed(&service, &["a", "b", "c", "d", "e"]);
    service.break_next_read_after(2);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq);

    let mut reader = table.read_rows_with_limit(RowSet::all(), 3, Filter::default());
    let mut keys = Vec::new();
    while let Some(row) = reader.next_row().await {
        keys.push(row.unwrap().key().clone());
    }

    assert_eq!(keys, ["a", "b", "c"]);
    let limits: Vec<_> = service
        .read_rows_calls
        .lock()
        .unwrap()
        .iter()
        .map(|call| call.rows_limit)
        .collect();
    assert_eq!(limits, vec![3, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_prefix_scan() {
    let service = Arc::new(InMemoryTable::new());
    seed(&service, &["user#1", "user#2", "video#1"]);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq);

    let rows: Vec<_> = table
        .read_rows(RowRange::prefix("user#").into(), Filter::default())
        .into_stream()
        .collect()
        .await;

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.as_ref().unwrap().key().starts_with(b"user#")));
}

#[tokio::test(start_paused = true)]
async fn test_check_and_mutate_row() {
    let service = Arc::new(InMemoryTable::new());
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    let claimed = table
        .async_check_and_mutate_row(
            &cq,
            "lock",
            Filter::default(),
            vec![],
            vec![set_cell("cf", "owner", CellTimestamp::Micros(1), "worker-1")],
        )
        .await
        .unwrap();
    assert!(!claimed);
    assert_eq!(
        service.value("lock", "cf", "owner").as_deref(),
        Some("worker-1")
    );

    let released = table
        .async_check_and_mutate_row(
            &cq,
            "lock",
            Filter::default(),
            vec![delete_from_row()],
            vec![],
        )
        .await
        .unwrap();
    assert!(released);
    assert!(!service.contains_row("lock"));
}

#[tokio::test(start_paused = true)]
async fn test_check_and_mutate_row_is_attempted_once() {
    let service = Arc::new(InMemoryTable::new());
    service.fail_next_calls(&[Code::Unavailable]);
    let cq = CompletionQueue::current().unwrap();
    let table = table(&service, cq.clone());

    let err = table
        .async_check_and_mutate_row(&cq, "lock", Filter::default(), vec![], vec![])
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::Unavailable);
    assert_eq!(service.check_and_mutate_row_calls.lock().unwrap().len(), 1);
}

#[test]
fn test_blocking_api() {
    let service = Arc::new(InMemoryTable::new());
    let table = table(&service, CompletionQueue::new(1).unwrap());

    table.apply(write("a", "1")).unwrap();
    table.apply(write("b", "2")).unwrap();
    let failures = table.bulk_apply(vec![write("c", "3")].into());
    assert!(failures.is_empty());

    let rows: Vec<_> = table
        .read_rows(RowSet::all(), Filter::default())
        .blocking(table.completion_queue())
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert!(table.check_and_mutate_row("a", Filter::default(), vec![], vec![]).unwrap());
}
