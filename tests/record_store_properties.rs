//! RecordStore behaviour against an in-memory table: first-match semantics,
//! cache coherence after mutations and retry boundaries.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use salon_karte::errors::StoreError;
use salon_karte::models::{CustomerRecord, SheetRecord, TableId};
use salon_karte::repositories::{RecordStore, TableCache};
use salon_karte::transport::{InMemorySheetTransport, SheetTransportRetryExt};
use salon_karte::utils::RetryConfig;

fn customers_table() -> TableId {
    TableId::new("SalonDatabase", "Customers")
}

async fn store_over(
    names: &[&str],
) -> (InMemorySheetTransport, RecordStore<CustomerRecord>) {
    let rows: Vec<[String; 5]> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            [
                name.to_string(),
                String::new(),
                format!("{i:03}"),
                String::new(),
                String::new(),
            ]
        })
        .collect();
    let transport = InMemorySheetTransport::new()
        .with_table(customers_table(), CustomerRecord::COLUMNS, &rows)
        .await;
    let store = RecordStore::new(
        Arc::new(transport.clone()),
        customers_table(),
        Arc::new(TableCache::new(8)),
        Duration::from_secs(60),
    );
    (transport, store)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn phones(records: &[CustomerRecord]) -> Vec<String> {
    records.iter().map(|r| r.phone.clone()).collect()
}

#[tokio::test]
async fn test_delete_middle_customer() {
    let (_, store) = store_over(&["A", "B", "C"]).await;

    store.delete_by_key("B").await.unwrap();

    let names: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["A", "C"]);
}

#[tokio::test]
async fn test_delete_absent_key_leaves_table_alone() {
    let (transport, store) = store_over(&["A", "B"]).await;

    let err = store.delete_by_key("Z").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(store.list().await.unwrap().len(), 2);
    assert_eq!(transport.call_count("delete_row").await, 0);
}

#[tokio::test]
async fn test_list_twice_within_ttl_is_one_fetch() {
    let (transport, store) = store_over(&["A"]).await;

    let first = store.list().await.unwrap();
    let second = store.list().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(transport.call_count("list_rows").await, 1);
}

#[tokio::test]
async fn test_failed_append_leaves_table_and_reports_unavailable() {
    let (transport, store) = store_over(&["A"]).await;
    transport
        .fail_next_on(
            "append_row",
            StoreError::unavailable("append_row", "HTTP 503 Service Unavailable", true),
        )
        .await;

    let err = store.append(&CustomerRecord::new("B")).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retrying_transport_recovers_reads_not_appends() {
    let transport = InMemorySheetTransport::new()
        .with_table(customers_table(), CustomerRecord::COLUMNS, &[["A", "", "", "", ""]])
        .await;
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    let store: RecordStore<CustomerRecord> = RecordStore::new(
        Arc::new(transport.clone().with_retries(retry)),
        customers_table(),
        Arc::new(TableCache::new(8)),
        Duration::from_secs(60),
    );

    let transient = || StoreError::unavailable("remote", "HTTP 503", true);
    transport.fail_next_on("list_rows", transient()).await;
    assert_eq!(store.list().await.unwrap().len(), 1);
    assert_eq!(transport.call_count("list_rows").await, 2);

    transport.fail_next_on("append_row", transient()).await;
    assert!(store.append(&CustomerRecord::new("B")).await.is_err());
    assert_eq!(transport.call_count("append_row").await, 1);
}

proptest! {
    #[test]
    fn test_append_lands_last(
        names in prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..6),
    ) {
        runtime().block_on(async {
            let (_, store) = store_over(&names).await;
            let before = store.list().await.unwrap();

            store.append(&CustomerRecord::new("New").with_phone("0900")).await.unwrap();

            let after = store.list().await.unwrap();
            assert_eq!(after.len(), before.len() + 1);
            assert_eq!(&after[..before.len()], &before[..]);
            assert_eq!(after.last().map(|r| r.name.as_str()), Some("New"));
        });
    }

    #[test]
    fn test_update_touches_only_first_match(
        names in prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..8),
        key in prop::sample::select(vec!["A", "B", "C"]),
    ) {
        runtime().block_on(async {
            let (_, store) = store_over(&names).await;
            let before = store.list().await.unwrap();

            let result = store.update_cell(key, CustomerRecord::NOTE, "updated").await;
            let after = store.list().await.unwrap();

            match names.iter().position(|n| *n == key) {
                Some(first) => {
                    assert!(result.unwrap().is_applied());
                    for (i, (old, new)) in before.iter().zip(&after).enumerate() {
                        if i == first {
                            assert_eq!(new.note, "updated");
                            assert_eq!(new.name, old.name);
                        } else {
                            assert_eq!(new, old);
                        }
                    }
                }
                None => {
                    assert!(matches!(result, Err(StoreError::NotFound { .. })));
                    assert_eq!(after, before);
                }
            }
        });
    }

    #[test]
    fn test_delete_removes_only_first_match(
        names in prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..8),
        key in prop::sample::select(vec!["A", "B", "C"]),
    ) {
        runtime().block_on(async {
            let (_, store) = store_over(&names).await;
            let mut expected = phones(&store.list().await.unwrap());

            let result = store.delete_by_key(key).await;
            match names.iter().position(|n| *n == key) {
                Some(first) => {
                    result.unwrap();
                    expected.remove(first);
                }
                None => assert!(matches!(result, Err(StoreError::NotFound { .. }))),
            }

            assert_eq!(phones(&store.list().await.unwrap()), expected);
        });
    }
}
