//! Integration tests for the collection driver

#[path = "common/mod.rs"]
mod common;

use activity_audit::collector::{
    collect, collect_distinct, collect_with, Cursor, Page, StopReason,
};
use activity_audit::errors::AppError;
use activity_audit::filter::DepartmentFilter;
use common::*;

const NONE: [&str; 0] = [];

#[tokio::test]
async fn empty_first_page_is_not_an_error() {
    let fetcher: ScriptedFetcher<Person> = ScriptedFetcher::new(vec![Ok(Page::last(vec![]))]);
    let collection = collect("test", &fetcher, &DepartmentFilter::default()).await;

    assert!(collection.records.is_empty());
    assert!(collection.is_complete());
    assert!(matches!(collection.stop, StopReason::Exhausted));
}

#[tokio::test]
async fn pages_are_concatenated_in_fetch_order() {
    let p1 = vec![person("A", "a@x"), person("B", "b@x")];
    let p2 = vec![person("C", "c@x")];
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(p1.clone(), Some(Cursor::Token("t2".into())))),
        Ok(Page::last(p2.clone())),
    ]);

    let collection = collect("test", &fetcher, &DepartmentFilter::default()).await;

    let expected: Vec<Person> = p1.into_iter().chain(p2).collect();
    assert_eq!(collection.records, expected);
    assert_eq!(collection.pages, 2);
    assert_eq!(
        fetcher.calls(),
        vec![None, Some(Cursor::Token("t2".into()))]
    );
}

#[tokio::test]
async fn name_filter_keeps_only_listed_author() {
    let fetcher = ScriptedFetcher::new(vec![Ok(Page::last(vec![
        person("Alice", "a@x"),
        person("Bob", "b@x"),
    ]))]);
    let filter = DepartmentFilter::new(NONE, ["Alice"]);

    let collection = collect("test", &fetcher, &filter).await;

    assert_eq!(collection.records, vec![person("Alice", "a@x")]);
    assert_eq!(collection.scanned, 2);
}

#[tokio::test]
async fn email_filter_matches_records_without_names() {
    let anonymous = Person {
        name: None,
        email: Some("ops@x".into()),
    };
    let fetcher = ScriptedFetcher::new(vec![Ok(Page::last(vec![
        anonymous.clone(),
        person("Bob", "b@x"),
    ]))]);
    let filter = DepartmentFilter::new(["ops@x"], NONE);

    let collection = collect("test", &fetcher, &filter).await;

    assert_eq!(collection.records, vec![anonymous]);
}

#[tokio::test]
async fn self_referencing_link_stops_after_second_page() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(
            vec![person("A", "a@x")],
            Some(Cursor::Link("/p2".into())),
        )),
        Ok(Page::new(
            vec![person("B", "b@x")],
            Some(Cursor::Link("/p2".into())),
        )),
        Ok(Page::last(vec![person("never", "n@x")])),
    ]);

    let collection = collect("test", &fetcher, &DepartmentFilter::default()).await;

    assert_eq!(
        collection.records,
        vec![person("A", "a@x"), person("B", "b@x")]
    );
    assert_eq!(fetcher.calls().len(), 2);
    assert!(collection.is_complete());
    match collection.stop {
        StopReason::LoopDetected { cursor } => assert_eq!(cursor, Cursor::Link("/p2".into())),
        other => panic!("expected loop detection, got {other:?}"),
    }
}

#[tokio::test]
async fn constant_cursor_terminates_within_two_observations() {
    let fetcher = RepeatingFetcher::new(Page::new(
        vec![1u32],
        Some(Cursor::Next("https://api.example.com/list?page=2".into())),
    ));

    let collection = collect_with("test", &fetcher, |_| true).await;

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(collection.records, vec![1, 1]);
    assert!(matches!(collection.stop, StopReason::LoopDetected { .. }));
}

#[tokio::test]
async fn cycle_between_links_is_detected() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(vec![1u32], Some(Cursor::Link("/a".into())))),
        Ok(Page::new(vec![2], Some(Cursor::Link("/b".into())))),
        Ok(Page::new(vec![3], Some(Cursor::Link("/a".into())))),
    ]);

    let collection = collect_with("test", &fetcher, |_| true).await;

    assert_eq!(collection.records, vec![1, 2, 3]);
    assert_eq!(fetcher.calls().len(), 3);
    assert!(matches!(collection.stop, StopReason::LoopDetected { .. }));
}

#[tokio::test]
async fn server_ignoring_offsets_is_stopped_by_record_identity() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(
            vec![person("A", "a@x"), person("B", "b@x")],
            Some(Cursor::Link("/search?start=2".into())),
        )),
        Ok(Page::new(
            vec![person("A", "a@x"), person("B", "b@x")],
            Some(Cursor::Link("/search?start=4".into())),
        )),
        Ok(Page::last(vec![person("never", "n@x")])),
    ]);

    let collection = collect_distinct(
        "test",
        &fetcher,
        |_| true,
        |p: &Person| p.email.clone(),
    )
    .await;

    assert_eq!(
        collection.records,
        vec![person("A", "a@x"), person("B", "b@x")]
    );
    assert_eq!(fetcher.calls().len(), 2);
    assert!(collection.is_complete());
    assert!(matches!(
        collection.stop,
        StopReason::RepeatedRecords { page: 2, .. }
    ));
}

#[tokio::test]
async fn empty_token_page_mid_stream_keeps_going() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(vec![1u32], Some(Cursor::Token("t2".into())))),
        Ok(Page::new(vec![], Some(Cursor::Token("t3".into())))),
        Ok(Page::last(vec![3])),
    ]);

    let collection = collect_with("test", &fetcher, |_| true).await;

    assert_eq!(collection.records, vec![1, 3]);
    assert_eq!(collection.pages, 3);
    assert!(matches!(collection.stop, StopReason::Exhausted));
}

#[tokio::test]
async fn transport_error_keeps_partial_results() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(Page::new(vec![1u32, 2], Some(Cursor::Token("t2".into())))),
        Err(AppError::Transport("connection reset".into())),
        Ok(Page::last(vec![99])),
    ]);

    let collection = collect_with("test", &fetcher, |_| true).await;

    assert_eq!(collection.records, vec![1, 2]);
    assert_eq!(collection.pages, 1);
    assert!(!collection.is_complete());
    assert!(matches!(
        collection.stop,
        StopReason::Failed {
            page: 2,
            error: AppError::Transport(_)
        }
    ));
}

#[tokio::test]
async fn api_error_on_first_page_yields_empty_collection() {
    let fetcher: ScriptedFetcher<u32> = ScriptedFetcher::new(vec![Err(AppError::Api {
        status: 401,
        body: "Unauthorized".into(),
    })]);

    let collection = collect_with("test", &fetcher, |_| true).await;

    assert!(collection.records.is_empty());
    assert_eq!(collection.pages, 0);
    assert!(!collection.is_complete());
}
