use super::page::{Cursor, Page, PageFetcher};
use crate::errors::AppError;
use crate::filter::{Authored, DepartmentFilter};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Why a collection run stopped.
#[derive(Debug)]
pub enum StopReason {
    /// The last page carried no continuation.
    Exhausted,
    /// A continuation repeated one already followed; not a failure.
    LoopDetected { cursor: Cursor },
    /// A page returned a record already seen on an earlier page; that page
    /// is dropped and the run ends. Not a failure.
    RepeatedRecords { page: usize, id: String },
    /// A page request failed; records from earlier pages are kept.
    Failed { page: usize, error: AppError },
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::LoopDetected { .. } => "loop-detected",
            StopReason::RepeatedRecords { .. } => "repeated-records",
            StopReason::Failed { .. } => "failed",
        }
    }
}

/// Accepted records of one run, in fetch order.
#[derive(Debug)]
pub struct Collection<R> {
    pub records: Vec<R>,
    /// Pages successfully fetched.
    pub pages: usize,
    /// Records seen before filtering.
    pub scanned: usize,
    pub stop: StopReason,
}

impl<R> Collection<R> {
    /// `false` only when a request failure cut the run short.
    pub fn is_complete(&self) -> bool {
        !matches!(self.stop, StopReason::Failed { .. })
    }
}

/// Drives `fetcher` to exhaustion, keeping records whose author passes `filter`.
pub async fn collect<F>(
    source: &str,
    fetcher: &F,
    filter: &DepartmentFilter,
) -> Collection<F::Record>
where
    F: PageFetcher + ?Sized,
    F::Record: Authored,
{
    collect_with(source, fetcher, |record: &F::Record| {
        filter.matches(record.author_name(), record.author_email())
    })
    .await
}

/// Drives `fetcher` to exhaustion, keeping records for which `keep` holds.
///
/// Pages are requested strictly one after another. A failed request ends the
/// run with whatever was accepted so far. A continuation whose identity was
/// already followed ends the run after the current page's records are taken.
pub async fn collect_with<F, P>(source: &str, fetcher: &F, keep: P) -> Collection<F::Record>
where
    F: PageFetcher + ?Sized,
    P: FnMut(&F::Record) -> bool,
{
    collect_distinct(source, fetcher, keep, |_: &F::Record| None).await
}

/// Like [`collect_with`], additionally guarding against servers that ignore
/// the cursor and serve the same records again.
///
/// `identity` names a record; `None` opts it out. A page carrying any
/// identity already seen on an earlier page is discarded and the run stops
/// with [`StopReason::RepeatedRecords`].
pub async fn collect_distinct<F, P, I>(
    source: &str,
    fetcher: &F,
    mut keep: P,
    identity: I,
) -> Collection<F::Record>
where
    F: PageFetcher + ?Sized,
    P: FnMut(&F::Record) -> bool,
    I: Fn(&F::Record) -> Option<String>,
{
    let mut cursor: Option<Cursor> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut accepted = Vec::new();
    let mut pages = 0;
    let mut scanned = 0;

    let stop = loop {
        let page_number = pages + 1;
        let Page {
            records,
            continuation,
        } = match fetcher.fetch(cursor.as_ref()).await {
            Ok(page) => page,
            Err(error) => {
                warn!(
                    source = source,
                    page = page_number,
                    cursor = %cursor_label(cursor.as_ref()),
                    error = %error,
                    request_failure = error.ends_source(),
                    "Page request failed, keeping partial results"
                );
                break StopReason::Failed {
                    page: page_number,
                    error,
                };
            }
        };
        let ids: Vec<String> = records.iter().filter_map(&identity).collect();
        if let Some(repeated) = ids.iter().find(|id| seen_ids.contains(*id)) {
            warn!(
                source = source,
                page = page_number,
                id = %repeated,
                "Page repeats records already collected, stopping"
            );
            break StopReason::RepeatedRecords {
                page: page_number,
                id: repeated.clone(),
            };
        }
        seen_ids.extend(ids);

        pages = page_number;
        scanned += records.len();

        let fetched = records.len();
        let before = accepted.len();
        accepted.extend(records.into_iter().filter(|record| keep(record)));
        debug!(
            source = source,
            page = page_number,
            fetched = fetched,
            accepted = accepted.len() - before,
            total = accepted.len(),
            "Page processed"
        );

        let Some(next) = continuation else {
            break StopReason::Exhausted;
        };
        if let Some(key) = next.loop_key() {
            if !seen.insert(key.to_string()) {
                warn!(
                    source = source,
                    page = page_number,
                    cursor = %next,
                    "Pagination loop detected, stopping"
                );
                break StopReason::LoopDetected { cursor: next };
            }
        }
        cursor = Some(next);
    };

    info!(
        source = source,
        pages = pages,
        scanned = scanned,
        accepted = accepted.len(),
        stop = stop.label(),
        "Collection finished"
    );

    Collection {
        records: accepted,
        pages,
        scanned,
        stop,
    }
}

fn cursor_label(cursor: Option<&Cursor>) -> String {
    cursor.map_or_else(|| "first".to_string(), Cursor::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted pages; the n-th call returns the n-th entry.
    struct Scripted {
        pages: Mutex<Vec<AppResult<Page<u32>>>>,
        calls: Mutex<Vec<Option<Cursor>>>,
    }

    impl Scripted {
        fn new(mut pages: Vec<AppResult<Page<u32>>>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for Scripted {
        type Record = u32;

        async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<u32>> {
            self.calls.lock().unwrap().push(cursor.cloned());
            self.pages
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::Transport("script exhausted".into())))
        }
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let fetcher = Scripted::new(vec![Ok(Page::last(vec![]))]);
        let collection = collect_with("test", &fetcher, |_| true).await;
        assert!(collection.records.is_empty());
        assert_eq!(collection.pages, 1);
        assert!(matches!(collection.stop, StopReason::Exhausted));
    }

    #[tokio::test]
    async fn threads_cursor_into_next_call() {
        let fetcher = Scripted::new(vec![
            Ok(Page::new(vec![1], Some(Cursor::Token("t2".into())))),
            Ok(Page::last(vec![2])),
        ]);
        let collection = collect_with("test", &fetcher, |_| true).await;
        assert_eq!(collection.records, vec![1, 2]);
        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(*calls, vec![None, Some(Cursor::Token("t2".into()))]);
    }

    #[tokio::test]
    async fn repeated_tokens_are_followed() {
        let fetcher = Scripted::new(vec![
            Ok(Page::new(vec![1], Some(Cursor::Token("same".into())))),
            Ok(Page::new(vec![2], Some(Cursor::Token("same".into())))),
            Ok(Page::last(vec![3])),
        ]);
        let collection = collect_with("test", &fetcher, |_| true).await;
        assert_eq!(collection.records, vec![1, 2, 3]);
        assert!(matches!(collection.stop, StopReason::Exhausted));
    }

    #[tokio::test]
    async fn predicate_drops_records() {
        let fetcher = Scripted::new(vec![Ok(Page::last(vec![1, 2, 3, 4]))]);
        let collection = collect_with("test", &fetcher, |n| n % 2 == 0).await;
        assert_eq!(collection.records, vec![2, 4]);
        assert_eq!(collection.scanned, 4);
    }

    #[tokio::test]
    async fn failure_on_first_page_is_not_complete() {
        let fetcher = Scripted::new(vec![Err(AppError::Api {
            status: 401,
            body: "Unauthorized".into(),
        })]);
        let collection = collect_with("test", &fetcher, |_| true).await;
        assert!(collection.records.is_empty());
        assert!(!collection.is_complete());
        assert!(matches!(
            collection.stop,
            StopReason::Failed {
                page: 1,
                error: AppError::Api { status: 401, .. }
            }
        ));
    }

    #[tokio::test]
    async fn repeated_identity_drops_page_and_stops() {
        let fetcher = Scripted::new(vec![
            Ok(Page::new(vec![1, 2], Some(Cursor::Link("/a".into())))),
            Ok(Page::new(vec![3, 2], Some(Cursor::Link("/b".into())))),
            Ok(Page::last(vec![4])),
        ]);
        let collection =
            collect_distinct("test", &fetcher, |_| true, |n: &u32| Some(n.to_string())).await;
        assert_eq!(collection.records, vec![1, 2]);
        assert_eq!(collection.pages, 1);
        assert!(collection.is_complete());
        assert!(matches!(
            collection.stop,
            StopReason::RepeatedRecords { page: 2, ref id } if id == "2"
        ));
    }

    #[tokio::test]
    async fn records_without_identity_are_never_repeats() {
        let fetcher = Scripted::new(vec![
            Ok(Page::new(vec![7], Some(Cursor::Token("t2".into())))),
            Ok(Page::last(vec![7])),
        ]);
        let collection = collect_distinct("test", &fetcher, |_| true, |_: &u32| None).await;
        assert_eq!(collection.records, vec![7, 7]);
        assert!(matches!(collection.stop, StopReason::Exhausted));
    }

    #[test]
    fn cursor_label_for_first_page() {
        assert_eq!(cursor_label(None), "first");
        assert_eq!(cursor_label(Some(&Cursor::Next("u".into()))), "next-url:u");
    }
}
