//! Paginated text reader.
//!
//! [`Reader`] is a synchronous state machine driven by `open`, `close` and
//! fetch resolution. [`ReaderHandle`] wraps it for async callers and aborts
//! the in-flight fetch when the reader is closed or reopened.

use crate::error::{Result, StorytimeError};
use crate::services::fetcher::TextSource;
use crate::services::paginator::PagedText;
use crate::types::{
    ContentStatus, PageChange, ReaderConfig, ReaderView, TextResource, LOAD_FAILED_MESSAGE,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

/// Identity of one load request. Completions carrying a stale ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub enum ReaderState {
    Idle,
    Loading {
        resource: TextResource,
        ticket: LoadTicket,
    },
    Ready {
        resource: TextResource,
        text: PagedText,
        current: usize,
        loaded_at: DateTime<Utc>,
    },
    Failed {
        resource: TextResource,
        reason: String,
    },
}

#[derive(Debug)]
pub struct Reader {
    config: ReaderConfig,
    state: ReaderState,
    generation: u64,
    scroll_offset: usize,
}

impl Reader {
    pub fn new(config: ReaderConfig) -> Result<Self> {
        if config.page_size == 0 {
            return Err(StorytimeError::InvalidPageSize);
        }

        Ok(Self {
            config,
            state: ReaderState::Idle,
            generation: 0,
            scroll_offset: 0,
        })
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    /// Fetch `resource` through `source` and apply the result.
    ///
    /// Failures are logged and turn into the failed state; they never surface
    /// as an `Err`.
    pub async fn open<S>(&mut self, source: &S, resource: TextResource) -> ReaderView
    where
        S: TextSource + ?Sized,
    {
        let ticket = self.begin_open(resource.clone());
        let result = source.fetch_text(&resource).await;
        self.complete_open(ticket, result);
        self.view()
    }

    /// Enter the loading state for `resource`, discarding any previous content.
    pub fn begin_open(&mut self, resource: TextResource) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket(self.generation);
        info!("Opening reader for {}", resource);

        self.state = ReaderState::Loading { resource, ticket };
        self.scroll_offset = 0;
        ticket
    }

    /// Apply a fetch result. Returns `false` if `ticket` is no longer the
    /// active load, in which case nothing changes.
    pub fn complete_open(&mut self, ticket: LoadTicket, result: Result<String>) -> bool {
        let resource = match &self.state {
            ReaderState::Loading {
                resource,
                ticket: active,
            } if *active == ticket => resource.clone(),
            _ => {
                debug!("Dropping stale load result for ticket {:?}", ticket);
                return false;
            }
        };

        self.state = match result.and_then(|text| PagedText::new(text, self.config.page_size)) {
            Ok(text) => {
                info!(
                    "Loaded {} ({} pages of {} chars)",
                    resource,
                    text.total_pages(),
                    text.page_size()
                );
                ReaderState::Ready {
                    resource,
                    text,
                    current: 0,
                    loaded_at: Utc::now(),
                }
            }
            Err(e) => {
                error!("Error fetching book content from {}: {}", resource, e);
                ReaderState::Failed {
                    resource,
                    reason: e.to_string(),
                }
            }
        };
        self.scroll_offset = 0;
        true
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ReaderState::Loading { .. })
    }

    /// Zero while idle or loading, one when failed.
    pub fn total_pages(&self) -> usize {
        match &self.state {
            ReaderState::Idle | ReaderState::Loading { .. } => 0,
            ReaderState::Ready { text, .. } => text.total_pages(),
            ReaderState::Failed { .. } => 1,
        }
    }

    pub fn current_page_index(&self) -> usize {
        match &self.state {
            ReaderState::Ready { current, .. } => *current,
            _ => 0,
        }
    }

    /// Content of page `index`, clamped into range.
    pub fn page(&self, index: usize) -> &str {
        match &self.state {
            ReaderState::Ready { text, .. } => text.page(index),
            ReaderState::Failed { .. } => LOAD_FAILED_MESSAGE,
            ReaderState::Idle | ReaderState::Loading { .. } => "",
        }
    }

    pub fn current_page(&self) -> &str {
        self.page(self.current_page_index())
    }

    /// Move to `requested`, clamped to the available pages.
    ///
    /// The scroll position always returns to the top of the page, even when
    /// the index does not change.
    pub fn go_to_page(&mut self, requested: i64) -> PageChange {
        self.scroll_offset = 0;

        match &mut self.state {
            ReaderState::Ready { text, current, .. } => {
                let target = text.clamp_index(requested);
                let changed = target != *current;
                *current = target;
                if changed {
                    debug!("Moved to page {} of {}", target + 1, text.total_pages());
                }
                PageChange {
                    index: target,
                    changed,
                }
            }
            _ => PageChange {
                index: 0,
                changed: false,
            },
        }
    }

    pub fn next_page(&mut self) -> PageChange {
        let current = self.current_page_index() as i64;
        self.go_to_page(current.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> PageChange {
        let current = self.current_page_index() as i64;
        self.go_to_page(current.saturating_sub(1))
    }

    pub fn has_previous(&self) -> bool {
        self.current_page_index() > 0
    }

    pub fn has_next(&self) -> bool {
        matches!(self.state, ReaderState::Ready { .. })
            && self.current_page_index() + 1 < self.total_pages()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Record the caller's reading position inside the current page.
    pub fn scroll_to(&mut self, offset: usize) {
        self.scroll_offset = offset;
    }

    /// Drop the loaded text and invalidate any outstanding load.
    pub fn close(&mut self) {
        if !matches!(self.state, ReaderState::Idle) {
            info!("Closing reader");
        }
        self.generation += 1;
        self.state = ReaderState::Idle;
        self.scroll_offset = 0;
    }

    pub fn view(&self) -> ReaderView {
        let (status, loaded_at) = match &self.state {
            ReaderState::Idle => (ContentStatus::Idle, None),
            ReaderState::Loading { .. } => (ContentStatus::Loading, None),
            ReaderState::Ready { loaded_at, .. } => (ContentStatus::Text, Some(*loaded_at)),
            ReaderState::Failed { reason, .. } => (
                ContentStatus::Failed {
                    reason: reason.clone(),
                },
                None,
            ),
        };

        ReaderView {
            loading: self.is_loading(),
            status,
            current_page_content: self.current_page().to_string(),
            current_page_index: self.current_page_index(),
            total_pages: self.total_pages(),
            has_previous: self.has_previous(),
            has_next: self.has_next(),
            scroll_offset: self.scroll_offset,
            loaded_at,
        }
    }
}

/// Cloneable async handle to a shared [`Reader`].
///
/// The reader lock is never held across the fetch, so `close` can run while
/// an `open` is pending.
pub struct ReaderHandle<S: TextSource> {
    reader: Arc<Mutex<Reader>>,
    source: Arc<S>,
    cancel: Arc<watch::Sender<u64>>,
}

impl<S: TextSource> Clone for ReaderHandle<S> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            source: Arc::clone(&self.source),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl<S: TextSource> ReaderHandle<S> {
    pub fn new(source: S, config: ReaderConfig) -> Result<Self> {
        let (cancel, _) = watch::channel(0);
        Ok(Self {
            reader: Arc::new(Mutex::new(Reader::new(config)?)),
            source: Arc::new(source),
            cancel: Arc::new(cancel),
        })
    }

    /// Load `resource`. Returns `false` if the load was abandoned because the
    /// reader was closed or reopened before the fetch resolved.
    pub async fn open(&self, resource: TextResource) -> bool {
        // Ticket and cancel generation move together under the reader lock,
        // so a close can never land between them.
        let (ticket, mut cancelled) = {
            let mut reader = self.reader.lock().await;
            // Abort whatever load is still in flight before starting this one.
            self.cancel.send_modify(|generation| *generation += 1);
            let ticket = reader.begin_open(resource.clone());
            (ticket, self.cancel.subscribe())
        };

        let result = tokio::select! {
            result = self.source.fetch_text(&resource) => Some(result),
            _ = cancelled.changed() => None,
        };

        match result {
            Some(result) => self.reader.lock().await.complete_open(ticket, result),
            None => {
                debug!("Abandoned fetch of {}", resource);
                false
            }
        }
    }

    pub async fn close(&self) {
        let mut reader = self.reader.lock().await;
        reader.close();
        self.cancel.send_modify(|generation| *generation += 1);
    }

    pub async fn go_to_page(&self, requested: i64) -> PageChange {
        self.reader.lock().await.go_to_page(requested)
    }

    pub async fn next_page(&self) -> PageChange {
        self.reader.lock().await.next_page()
    }

    pub async fn previous_page(&self) -> PageChange {
        self.reader.lock().await.previous_page()
    }

    pub async fn scroll_to(&self, offset: usize) {
        self.reader.lock().await.scroll_to(offset);
    }

    pub async fn view(&self) -> ReaderView {
        self.reader.lock().await.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn resource() -> TextResource {
        TextResource::parse("https://www.gutenberg.org/cache/epub/84/pg84.txt").unwrap()
    }

    fn config(page_size: usize) -> ReaderConfig {
        ReaderConfig {
            page_size,
            ..ReaderConfig::default()
        }
    }

    fn text_of(len: usize) -> String {
        "x".repeat(len)
    }

    struct StaticSource {
        body: std::result::Result<String, u16>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn ok(body: String) -> Self {
            Self {
                body: Ok(body),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                body: Err(status),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextSource for StaticSource {
        async fn fetch_text(&self, _resource: &TextResource) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(StorytimeError::HttpStatus { status: *status }),
            }
        }
    }

    /// Blocks every fetch until released.
    struct GatedSource {
        gate: Notify,
        body: String,
    }

    #[async_trait]
    impl TextSource for GatedSource {
        async fn fetch_text(&self, _resource: &TextResource) -> Result<String> {
            self.gate.notified().await;
            Ok(self.body.clone())
        }
    }

    #[tokio::test]
    async fn test_open_success() {
        let source = StaticSource::ok(text_of(10001));
        let mut reader = Reader::new(config(5000)).unwrap();

        let view = reader.open(&source, resource()).await;

        assert!(!view.loading);
        assert_eq!(view.status, ContentStatus::Text);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.current_page_index, 0);
        assert_eq!(view.current_page_content.len(), 5000);
        assert!(view.loaded_at.is_some());
        assert_eq!(reader.page(2).len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_shows_placeholder() {
        let source = StaticSource::failing(503);
        let mut reader = Reader::new(config(5000)).unwrap();

        let view = reader.open(&source, resource()).await;

        assert!(!view.loading);
        assert!(matches!(view.status, ContentStatus::Failed { .. }));
        assert_eq!(view.current_page_content, LOAD_FAILED_MESSAGE);
        assert_eq!(view.total_pages, 1);
        assert!(!view.has_previous);
        assert!(!view.has_next);

        let change = reader.next_page();
        assert!(!change.changed);
        assert_eq!(reader.current_page(), LOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_content_is_one_page() {
        let source = StaticSource::ok(String::new());
        let mut reader = Reader::new(config(5000)).unwrap();

        let view = reader.open(&source, resource()).await;

        assert_eq!(view.status, ContentStatus::Text);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.current_page_content, "");
        assert_eq!(view.page_label(), "Page 1 of 1");
    }

    #[tokio::test]
    async fn test_navigation_clamps() {
        let source = StaticSource::ok(text_of(12000));
        let mut reader = Reader::new(config(5000)).unwrap();
        reader.open(&source, resource()).await;

        let change = reader.go_to_page(-5);
        assert_eq!(change, PageChange { index: 0, changed: false });

        reader.go_to_page(2);
        let change = reader.go_to_page(99);
        assert_eq!(change, PageChange { index: 2, changed: false });
        assert!(!reader.has_next());
        assert!(reader.has_previous());

        assert_eq!(reader.previous_page().index, 1);
        assert_eq!(reader.next_page().index, 2);
        assert_eq!(reader.next_page(), PageChange { index: 2, changed: false });
    }

    #[tokio::test]
    async fn test_page_change_resets_scroll() {
        let source = StaticSource::ok(text_of(12000));
        let mut reader = Reader::new(config(5000)).unwrap();
        reader.open(&source, resource()).await;

        reader.scroll_to(420);
        reader.next_page();
        assert_eq!(reader.scroll_offset(), 0);

        reader.scroll_to(64);
        reader.go_to_page(1);
        assert_eq!(reader.scroll_offset(), 0);
    }

    #[tokio::test]
    async fn test_close_discards_content() {
        let source = StaticSource::ok(text_of(12000));
        let mut reader = Reader::new(config(5000)).unwrap();
        reader.open(&source, resource()).await;
        reader.go_to_page(2);

        reader.close();

        let view = reader.view();
        assert_eq!(view.status, ContentStatus::Idle);
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.current_page_index, 0);
        assert_eq!(view.current_page_content, "");
        assert!(matches!(reader.state(), ReaderState::Idle));
    }

    #[test]
    fn test_stale_completion_after_close_is_ignored() {
        let mut reader = Reader::new(config(5000)).unwrap();
        let ticket = reader.begin_open(resource());
        reader.close();
        let after_close = reader.view();

        let applied = reader.complete_open(ticket, Ok(text_of(9000)));

        assert!(!applied);
        assert_eq!(reader.view(), after_close);
    }

    #[test]
    fn test_reopen_never_mixes_content() {
        let mut reader = Reader::new(config(10)).unwrap();
        let first = reader.begin_open(resource());
        assert!(reader.complete_open(first, Ok("old content here".to_string())));

        let second = reader.begin_open(resource());
        let view = reader.view();
        assert!(view.loading);
        assert_eq!(view.current_page_content, "");
        assert_eq!(view.total_pages, 0);

        assert!(!reader.complete_open(first, Ok("stale".to_string())));
        assert!(reader.complete_open(second, Ok("new".to_string())));
        assert_eq!(reader.current_page(), "new");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            Reader::new(config(0)),
            Err(StorytimeError::InvalidPageSize)
        ));
    }

    #[tokio::test]
    async fn test_handle_close_while_pending() {
        let source = GatedSource {
            gate: Notify::new(),
            body: text_of(9000),
        };
        let handle = ReaderHandle::new(source, config(5000)).unwrap();

        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.open(resource()).await }
        });

        // Wait until the load has started.
        while !handle.view().await.loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.close().await;
        let after_close = handle.view().await;
        handle.source.gate.notify_one();

        let applied = pending.await.unwrap();
        assert!(!applied);
        assert_eq!(handle.view().await, after_close);
        assert_eq!(after_close.status, ContentStatus::Idle);
    }

    #[tokio::test]
    async fn test_handle_close_queued_before_open_begins() {
        let source = GatedSource {
            gate: Notify::new(),
            body: text_of(9000),
        };
        let handle = ReaderHandle::new(source, config(5000)).unwrap();

        let guard = handle.reader.lock().await;
        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.open(resource()).await }
        });
        tokio::task::yield_now().await;

        // Close while the open is still waiting for the reader lock.
        let mut guard = guard;
        guard.close();
        handle.cancel.send_modify(|generation| *generation += 1);
        drop(guard);

        while !handle.view().await.loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.source.gate.notify_one();

        let applied = pending.await.unwrap();
        let view = handle.view().await;
        assert!(applied);
        assert!(!view.loading);
        assert_eq!(view.status, ContentStatus::Text);
        assert_eq!(view.total_pages, 2);
    }

    #[tokio::test]
    async fn test_handle_second_open_abandons_first() {
        let source = GatedSource {
            gate: Notify::new(),
            body: text_of(6000),
        };
        let handle = ReaderHandle::new(source, config(5000)).unwrap();

        let first = tokio::spawn({
            let handle = handle.clone();
            async move { handle.open(resource()).await }
        });
        while !handle.view().await.loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = tokio::spawn({
            let handle = handle.clone();
            async move { handle.open(resource()).await }
        });

        assert!(!first.await.unwrap());
        let view = handle.view().await;
        assert!(view.loading);
        assert_eq!(view.current_page_content, "");

        handle.source.gate.notify_one();
        assert!(second.await.unwrap());
        let view = handle.view().await;
        assert_eq!(view.status, ContentStatus::Text);
        assert_eq!(view.total_pages, 2);
    }

    #[tokio::test]
    async fn test_handle_open_and_navigate() {
        let handle =
            ReaderHandle::new(StaticSource::ok(text_of(10000)), config(5000)).unwrap();

        assert!(handle.open(resource()).await);
        let view = handle.view().await;
        assert_eq!(view.total_pages, 2);
        assert!(view.has_next);

        handle.scroll_to(12).await;
        let change = handle.next_page().await;
        assert_eq!(change, PageChange { index: 1, changed: true });
        assert_eq!(handle.view().await.scroll_offset, 0);
        assert_eq!(handle.previous_page().await.index, 0);
        assert_eq!(handle.go_to_page(7).await.index, 1);
    }
}
