//! Directory navigation controller.
//!
//! [`Explorer`] owns one view and everything needed to keep it filled:
//!
//! - navigation intents are normalized and answered from the LRU cache when
//!   possible, then revalidated against the remote service
//! - every navigation takes a new [`RequestToken`]; completions for older
//!   tokens still write through to the cache but never touch the view
//! - `load_more` appends the next page, at most one at a time per navigation
//! - `prefetch` warms the cache without touching the view or the token
//!
//! All operations take `&self`. State lives in `Cell`/`RefCell` and no
//! borrow is held across an `.await`, so operations on one explorer can be
//! interleaved freely on a single-threaded executor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{DEFAULT_VIEWPORT_HEIGHT_PX, ExplorerConfig};
use crate::core::cache::{CachePatch, DirCache};
use crate::core::client::{ContentClient, Download, ListRequest, ListingClient, WriteAccess};
use crate::core::coordinator::{RequestCoordinator, RequestToken, page_size};
use crate::core::error::{ClientError, ErrorKind};
use crate::core::merge::{merge, merge_sorted, sort};
use crate::core::normalize::strip_input_prefixes;
use crate::core::prefetch::PrefetchManager;
use crate::core::view_store::{SubscriptionId, ViewStore};
use crate::models::{
    CacheKey, DirectoryAddress, Entry, SortOrder, Target, ViewState, file_name_of,
};
use crate::utils::storage::PersistedStore;

/// One page as returned by the listing client.
struct Page {
    entries: Vec<Entry>,
    /// The page was full, so another may follow.
    full: bool,
}

/// A listing call and how its result combines with what is already known.
struct PageFetch {
    token: RequestToken,
    dir: DirectoryAddress,
    key: CacheKey,
    cursor: String,
    /// Entries the page is merged into. `None` replaces them.
    base: Option<Vec<Entry>>,
    /// Failures reach the view. Revalidation failures are only logged.
    publish_errors: bool,
}

/// Navigation and cache controller for one directory view.
pub struct Explorer<C, S> {
    client: C,
    config: ExplorerConfig,
    cache: RefCell<DirCache<S>>,
    coordinator: RequestCoordinator,
    prefetcher: PrefetchManager,
    view: ViewStore,
    viewport_height: Cell<f64>,
    scroll_offset: Cell<f64>,
    access: RefCell<Option<Box<dyn WriteAccess>>>,
}

impl<C, S> Explorer<C, S>
where
    C: ListingClient,
    S: PersistedStore,
{
    pub fn new(client: C, store: S) -> Self {
        Self::with_config(client, store, ExplorerConfig::default())
    }

    pub fn with_config(client: C, store: S, config: ExplorerConfig) -> Self {
        let cache = DirCache::new(store, config.cache_storage_key.clone(), config.cache_capacity);
        Self {
            client,
            cache: RefCell::new(cache),
            coordinator: RequestCoordinator::new(),
            prefetcher: PrefetchManager::new(),
            view: ViewStore::new(ViewState::new(&config)),
            viewport_height: Cell::new(DEFAULT_VIEWPORT_HEIGHT_PX),
            scroll_offset: Cell::new(0.0),
            access: RefCell::new(None),
            config,
        }
    }

    /// Builder form of [`Explorer::set_write_access`].
    pub fn with_write_access(self, access: impl WriteAccess + 'static) -> Self {
        *self.access.borrow_mut() = Some(Box::new(access));
        self
    }

    /// Replace the write-access capability (sign-in/sign-out) and refresh
    /// `writable` for the current directory.
    pub fn set_write_access(&self, access: Option<Box<dyn WriteAccess>>) {
        *self.access.borrow_mut() = access;
        let dir = self.view.snapshot().dir.clone();
        let writable = self.can_write(&dir);
        self.view.update(|v| v.writable = writable);
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    // =========================================================================
    // View access
    // =========================================================================

    /// Current view snapshot.
    pub fn snapshot(&self) -> Rc<ViewState> {
        self.view.snapshot()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self, listener: impl Fn(&Rc<ViewState>) + 'static) -> SubscriptionId {
        self.view.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.view.unsubscribe(id)
    }

    /// Token of the navigation whose results are currently accepted.
    pub fn current_token(&self) -> RequestToken {
        self.coordinator.current()
    }

    /// Whether the cache holds `dir` under the current mode, without
    /// touching recency.
    pub fn is_cached(&self, dir: &DirectoryAddress) -> bool {
        let view = self.view.snapshot();
        let key = CacheKey::new(dir.clone(), view.shallow, view.sort_order);
        self.cache.borrow().contains(&key)
    }

    /// Number of cached directory slots.
    pub fn cached_slots(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Forget every cached listing, e.g. after the signed-in session changes.
    /// The current view is kept.
    pub fn clear_cache(&self) {
        tracing::debug!("clearing directory cache");
        self.cache.borrow_mut().clear();
    }

    // =========================================================================
    // Host inputs
    // =========================================================================

    /// Viewport height in pixels, used to size listing pages.
    pub fn set_viewport_height(&self, px: f64) {
        self.viewport_height.set(px);
    }

    /// Rows requested per listing call.
    pub fn page_size(&self) -> u32 {
        page_size(self.viewport_height.get(), self.config.row_height_px)
    }

    /// Latest scroll position of the view, saved when navigating away.
    pub fn record_scroll(&self, offset: f64) {
        self.scroll_offset.set(offset);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to raw address-bar input. Blank input resets the view.
    ///
    /// Returns `Err(ErrorKind::Canceled)` if a newer navigation took over
    /// before the listing arrived. Errors are also published on the view.
    pub async fn navigate(&self, raw: &str) -> Result<(), ErrorKind> {
        if strip_input_prefixes(raw).is_empty() {
            self.reset();
            return Ok(());
        }
        self.navigate_to(DirectoryAddress::parse(raw)).await
    }

    /// Navigate to input that may point at a file.
    ///
    /// The directory part is browsed; the parsed target is handed back so
    /// the caller can preview a file. Blank input resets and yields `None`.
    pub async fn open(&self, raw: &str) -> Option<Target> {
        let Some(target) = Target::parse(raw) else {
            self.reset();
            return None;
        };
        if let Err(kind) = self.navigate_to(target.dir().clone()).await {
            tracing::debug!(path = %target.share_path(), %kind, "navigation did not complete");
        }
        Some(target)
    }

    /// Navigate to `dir` unless it is already loading its first page.
    pub async fn navigate_to(&self, dir: DirectoryAddress) -> Result<(), ErrorKind> {
        let view = self.view.snapshot();
        if view.dir == dir && view.loading && view.entries.is_empty() && self.coordinator.is_busy()
        {
            tracing::debug!(dir = %dir, "navigation already in progress");
            return Ok(());
        }
        self.begin_navigation(dir).await
    }

    /// Supersede whatever is in flight and load `dir`.
    pub async fn begin_navigation(&self, dir: DirectoryAddress) -> Result<(), ErrorKind> {
        self.persist_scroll();
        let token = self.coordinator.supersede();
        self.enter(token, dir).await
    }

    /// Navigate to the parent directory. No-op at the top.
    pub async fn up(&self) -> Result<(), ErrorKind> {
        match self.view.snapshot().dir.parent() {
            Some(parent) => self.navigate_to(parent).await,
            None => Ok(()),
        }
    }

    /// Fetch the next page of the current directory.
    ///
    /// No-op without a directory, while a fetch for this navigation is in
    /// flight, or once a short page signalled the end of the listing.
    pub async fn load_more(&self) -> Result<(), ErrorKind> {
        let view = self.view.snapshot();
        if view.dir.is_empty() || !view.has_more || self.coordinator.is_busy() {
            return Ok(());
        }

        let token = self.coordinator.current();
        let cursor = continuation_cursor(&view.entries);
        tracing::debug!(dir = %view.dir, cursor = %cursor, "loading next page");
        self.view.update(|v| {
            v.loading = true;
            v.error = None;
        });

        self.run(PageFetch {
            token,
            dir: view.dir.clone(),
            key: key_for(&view),
            cursor,
            base: Some(view.entries.clone()),
            publish_errors: true,
        })
        .await
    }

    /// Refetch the current directory from its first page after a change
    /// (upload, delete). The cached listing is replaced, not merged.
    pub async fn reload(&self) -> Result<(), ErrorKind> {
        let view = self.view.snapshot();
        if view.dir.is_empty() {
            return Ok(());
        }

        let token = self.coordinator.supersede();
        let writable = self.can_write(&view.dir);
        self.view.update(|v| {
            v.loading = true;
            v.error = None;
            v.writable = writable;
        });

        self.run(PageFetch {
            token,
            dir: view.dir.clone(),
            key: key_for(&view),
            cursor: String::new(),
            base: None,
            publish_errors: true,
        })
        .await
    }

    /// Return to the initial empty view, keeping the listing mode.
    pub fn reset(&self) {
        self.persist_scroll();
        self.coordinator.supersede();
        self.scroll_offset.set(0.0);

        let initial = ViewState::new(&self.config);
        self.view.update(|v| {
            *v = ViewState {
                shallow: v.shallow,
                sort_order: v.sort_order,
                dirs_first: v.dirs_first,
                ..initial
            };
        });
    }

    // =========================================================================
    // Listing mode
    // =========================================================================

    /// Re-sort the loaded entries. Never refetches.
    pub fn set_sort(&self, order: SortOrder) {
        if self.view.snapshot().sort_order == order {
            return;
        }
        self.view.update(|v| {
            v.sort_order = order;
            sort(&mut v.entries, order, v.dirs_first);
        });

        let view = self.view.snapshot();
        if !view.dir.is_empty() && !view.entries.is_empty() {
            self.write_entries(&key_for(&view), view.entries.clone());
        }
    }

    pub fn toggle_sort(&self) {
        self.set_sort(self.view.snapshot().sort_order.toggled());
    }

    /// Toggle the directory partition. Never refetches.
    pub fn toggle_dirs_first(&self) {
        self.view.update(|v| {
            v.dirs_first = !v.dirs_first;
            sort(&mut v.entries, v.sort_order, v.dirs_first);
        });
    }

    /// Switch between shallow and deep listings and reload the current
    /// directory under the new mode.
    pub async fn toggle_shallow(&self) -> Result<(), ErrorKind> {
        self.persist_scroll();
        self.view.update(|v| v.shallow = !v.shallow);

        let dir = self.view.snapshot().dir.clone();
        if dir.is_empty() {
            return Ok(());
        }
        let token = self.coordinator.supersede();
        self.enter(token, dir).await
    }

    // =========================================================================
    // Prefetch
    // =========================================================================

    /// Warm the cache for a directory the user is likely to open next.
    ///
    /// Skipped when the directory is the one on screen, already cached, or
    /// already being prefetched. Only the cache is written; the view and
    /// the current token are left alone. Returns whether a listing was
    /// cached.
    pub async fn prefetch(&self, raw: &str) -> bool {
        if strip_input_prefixes(raw).is_empty() {
            return false;
        }
        let dir = DirectoryAddress::parse(raw);
        let view = self.view.snapshot();
        if dir == view.dir {
            return false;
        }

        let key = CacheKey::new(dir.clone(), view.shallow, view.sort_order);
        if self.cache.borrow().contains(&key) {
            return false;
        }
        let Some(_claim) = self.prefetcher.claim(&key) else {
            return false;
        };

        tracing::debug!(key = %key, "prefetching listing");
        match self.fetch_page(&dir, "", key.shallow).await {
            Ok(page) => {
                let mut entries = page.entries;
                sort(&mut entries, key.sort, view.dirs_first);
                // a navigation may have cached a longer listing meanwhile
                self.cache
                    .borrow_mut()
                    .put_with(&key, |slot| slot.is_none().then(|| CachePatch::entries(entries)))
            }
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "prefetch failed");
                false
            }
        }
    }

    // =========================================================================
    // Fetch pipeline
    // =========================================================================

    /// Show `dir` under `token`: cached entries right away plus a
    /// revalidation, or an empty loading view plus a first-page fetch.
    async fn enter(&self, token: RequestToken, dir: DirectoryAddress) -> Result<(), ErrorKind> {
        let view = self.view.snapshot();
        let key = CacheKey::new(dir.clone(), view.shallow, view.sort_order);
        let writable = self.can_write(&dir);
        let cached = self.cache.borrow_mut().get(&key);

        match cached {
            Some(hit) => {
                tracing::debug!(key = %key, entries = hit.entries.len(), "serving cached listing");
                let mut entries = hit.entries.clone();
                sort(&mut entries, view.sort_order, view.dirs_first);
                let has_more = !entries.is_empty();
                let scroll = hit.scroll_offset;
                self.scroll_offset.set(scroll.unwrap_or(0.0));

                self.view.update(|v| {
                    v.dir = dir.clone();
                    v.entries = entries;
                    v.loading = false;
                    v.error = None;
                    v.has_more = has_more;
                    v.scroll_offset = scroll;
                    v.writable = writable;
                });

                self.run(PageFetch {
                    token,
                    dir,
                    key,
                    cursor: String::new(),
                    base: Some(hit.entries),
                    publish_errors: false,
                })
                .await
            }
            None => {
                tracing::debug!(key = %key, "cache miss");
                self.scroll_offset.set(0.0);
                self.view.update(|v| {
                    v.dir = dir.clone();
                    v.entries.clear();
                    v.loading = true;
                    v.error = None;
                    v.has_more = false;
                    v.scroll_offset = None;
                    v.writable = writable;
                });

                self.run(PageFetch {
                    token,
                    dir,
                    key,
                    cursor: String::new(),
                    base: None,
                    publish_errors: true,
                })
                .await
            }
        }
    }

    async fn run(&self, fetch: PageFetch) -> Result<(), ErrorKind> {
        let result = {
            let _in_flight = self.coordinator.track(fetch.token);
            self.fetch_page(&fetch.dir, &fetch.cursor, fetch.key.shallow)
                .await
        };

        let current = self.coordinator.is_current(fetch.token);
        match result {
            Ok(page) => self.accept(fetch, page, current),
            Err(error) => self.reject(fetch, error, current),
        }
    }

    async fn fetch_page(
        &self,
        dir: &DirectoryAddress,
        cursor: &str,
        shallow: bool,
    ) -> Result<Page, ClientError> {
        let limit = self.page_size();
        let request = ListRequest::first_page(dir, limit, shallow).after(cursor);
        let uris = self.client.list(request).await?;

        Ok(Page {
            full: uris.len() >= limit as usize,
            entries: uris.into_iter().map(|uri| Entry::from_uri(uri, dir)).collect(),
        })
    }

    fn accept(&self, fetch: PageFetch, page: Page, current: bool) -> Result<(), ErrorKind> {
        if !current {
            let dirs_first = self.view.snapshot().dirs_first;
            let captured = fetch.base.unwrap_or_default();
            self.cache.borrow_mut().put_with(&fetch.key, |slot| {
                // newer navigations may have grown the slot since this request began
                let base = slot.map_or(captured.as_slice(), |hit| hit.entries.as_slice());
                let mut merged = merge(base, &page.entries);
                sort(&mut merged, fetch.key.sort, dirs_first);
                Some(CachePatch::entries(merged))
            });
            tracing::debug!(
                token = fetch.token.value(),
                dir = %fetch.dir,
                "discarding superseded listing"
            );
            return Err(ErrorKind::Canceled);
        }

        let view = self.view.snapshot();
        let base: &[Entry] = if fetch.base.is_some() { &view.entries } else { &[] };
        let merged = merge_sorted(base, &page.entries, view.sort_order, view.dirs_first);
        self.write_entries(&key_for(&view), merged.clone());

        self.view.update(|v| {
            v.entries = merged;
            v.loading = false;
            v.error = None;
            v.has_more = page.full;
        });
        Ok(())
    }

    fn reject(&self, fetch: PageFetch, error: ClientError, current: bool) -> Result<(), ErrorKind> {
        let kind = ErrorKind::from(&error);

        if !current {
            tracing::debug!(dir = %fetch.dir, error = %error, "superseded listing failed");
            return Err(ErrorKind::Canceled);
        }
        if !fetch.publish_errors {
            tracing::debug!(dir = %fetch.dir, error = %error, "revalidation failed, keeping cached listing");
            return Ok(());
        }

        tracing::warn!(dir = %fetch.dir, error = %error, %kind, "listing failed");
        self.view.update(|v| {
            v.loading = false;
            v.error = Some(kind);
        });
        Err(kind)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn write_entries(&self, key: &CacheKey, entries: Vec<Entry>) {
        self.cache.borrow_mut().put(key, CachePatch::entries(entries));
    }

    /// Save the scroll position of the directory being left.
    fn persist_scroll(&self) {
        let view = self.view.snapshot();
        if view.dir.is_empty() {
            return;
        }
        let offset = self.scroll_offset.get();
        self.cache
            .borrow_mut()
            .put_with(&key_for(&view), |slot| slot.map(|_| CachePatch::scroll(offset)));
    }

    fn can_write(&self, dir: &DirectoryAddress) -> bool {
        !dir.is_empty()
            && self
                .access
                .borrow()
                .as_ref()
                .is_some_and(|access| access.can_write(dir))
    }
}

impl<C, S> Explorer<C, S>
where
    C: ListingClient + ContentClient,
    S: PersistedStore,
{
    /// Fetch a file for saving. The file name is the last URI segment.
    pub async fn download(&self, uri: &str) -> Result<Download, ErrorKind> {
        let content = self.client.fetch(uri).await.map_err(|e| {
            tracing::warn!(uri, error = %e, "download failed");
            ErrorKind::from(&e)
        })?;

        Ok(Download {
            file_name: file_name_of(uri).to_string(),
            bytes: content.bytes,
            content_type: content.content_type,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl<C, S> Explorer<C, S>
where
    C: ListingClient,
    S: PersistedStore,
{
    /// Pick up the window's viewport height and scroll position.
    pub fn sync_window(&self) {
        if let Some(height) = crate::utils::dom::viewport_height() {
            self.set_viewport_height(height);
        }
        if let Some(offset) = crate::utils::dom::scroll_offset() {
            self.record_scroll(offset);
        }
    }

    /// Scroll the window to the offset saved for the current directory.
    pub fn restore_scroll(&self) {
        if let Some(offset) = self.snapshot().scroll_offset {
            crate::utils::dom::scroll_to(offset);
        }
    }

    /// Mirror the current directory into the location fragment as a new
    /// history entry.
    pub fn push_location(&self) {
        let dir = self.snapshot().dir.clone();
        if !dir.is_empty() {
            Target::Directory(dir).push();
        }
    }

    /// Open the target in the page location (`#p=` or `?p=`), e.g. on load
    /// or after back/forward navigation.
    pub async fn open_location(&self) -> Option<Target> {
        let target = Target::current()?;
        self.sync_window();
        self.open(&target.share_path()).await
    }
}

fn key_for(view: &ViewState) -> CacheKey {
    CacheKey::new(view.dir.clone(), view.shallow, view.sort_order)
}

/// The listing is in ascending URI order, so the greatest URI seen is where
/// the next page starts.
fn continuation_cursor(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|e| e.uri.as_str())
        .max()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::task::Poll;

    use super::*;
    use crate::core::client::OwnerAccess;
    use crate::core::mock::{MockClient, poll_once};
    use crate::utils::storage::MemoryStore;

    const KEY: &str = "o4dksfbqk85ogzdb5osziw6befigbuxmuxkuxq8434q89uj56uyy";

    fn explorer(paths: &[&str]) -> Explorer<MockClient, MemoryStore> {
        Explorer::new(MockClient::with_paths(paths.iter().copied()), MemoryStore::new())
    }

    fn names(view: &ViewState) -> Vec<&str> {
        view.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_navigate_miss_publishes_listing() {
        let explorer = explorer(&["k/pub/b.txt", "k/pub/a/x.txt", "k/pub/c.txt"]);

        explorer.navigate("pubky://k/pub").await.unwrap();

        let view = explorer.snapshot();
        assert_eq!(view.dir.as_str(), "k/pub/");
        assert_eq!(names(&view), ["a/", "b.txt", "c.txt"]);
        assert!(!view.loading);
        assert!(view.error.is_none());
        assert!(!view.has_more);
        assert!(explorer.is_cached(&view.dir));

        let calls = explorer.client().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].directory_uri, "pubky://k/pub/");
        assert_eq!(calls[0].limit, 20);
        assert!(calls[0].shallow);
        assert!(!calls[0].recursive);
    }

    #[tokio::test]
    async fn test_blank_input_resets() {
        let explorer = explorer(&["k/pub/a.txt"]);
        explorer.navigate("k/pub/").await.unwrap();
        let token = explorer.current_token();

        explorer.navigate("   ").await.unwrap();

        let view = explorer.snapshot();
        assert!(view.dir.is_empty());
        assert!(view.entries.is_empty());
        assert!(explorer.current_token() > token);
    }

    #[test]
    fn test_last_token_wins() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        let gate_a = explorer.client().hold("k/a/");
        let gate_b = explorer.client().hold("k/b/");

        let mut first = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(first.as_mut()).is_pending());
        let mut second = pin!(explorer.navigate("k/b/"));
        assert!(poll_once(second.as_mut()).is_pending());

        gate_b.open();
        assert_eq!(poll_once(second.as_mut()), Poll::Ready(Ok(())));
        gate_a.open();
        assert_eq!(
            poll_once(first.as_mut()),
            Poll::Ready(Err(ErrorKind::Canceled))
        );

        let view = explorer.snapshot();
        assert_eq!(view.dir.as_str(), "k/b/");
        assert_eq!(names(&view), ["two.txt"]);
        assert!(!view.loading);
        // stale results still land in the cache
        assert!(explorer.is_cached(&DirectoryAddress::parse("k/a/")));
    }

    #[test]
    fn test_stale_error_is_not_published() {
        let explorer = explorer(&["k/b/two.txt"]);
        let gate_a = explorer.client().hold("k/a/");
        explorer
            .client()
            .fail_next("k/a/", ClientError::Unreachable("dns".into()));

        let mut first = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(first.as_mut()).is_pending());
        let mut second = pin!(explorer.navigate("k/b/"));
        assert_eq!(poll_once(second.as_mut()), Poll::Ready(Ok(())));

        gate_a.open();
        assert_eq!(
            poll_once(first.as_mut()),
            Poll::Ready(Err(ErrorKind::Canceled))
        );
        let view = explorer.snapshot();
        assert!(view.error.is_none());
        assert_eq!(names(&view), ["two.txt"]);
    }

    #[test]
    fn test_same_directory_navigation_deduplicated() {
        let explorer = explorer(&["k/a/one.txt"]);
        let gate = explorer.client().hold("k/a/");

        let mut first = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(first.as_mut()).is_pending());
        let token = explorer.current_token();

        let mut again = pin!(explorer.navigate("pubky://k/a"));
        assert_eq!(poll_once(again.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(explorer.current_token(), token);
        assert_eq!(explorer.client().calls().len(), 1);

        gate.open();
        assert_eq!(poll_once(first.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(names(&explorer.snapshot()), ["one.txt"]);
    }

    #[tokio::test]
    async fn test_error_published_for_current_navigation() {
        let explorer = explorer(&[]);
        explorer.client().fail_next("k/x/", ClientError::Status(404));

        assert_eq!(explorer.navigate("k/x").await, Err(ErrorKind::NotFound));

        let view = explorer.snapshot();
        assert_eq!(view.error, Some(ErrorKind::NotFound));
        assert!(!view.loading);
        assert!(!view.is_empty_result());
        assert!(!explorer.is_cached(&view.dir));
    }

    #[tokio::test]
    async fn test_empty_directory_is_empty_result() {
        let explorer = explorer(&["k/other.txt"]);
        explorer.navigate("k/empty/").await.unwrap();
        assert!(explorer.snapshot().is_empty_result());
    }

    #[tokio::test]
    async fn test_load_more_pages_until_short_page() {
        let explorer = explorer(&["k/d/f1", "k/d/f2", "k/d/f3", "k/d/f4", "k/d/f5"]);
        explorer.set_viewport_height(80.0);
        assert_eq!(explorer.page_size(), 2);

        explorer.navigate("k/d/").await.unwrap();
        assert_eq!(names(&explorer.snapshot()), ["f1", "f2"]);
        assert!(explorer.snapshot().has_more);

        explorer.load_more().await.unwrap();
        assert_eq!(names(&explorer.snapshot()), ["f1", "f2", "f3", "f4"]);
        assert_eq!(explorer.client().calls()[1].cursor, "pubky://k/d/f2");

        explorer.load_more().await.unwrap();
        let view = explorer.snapshot();
        assert_eq!(names(&view), ["f1", "f2", "f3", "f4", "f5"]);
        assert!(!view.has_more);

        explorer.load_more().await.unwrap();
        assert_eq!(explorer.client().calls().len(), 3);
    }

    #[test]
    fn test_concurrent_load_more_deduplicated() {
        let explorer = explorer(&["k/d/f1", "k/d/f2", "k/d/f3"]);
        explorer.set_viewport_height(40.0);

        let mut nav = pin!(explorer.navigate("k/d/"));
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));

        let gate = explorer.client().hold("k/d/");
        let mut first = pin!(explorer.load_more());
        assert!(poll_once(first.as_mut()).is_pending());
        assert!(explorer.snapshot().loading);

        let mut second = pin!(explorer.load_more());
        assert_eq!(poll_once(second.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(explorer.client().calls().len(), 2);

        gate.open();
        assert_eq!(poll_once(first.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(names(&explorer.snapshot()), ["f1", "f2"]);
    }

    #[test]
    fn test_load_more_superseded_by_navigation() {
        let explorer = explorer(&["k/d/f1", "k/d/f2", "k/e/g1"]);
        explorer.set_viewport_height(40.0);

        let mut nav = pin!(explorer.navigate("k/d/"));
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));

        let gate = explorer.client().hold("k/d/");
        let mut more = pin!(explorer.load_more());
        assert!(poll_once(more.as_mut()).is_pending());

        let mut away = pin!(explorer.navigate("k/e/"));
        assert_eq!(poll_once(away.as_mut()), Poll::Ready(Ok(())));

        gate.open();
        assert_eq!(
            poll_once(more.as_mut()),
            Poll::Ready(Err(ErrorKind::Canceled))
        );
        let view = explorer.snapshot();
        assert_eq!(view.dir.as_str(), "k/e/");
        assert_eq!(names(&view), ["g1"]);
    }

    #[test]
    fn test_stale_first_page_keeps_longer_cached_listing() {
        let explorer = explorer(&["k/a/f1", "k/a/f2", "k/a/f3", "k/a/f4", "k/a/f5", "k/b/g1"]);
        explorer.set_viewport_height(80.0);
        let gate = explorer.client().hold("k/a/");

        let mut stale = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(stale.as_mut()).is_pending());
        let mut away = pin!(explorer.navigate("k/b/"));
        assert_eq!(poll_once(away.as_mut()), Poll::Ready(Ok(())));
        let mut back = pin!(explorer.navigate("k/a/"));
        assert_eq!(poll_once(back.as_mut()), Poll::Ready(Ok(())));
        let mut more = pin!(explorer.load_more());
        assert_eq!(poll_once(more.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(names(&explorer.snapshot()), ["f1", "f2", "f3", "f4"]);

        gate.open();
        assert_eq!(
            poll_once(stale.as_mut()),
            Poll::Ready(Err(ErrorKind::Canceled))
        );

        let view = explorer.snapshot();
        assert_eq!(names(&view), ["f1", "f2", "f3", "f4"]);
        let cached = explorer.cache.borrow().peek(&key_for(&view)).unwrap();
        assert_eq!(cached.entries.len(), 4);
    }

    #[test]
    fn test_cache_hit_then_revalidate() {
        let explorer = explorer(&["k/a/one.txt", "k/b/x.txt"]);

        let mut nav = pin!(explorer.navigate("k/a/"));
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));
        let mut nav = pin!(explorer.navigate("k/b/"));
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));

        explorer.client().insert("k/a/two.txt");
        let gate = explorer.client().hold("k/a/");
        let mut back = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(back.as_mut()).is_pending());

        let view = explorer.snapshot();
        assert_eq!(view.dir.as_str(), "k/a/");
        assert_eq!(names(&view), ["one.txt"]);
        assert!(!view.loading);

        gate.open();
        assert_eq!(poll_once(back.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(names(&explorer.snapshot()), ["one.txt", "two.txt"]);
    }

    #[tokio::test]
    async fn test_revalidation_failure_keeps_cached_listing() {
        let explorer = explorer(&["k/a/one.txt", "k/b/x.txt"]);
        explorer.navigate("k/a/").await.unwrap();
        explorer.navigate("k/b/").await.unwrap();

        explorer
            .client()
            .fail_next("k/a/", ClientError::Unreachable("offline".into()));
        explorer.navigate("k/a/").await.unwrap();

        let view = explorer.snapshot();
        assert!(view.error.is_none());
        assert_eq!(names(&view), ["one.txt"]);
    }

    #[test]
    fn test_prefetch_leaves_view_alone() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        let gate = explorer.client().hold("k/a/");

        let mut nav = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(nav.as_mut()).is_pending());
        let token = explorer.current_token();
        let before = explorer.snapshot();

        let mut warm = pin!(explorer.prefetch("k/b/"));
        assert_eq!(poll_once(warm.as_mut()), Poll::Ready(true));

        assert_eq!(explorer.current_token(), token);
        assert_eq!(*explorer.snapshot(), *before);
        assert!(explorer.snapshot().loading);
        assert!(explorer.is_cached(&DirectoryAddress::parse("k/b/")));

        gate.open();
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(names(&explorer.snapshot()), ["one.txt"]);
    }

    #[tokio::test]
    async fn test_prefetch_skips_current_and_cached() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        explorer.navigate("k/a/").await.unwrap();

        assert!(!explorer.prefetch("k/a").await);
        assert!(explorer.prefetch("k/b").await);
        assert!(!explorer.prefetch("pubky://k/b/").await);
        assert!(!explorer.prefetch("").await);
        assert_eq!(explorer.client().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_prefetched_directory_served_from_cache() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        explorer.navigate("k/a/").await.unwrap();
        explorer.prefetch("k/b/").await;

        let gate = explorer.client().hold("k/b/");
        let mut nav = pin!(explorer.navigate("k/b/"));
        assert!(poll_once(nav.as_mut()).is_pending());
        assert_eq!(names(&explorer.snapshot()), ["two.txt"]);

        gate.open();
        assert_eq!(poll_once(nav.as_mut()), Poll::Ready(Ok(())));
    }

    #[tokio::test]
    async fn test_sort_changes_do_not_refetch() {
        let explorer = explorer(&["k/d/x", "k/d/b/1", "k/d/a/1"]);
        explorer.navigate("k/d/").await.unwrap();
        assert_eq!(names(&explorer.snapshot()), ["a/", "b/", "x"]);

        explorer.set_sort(SortOrder::Desc);
        assert_eq!(names(&explorer.snapshot()), ["b/", "a/", "x"]);

        explorer.toggle_dirs_first();
        assert_eq!(names(&explorer.snapshot()), ["x", "b/", "a/"]);

        explorer.toggle_sort();
        assert_eq!(explorer.snapshot().sort_order, SortOrder::Asc);
        assert_eq!(names(&explorer.snapshot()), ["a/", "b/", "x"]);

        assert_eq!(explorer.client().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_shallow_and_deep_are_cached_separately() {
        let explorer = explorer(&["k/d/a.txt", "k/d/b/c.txt"]);
        explorer.navigate("k/d/").await.unwrap();
        assert_eq!(names(&explorer.snapshot()), ["b/", "a.txt"]);

        explorer.toggle_shallow().await.unwrap();
        let view = explorer.snapshot();
        assert!(!view.shallow);
        assert_eq!(names(&view), ["a.txt", "b/c.txt"]);
        assert_eq!(explorer.cached_slots(), 2);

        let calls = explorer.client().calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[1].shallow);
    }

    #[tokio::test]
    async fn test_scroll_restored_from_cache() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        explorer.navigate("k/a/").await.unwrap();
        assert_eq!(explorer.snapshot().scroll_offset, None);
        explorer.record_scroll(320.0);

        explorer.navigate("k/b/").await.unwrap();
        explorer.record_scroll(15.0);
        explorer.navigate("k/a/").await.unwrap();

        assert_eq!(explorer.snapshot().scroll_offset, Some(320.0));
    }

    #[tokio::test]
    async fn test_reload_replaces_cached_listing() {
        let explorer = explorer(&["k/a/one.txt", "k/a/two.txt"]);
        explorer.navigate("k/a/").await.unwrap();

        explorer.client().remove("k/a/two.txt");
        explorer.reload().await.unwrap();
        assert_eq!(names(&explorer.snapshot()), ["one.txt"]);

        // the cache no longer carries the deleted entry either
        explorer.navigate("k/b/").await.unwrap();
        let gate = explorer.client().hold("k/a/");
        let mut back = pin!(explorer.navigate("k/a/"));
        assert!(poll_once(back.as_mut()).is_pending());
        assert_eq!(names(&explorer.snapshot()), ["one.txt"]);
        gate.open();
        assert_eq!(poll_once(back.as_mut()), Poll::Ready(Ok(())));
    }

    #[tokio::test]
    async fn test_up() {
        let explorer = explorer(&[]);
        explorer.navigate("k/pub/app/").await.unwrap();

        explorer.up().await.unwrap();
        assert_eq!(explorer.snapshot().dir.as_str(), "k/pub/");
        explorer.up().await.unwrap();
        assert_eq!(explorer.snapshot().dir.as_str(), "k/");

        let token = explorer.current_token();
        explorer.up().await.unwrap();
        assert_eq!(explorer.snapshot().dir.as_str(), "k/");
        assert_eq!(explorer.current_token(), token);
    }

    #[tokio::test]
    async fn test_open_file_target() {
        let path = format!("{}/pub/app/profile.json", KEY);
        let explorer = explorer(&[path.as_str()]);

        let target = explorer.open(&format!("pubky{}", path)).await;

        assert_eq!(
            target,
            Some(Target::File {
                dir: DirectoryAddress::parse(&format!("{}/pub/app/", KEY)),
                name: "profile.json".to_string(),
            })
        );
        assert_eq!(names(&explorer.snapshot()), ["profile.json"]);
    }

    #[tokio::test]
    async fn test_writable_follows_access() {
        let explorer = Explorer::new(MockClient::new(), MemoryStore::new())
            .with_write_access(OwnerAccess::new(KEY));

        explorer.navigate(KEY).await.unwrap();
        assert!(explorer.snapshot().writable);

        explorer.navigate("someone/pub/").await.unwrap();
        assert!(!explorer.snapshot().writable);

        explorer.set_write_access(Some(Box::new(|_: &DirectoryAddress| true)));
        assert!(explorer.snapshot().writable);
        explorer.set_write_access(None);
        assert!(!explorer.snapshot().writable);
    }

    #[tokio::test]
    async fn test_download() {
        let explorer = explorer(&[]);
        explorer
            .client()
            .put_content("k/pub/photo.png", vec![1u8, 2, 3], Some("image/png"));

        let download = explorer.download("pubky://k/pub/photo.png").await.unwrap();
        assert_eq!(download.file_name, "photo.png");
        assert_eq!(download.bytes, [1, 2, 3]);
        assert_eq!(download.content_type.as_deref(), Some("image/png"));

        assert_eq!(
            explorer.download("pubky://k/pub/missing").await,
            Err(ErrorKind::NotFound)
        );

        explorer
            .client()
            .fail_content("k/pub/photo.png", ClientError::Status(403));
        assert_eq!(
            explorer.download("pubky://k/pub/photo.png").await,
            Err(ErrorKind::Forbidden)
        );
        assert!(explorer.download("pubky://k/pub/photo.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_receive_each_publish() {
        let explorer = explorer(&["k/a/one.txt"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        explorer.subscribe(move |view| sink.borrow_mut().push((view.loading, view.entries.len())));

        explorer.navigate("k/a/").await.unwrap();

        assert_eq!(*seen.borrow(), vec![(true, 0), (false, 1)]);
    }

    #[tokio::test]
    async fn test_cache_capacity_bounds_slots() {
        let config = ExplorerConfig {
            cache_capacity: 2,
            ..ExplorerConfig::default()
        };
        let explorer = Explorer::with_config(MockClient::new(), MemoryStore::new(), config);

        for dir in ["k/a/", "k/b/", "k/c/"] {
            explorer.navigate(dir).await.unwrap();
        }

        assert_eq!(explorer.cached_slots(), 2);
        assert!(!explorer.is_cached(&DirectoryAddress::parse("k/a/")));
    }

    #[tokio::test]
    async fn test_clear_cache_keeps_view() {
        let explorer = explorer(&["k/a/one.txt", "k/b/two.txt"]);
        explorer.navigate("k/a/").await.unwrap();
        explorer.navigate("k/b/").await.unwrap();

        explorer.clear_cache();

        assert_eq!(explorer.cached_slots(), 0);
        assert_eq!(names(&explorer.snapshot()), ["two.txt"]);
        explorer.navigate("k/a/").await.unwrap();
        assert_eq!(explorer.client().calls_for("k/a/").len(), 2);
    }
}
