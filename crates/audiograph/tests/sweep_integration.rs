//! Integration tests for the sync engine and the bulk sweep.
//!
//! These tests drive the public API end to end over a scripted
//! transport and ensure the flows complete within reasonable timeouts
//! rather than hanging on guard, semaphore, or cursor bugs.
//!
//! Key scenarios tested:
//! - A two-page sweep fetches favorites for every distinct following
//! - Direct page-by-page sync chains server continuation URLs
//! - Concurrent syncs of one stream: one proceeds, one is rejected
//! - Transport retries are invisible to the engine
//! - Progress events flow through both the engine and the sweep

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use audiograph::store::EntityStore;
use audiograph::sync::{
    Cursor, CursorTracker, ProgressCallback, ResourceStream, StreamGuard, SweepOptions,
    SyncProgress, Synchronizer, sweep_followings,
};
use audiograph::{
    ApiClient, EntityKind, HttpError, HttpRequest, HttpResponse, HttpTransport, RetryConfig,
    RetryingTransport,
};

/// Maximum time any sync operation should take in tests.
/// If exceeded, there's likely a hang/deadlock.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Shorter timeout for operations that should be nearly instant.
const FAST_TIMEOUT: Duration = Duration::from_secs(2);

const HOST: &str = "https://api.test.invalid";

/// Canned-response transport driven by a URL-keyed script.
///
/// Multiple responses for one URL are served in FIFO order; every
/// request is recorded for later assertions.
#[derive(Clone, Default)]
struct ScriptedTransport {
    inner: Arc<Mutex<ScriptedInner>>,
}

#[derive(Default)]
struct ScriptedInner {
    routes: HashMap<String, VecDeque<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn push_json(&self, url: impl Into<String>, body: &serde_json::Value) {
        self.push_response(
            url,
            HttpResponse {
                status: 200,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: serde_json::to_vec(body).expect("serialize scripted body"),
            },
        );
    }

    fn push_status(&self, url: impl Into<String>, status: u16) {
        self.push_response(
            url,
            HttpResponse {
                status,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );
    }

    fn push_response(&self, url: impl Into<String>, response: HttpResponse) {
        self.inner
            .lock()
            .unwrap()
            .routes
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    fn requested_urls(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut inner = self.inner.lock().unwrap();
        let url = request.url.clone();
        inner.requests.push(request);

        match inner.routes.get_mut(&url).and_then(|q| q.pop_front()) {
            Some(resp) => Ok(resp),
            None => Err(HttpError::Transport(format!(
                "no scripted response for {url}"
            ))),
        }
    }
}

fn synchronizer(transport: Arc<dyn HttpTransport>) -> Synchronizer {
    let client = ApiClient::with_transport(HOST, None, transport);
    Synchronizer::new(
        client,
        Arc::new(EntityStore::new()),
        Arc::new(CursorTracker::new()),
        Arc::new(StreamGuard::new()),
    )
}

fn followings_first_page_url() -> String {
    format!("{HOST}/me/followings?limit=20&offset=0")
}

fn favorites_url(user_id: u64) -> String {
    format!("{HOST}/users/{user_id}/favorites?linked_partitioning=1&limit=200&offset=0")
}

fn followings_page(ids: &[u64], next_href: Option<&str>) -> serde_json::Value {
    let collection: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "username": format!("user-{id}")}))
        .collect();
    json!({"collection": collection, "next_href": next_href})
}

fn favorites_page(track_ids: &[u64], uploader: u64) -> serde_json::Value {
    let collection: Vec<serde_json::Value> = track_ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "title": format!("track-{id}"),
                "user": {"id": uploader, "username": format!("user-{uploader}")}
            })
        })
        .collect();
    json!({"collection": collection, "next_href": null})
}

// ─── Bulk Sweep Tests ──────────────────────────────────────────────────────────
// End-to-end runs of sweep_followings over scripted followings pages.

/// Two followings pages chained by next_href: the sweep must fetch
/// exactly those two pages, prefetch favorites for each following, and
/// leave the followings cursor exhausted.
#[tokio::test]
async fn test_sweep_two_pages_fetches_favorites_for_each_following() {
    let transport = ScriptedTransport::new();
    let page2 = format!("{HOST}/me/followings?cursor=page2");
    transport.push_json(&followings_first_page_url(), &followings_page(&[1], Some(&page2)));
    transport.push_json(&page2, &followings_page(&[2], None));
    transport.push_json(&favorites_url(1), &favorites_page(&[100, 101], 1));
    transport.push_json(&favorites_url(2), &favorites_page(&[200], 2));

    let sync = synchronizer(Arc::new(transport.clone()));
    let result = tokio::time::timeout(
        SYNC_TIMEOUT,
        sweep_followings(&sync, None, &SweepOptions::default()),
    )
    .await;

    assert!(result.is_ok(), "Sweep should complete, not hang");
    let summary = result.unwrap().expect("sweep succeeds");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.followings, 2);
    assert_eq!(summary.favorites_fetched, 2);
    assert_eq!(summary.favorites_merged, 5, "three tracks plus their two uploaders");
    assert!(!summary.has_errors());

    let urls = transport.requested_urls();
    let followings_fetches = urls.iter().filter(|u| u.contains("/followings")).count();
    assert_eq!(followings_fetches, 2, "exactly one fetch per page");
    assert!(urls.contains(&favorites_url(1)));
    assert!(urls.contains(&favorites_url(2)));

    assert_eq!(
        sync.cursors().get(ResourceStream::Followings),
        Cursor::Exhausted
    );
    assert!(sync.store().contains(EntityKind::User, 1));
    assert!(sync.store().contains(EntityKind::User, 2));
    assert!(sync.store().contains(EntityKind::Track, 100));
    assert!(sync.store().contains(EntityKind::Track, 200));
}

/// A following that appears on two pages gets one favorites fetch.
#[tokio::test]
async fn test_sweep_dedups_followings_across_pages() {
    let transport = ScriptedTransport::new();
    let page2 = format!("{HOST}/me/followings?cursor=page2");
    transport.push_json(
        &followings_first_page_url(),
        &followings_page(&[1, 42], Some(&page2)),
    );
    transport.push_json(&page2, &followings_page(&[42, 2], None));
    transport.push_json(&favorites_url(1), &favorites_page(&[100], 1));
    transport.push_json(&favorites_url(42), &favorites_page(&[420], 42));
    transport.push_json(&favorites_url(2), &favorites_page(&[200], 2));

    let sync = synchronizer(Arc::new(transport.clone()));
    let summary = tokio::time::timeout(
        SYNC_TIMEOUT,
        sweep_followings(&sync, None, &SweepOptions::default()),
    )
    .await
    .expect("sweep should complete, not hang")
    .expect("sweep succeeds");

    assert_eq!(summary.followings, 3, "user 42 counts once");
    assert_eq!(summary.favorites_fetched, 3);

    let fetches_for_42 = transport
        .requested_urls()
        .iter()
        .filter(|u| u.contains("/users/42/favorites"))
        .count();
    assert_eq!(fetches_for_42, 1);
}

/// An empty followings page still exhausts the stream and finishes.
#[tokio::test]
async fn test_sweep_with_no_followings_completes_fast() {
    let transport = ScriptedTransport::new();
    transport.push_json(&followings_first_page_url(), &followings_page(&[], None));

    let sync = synchronizer(Arc::new(transport));
    let result = tokio::time::timeout(
        FAST_TIMEOUT,
        sweep_followings(&sync, None, &SweepOptions::default()),
    )
    .await;

    assert!(result.is_ok(), "Empty sweep should finish almost instantly");
    let summary = result.unwrap().expect("sweep succeeds");
    assert_eq!(summary.followings, 0);
    assert!(sync.store().is_empty());
}

// ─── Direct Sync Tests ─────────────────────────────────────────────────────────
// Page-by-page sync calls through the public API.

/// Each sync call fetches one page; the next call continues from the
/// stored cursor until the stream reports no further page.
#[tokio::test]
async fn test_sync_loop_chains_cursors_until_exhausted() {
    let transport = ScriptedTransport::new();
    let page2 = format!("{HOST}/me/followings?cursor=page2");
    let page3 = format!("{HOST}/me/followings?cursor=page3");
    transport.push_json(&followings_first_page_url(), &followings_page(&[1], Some(&page2)));
    transport.push_json(&page2, &followings_page(&[2], Some(&page3)));
    transport.push_json(&page3, &followings_page(&[3], None));

    let sync = synchronizer(Arc::new(transport.clone()));

    let mut pages = 0;
    let result = tokio::time::timeout(SYNC_TIMEOUT, async {
        loop {
            let report = sync
                .sync(ResourceStream::Followings, None, false)
                .await
                .expect("page sync");
            if report.cursor.is_exhausted() {
                break;
            }
            pages += 1;
            assert!(pages < 10, "cursor chain must terminate");
        }
    })
    .await;
    assert!(result.is_ok(), "Sync loop should terminate, not hang");

    assert_eq!(
        transport.requested_urls(),
        vec![followings_first_page_url(), page2, page3],
        "each page is fetched once, from the server-issued URL"
    );
    for id in [1, 2, 3] {
        assert!(sync.store().contains(EntityKind::User, id));
    }

    // A further call is a no-op against the exhausted cursor.
    let report = sync
        .sync(ResourceStream::Followings, None, false)
        .await
        .expect("exhausted sync");
    assert_eq!(report.fetched, 0);
    assert_eq!(transport.requested_urls().len(), 3);
}

/// The four streams track cursors independently.
#[tokio::test]
async fn test_streams_have_independent_cursors() {
    let transport = ScriptedTransport::new();
    transport.push_json(&followings_first_page_url(), &followings_page(&[1], None));
    transport.push_json(
        format!("{HOST}/me/followers?limit=20&offset=0"),
        &followings_page(&[2], Some("https://api.test.invalid/me/followers?cursor=x")),
    );

    let sync = synchronizer(Arc::new(transport));
    sync.sync(ResourceStream::Followings, None, false)
        .await
        .expect("followings");
    sync.sync(ResourceStream::Followers, None, false)
        .await
        .expect("followers");

    assert!(sync.cursors().get(ResourceStream::Followings).is_exhausted());
    assert!(!sync.cursors().get(ResourceStream::Followers).is_exhausted());
    assert_eq!(sync.cursors().get(ResourceStream::Activities), Cursor::Unset);
}

/// An activities page is classified before normalization: posts and
/// reposts contribute their origin tracks, everything else is skipped.
#[tokio::test]
async fn test_activities_stream_end_to_end() {
    let transport = ScriptedTransport::new();
    transport.push_json(
        format!("{HOST}/me/activities?limit=20&offset=0"),
        &json!({
            "collection": [
                {"type": "track", "origin": {"id": 10, "title": "Post",
                    "user": {"id": 3, "username": "kay"}}},
                {"type": "track-repost", "origin": {"id": 11, "title": "Repost"}},
                {"type": "playlist", "origin": {"id": 99, "title": "Skip me"}},
                {"type": "comment"}
            ],
            "next_href": null
        }),
    );

    let sync = synchronizer(Arc::new(transport));
    let report = sync
        .sync(ResourceStream::Activities, None, false)
        .await
        .expect("activities page");

    assert_eq!(report.fetched, 4);
    assert_eq!(report.ids, vec![10, 11]);
    assert_eq!(report.track_refs.len(), 2);
    assert!(sync.store().contains(EntityKind::Track, 10));
    assert!(sync.store().contains(EntityKind::Track, 11));
    assert!(!sync.store().contains(EntityKind::Track, 99));
}

// ─── Concurrency Tests ─────────────────────────────────────────────────────────
// These tests verify the per-stream guard under genuinely overlapping calls.

/// Transport that parks the first request until released, so a second
/// sync can be attempted while the first is genuinely in flight.
struct ParkingTransport {
    inner: ScriptedTransport,
    entered: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl HttpTransport for ParkingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.send(request).await
    }
}

/// While one sync of a stream is awaiting the network, a second sync of
/// the same stream is rejected and fetches nothing.
#[tokio::test]
async fn test_concurrent_syncs_of_one_stream_one_wins() {
    let scripted = ScriptedTransport::new();
    scripted.push_json(&followings_first_page_url(), &followings_page(&[1], None));

    let entered = Arc::new(tokio::sync::Notify::new());
    let release = Arc::new(tokio::sync::Notify::new());
    let transport = ParkingTransport {
        inner: scripted.clone(),
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    };

    let sync = synchronizer(Arc::new(transport));
    let sync_clone = sync.clone();

    let result = tokio::time::timeout(SYNC_TIMEOUT, async move {
        let first = tokio::spawn(async move {
            sync_clone.sync(ResourceStream::Followings, None, false).await
        });

        // Wait until the first sync is parked inside the transport.
        entered.notified().await;

        let second = sync.sync(ResourceStream::Followings, None, false).await;
        assert!(
            second.expect_err("second sync must be rejected").is_already_in_progress()
        );

        release.notify_one();
        let report = first.await.expect("first sync task").expect("first sync");
        assert_eq!(report.ids, vec![1]);

        // With the stream idle again, a sync is accepted (and finds the
        // cursor exhausted).
        let after = sync
            .sync(ResourceStream::Followings, None, false)
            .await
            .expect("post-completion sync");
        assert_eq!(after.fetched, 0);
    })
    .await;

    assert!(result.is_ok(), "Guard handoff should complete, not deadlock");
    assert_eq!(
        scripted.requested_urls().len(),
        1,
        "the rejected sync must not reach the network"
    );
}

// ─── Transport Stack Tests ─────────────────────────────────────────────────────
// The engine composed over the retrying transport decorator.

/// A flaky server error is retried below the engine; the sync call
/// sees only the eventual success.
#[tokio::test]
async fn test_sync_with_retrying_transport_recovers_from_server_errors() {
    let scripted = ScriptedTransport::new();
    scripted.push_status(&followings_first_page_url(), 503);
    scripted.push_json(&followings_first_page_url(), &followings_page(&[1], None));

    let retrying = RetryingTransport::new(
        Arc::new(scripted.clone()),
        RetryConfig::new(Duration::from_millis(1), Duration::from_millis(5), 3).with_jitter(false),
    );
    let sync = synchronizer(Arc::new(retrying));

    let report = tokio::time::timeout(
        SYNC_TIMEOUT,
        sync.sync(ResourceStream::Followings, None, false),
    )
    .await
    .expect("retrying sync should complete, not hang")
    .expect("sync succeeds after retry");

    assert_eq!(report.ids, vec![1]);
    assert_eq!(
        scripted.requested_urls().len(),
        2,
        "one failed attempt plus one retry"
    );
}

// ─── Progress Callback Tests ───────────────────────────────────────────────────

/// Progress events from the engine and the sweep arrive on one callback.
#[tokio::test]
async fn test_progress_events_flow_through_engine_and_sweep() {
    let transport = ScriptedTransport::new();
    let page2 = format!("{HOST}/me/followings?cursor=page2");
    transport.push_json(&followings_first_page_url(), &followings_page(&[1], Some(&page2)));
    transport.push_json(&page2, &followings_page(&[2], None));
    transport.push_json(&favorites_url(1), &favorites_page(&[100], 1));
    transport.push_json(&favorites_url(2), &favorites_page(&[200], 2));

    let events: Arc<Mutex<Vec<SyncProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        events_clone.lock().unwrap().push(event);
    });

    let sync = synchronizer(Arc::new(transport)).with_progress(Arc::new(callback));
    tokio::time::timeout(
        SYNC_TIMEOUT,
        sweep_followings(&sync, None, &SweepOptions::default()),
    )
    .await
    .expect("sweep should complete, not hang")
    .expect("sweep succeeds");

    let events = events.lock().unwrap();
    let count = |pred: fn(&SyncProgress) -> bool| events.iter().filter(|e| pred(e)).count();

    assert_eq!(count(|e| matches!(e, SyncProgress::SweepStarted)), 1);
    assert_eq!(count(|e| matches!(e, SyncProgress::SweepPage { .. })), 2);
    assert_eq!(
        count(|e| matches!(e, SyncProgress::FetchStarted { .. })),
        2,
        "one per followings page; one-shot favorites fetches do not emit these"
    );
    assert_eq!(
        count(|e| matches!(e, SyncProgress::FavoritesScheduled { .. })),
        2
    );
    assert_eq!(
        count(|e| matches!(e, SyncProgress::FavoritesFetched { .. })),
        2
    );
    assert_eq!(count(|e| matches!(e, SyncProgress::SweepFinished { .. })), 1);
}

// ─── Cancellation Tests ────────────────────────────────────────────────────────

/// A pre-raised shutdown flag stops the sweep before any fetch.
#[tokio::test]
async fn test_pre_raised_shutdown_flag_cancels_sweep_immediately() {
    let transport = ScriptedTransport::new();
    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::Release);

    let sync = synchronizer(Arc::new(transport.clone())).with_shutdown_flag(Arc::clone(&flag));
    let summary = tokio::time::timeout(
        FAST_TIMEOUT,
        sweep_followings(&sync, None, &SweepOptions::default()),
    )
    .await
    .expect("cancelled sweep should return immediately")
    .expect("a cancelled sweep is not an error");

    assert!(summary.cancelled);
    assert_eq!(summary.pages, 0);
    assert!(transport.requested_urls().is_empty());
}
