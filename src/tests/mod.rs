use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::PagerConfig;
use crate::feed::FeedClient;
use crate::pager::Pager;
use crate::render::{HtmlView, Node};
use crate::store::{KeyValueStore, MemoryStore, PostCache, PostDateLedger, STORE_KEY};

fn post_dates(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("2023-12-31T{:02}:{:02}:00Z", 23 - i / 60, 59 - i % 60))
        .collect()
}

fn with_millis(date: &str) -> String {
    format!("{}.123Z", date.trim_end_matches('Z'))
}

fn feed_body(total: usize, updated: &str, dates: &[String]) -> Value {
    let entries: Vec<Value> = dates
        .iter()
        .map(|d| json!({ "published": { "$t": with_millis(d) } }))
        .collect();
    json!({
        "feed": {
            "openSearch$totalResults": { "$t": total.to_string() },
            "updated": { "$t": updated },
            "entry": entries
        }
    })
}

async fn mount_snapshot(server: &MockServer, total: usize, updated: &str) {
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/"))
        .and(query_param("max-results", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(total, updated, &[])))
        .mount(server)
        .await;
}

async fn mount_batch(server: &MockServer, start_index: usize, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/"))
        .and(query_param("max-results", "150"))
        .and(query_param("start-index", start_index.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn config(server: &MockServer, max_results: usize) -> PagerConfig {
    PagerConfig {
        home_url: server.uri(),
        max_results: Some(max_results),
        ..PagerConfig::default()
    }
}

fn seeded_store(ledger: &PostDateLedger) -> MemoryStore {
    let mut cache = PostCache::new(MemoryStore::new());
    cache.set(None, None, ledger).unwrap();
    cache.into_store()
}

fn pager(server: &MockServer, config: PagerConfig, store: MemoryStore) -> Pager<MemoryStore, HtmlView> {
    let feed = FeedClient::with_client(reqwest::Client::new(), &server.uri());
    Pager::new(config, feed, store, HtmlView::new(None))
}

fn link_texts(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| match n {
            Node::Link { text, .. } => text.clone(),
            Node::Dots { .. } | Node::Jump { .. } => "...".to_string(),
        })
        .collect()
}

#[tokio::test]
async fn first_visit_fetches_and_caches_everything() {
    let server = MockServer::start().await;
    let dates = post_dates(12);
    mount_snapshot(&server, 12, "2024-02-01T00:00:00Z").await;
    mount_batch(&server, 1, feed_body(12, "2024-02-01T00:00:00Z", &dates), 1).await;

    let mut pager = pager(&server, config(&server, 5), MemoryStore::new());
    let outcome = pager.init().await.unwrap();

    assert!(!outcome.rendered_from_cache);
    assert!(outcome.fetched_snapshot);
    assert!(outcome.fetched_post_dates);
    assert!(!outcome.pager_removed);
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
    assert_eq!(pager.current_page(), Some(1));

    let cached = pager.cache().get(None, None);
    assert_eq!(cached.total_posts, 12);
    assert_eq!(cached.post_dates, dates);
    assert_eq!(cached.blog_updated.as_deref(), Some("2024-02-01T00:00:00Z"));

    match &pager.view().numbers[1] {
        Node::Link { href, .. } => assert_eq!(
            href,
            &format!(
                "{}/search?updated-max={}&max-results=5&start=5&by-date=false",
                server.uri(),
                dates[4].replace(':', "%3A")
            )
        ),
        other => panic!("unexpected node {other:?}"),
    }
}

#[tokio::test]
async fn stale_cache_triggers_refetch_and_overwrite() {
    let server = MockServer::start().await;
    let old = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-01-01".to_string()),
    };
    let fresh = post_dates(14);
    mount_snapshot(&server, 14, "2024-02-01").await;
    mount_batch(&server, 1, feed_body(14, "2024-02-01", &fresh), 1).await;

    let cfg = PagerConfig {
        check_for_updates: true,
        ..config(&server, 5)
    };
    let mut pager = pager(&server, cfg, seeded_store(&old));
    let outcome = pager.init().await.unwrap();

    assert!(outcome.rendered_from_cache);
    assert!(outcome.fetched_post_dates);
    assert_eq!(pager.view().renders, 2);

    let cached = pager.cache().get(None, None);
    assert_eq!(cached.total_posts, 14);
    assert_eq!(cached.post_dates, fresh);
    assert_eq!(cached.blog_updated.as_deref(), Some("2024-02-01"));
}

#[tokio::test]
async fn current_cache_skips_ledger_fetch() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-02-01".to_string()),
    };
    mount_snapshot(&server, 12, "2024-02-01").await;
    mount_batch(&server, 1, feed_body(12, "2024-02-01", &post_dates(12)), 0).await;

    let cfg = PagerConfig {
        check_for_updates: true,
        ..config(&server, 5)
    };
    let mut pager = pager(&server, cfg, seeded_store(&cached));
    let outcome = pager.init().await.unwrap();

    assert!(outcome.rendered_from_cache);
    assert!(outcome.fetched_snapshot);
    assert!(!outcome.fetched_post_dates);
    assert_eq!(pager.view().renders, 1);
}

#[tokio::test]
async fn cached_render_without_update_check_stays_offline() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-02-01".to_string()),
    };

    let mut pager = pager(&server, config(&server, 5), seeded_store(&cached));
    let outcome = pager.init().await.unwrap();

    assert!(outcome.rendered_from_cache);
    assert!(!outcome.fetched_snapshot);
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn single_page_removes_pager_from_cache_branch() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 4,
        post_dates: post_dates(4),
        blog_updated: Some("2024-02-01".to_string()),
    };

    let mut pager = pager(&server, config(&server, 5), seeded_store(&cached));
    let outcome = pager.init().await.unwrap();

    assert!(outcome.pager_removed);
    assert!(pager.view().is_removed());
}

#[tokio::test]
async fn single_page_removes_pager_from_fetch_branch() {
    let server = MockServer::start().await;
    mount_snapshot(&server, 5, "2024-02-01").await;
    mount_batch(&server, 1, feed_body(5, "2024-02-01", &post_dates(5)), 1).await;

    let mut pager = pager(&server, config(&server, 5), MemoryStore::new());
    let outcome = pager.init().await.unwrap();

    assert!(outcome.fetched_post_dates);
    assert!(outcome.pager_removed);
    assert!(pager.view().is_removed());
}

#[tokio::test]
async fn batches_are_joined_in_request_order() {
    let server = MockServer::start().await;
    let dates = post_dates(320);
    mount_snapshot(&server, 320, "u").await;
    for (batch, chunk) in dates.chunks(150).enumerate() {
        let delay = Duration::from_millis(150 - 60 * batch as u64);
        Mock::given(method("GET"))
            .and(path("/feeds/posts/summary/"))
            .and(query_param("start-index", (batch * 150 + 1).to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(feed_body(320, "u", chunk))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut pager = pager(&server, config(&server, 10), MemoryStore::new());
    pager.init().await.unwrap();

    let cached = pager.cache().get(None, None);
    assert_eq!(cached.post_dates, dates);
    assert_eq!(cached.total_posts, 320);
}

#[tokio::test]
async fn search_total_is_summed_across_batches() {
    let server = MockServer::start().await;
    mount_snapshot(&server, 200, "u").await;
    let found = post_dates(7);
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/"))
        .and(query_param("q", "rust"))
        .and(query_param("orderby", "relevance"))
        .and(query_param("start-index", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(7, "u", &found)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/"))
        .and(query_param("q", "rust"))
        .and(query_param("start-index", "151"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(7, "u", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = PagerConfig {
        query: Some("rust".to_string()),
        ..config(&server, 3)
    };
    let mut pager = pager(&server, cfg, MemoryStore::new());
    pager.init().await.unwrap();

    let cached = pager.cache().get(Some("rust"), None);
    assert_eq!(cached.total_posts, 14);
    assert_eq!(cached.post_dates, found);
    assert_eq!(pager.cache().get(None, None), PostDateLedger::default());
    // 14 posts at 3 per page
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn feed_failure_keeps_cached_render() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let cached = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-02-01".to_string()),
    };

    let cfg = PagerConfig {
        check_for_updates: true,
        ..config(&server, 5)
    };
    let mut pager = pager(&server, cfg, seeded_store(&cached));
    let err = pager.init().await.unwrap_err();

    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
    assert!(!pager.view().is_removed());
}

#[tokio::test]
async fn malformed_feed_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let mut pager = pager(&server, config(&server, 5), MemoryStore::new());
    assert!(pager.init().await.is_err());
    assert!(pager.view().numbers.is_empty());
}

#[tokio::test]
async fn missing_containers_is_a_no_op() {
    let server = MockServer::start().await;
    let feed = FeedClient::with_client(reqwest::Client::new(), &server.uri());
    let view = HtmlView {
        numbers_present: false,
        ..HtmlView::new(None)
    };
    let mut pager = Pager::new(config(&server, 5), feed, MemoryStore::new(), view);
    let outcome = pager.init().await.unwrap();

    assert!(outcome.skipped);
    assert_eq!(pager.view().renders, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn entry_count_stands_in_for_page_size() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-02-01".to_string()),
    };
    let cfg = PagerConfig {
        home_url: server.uri(),
        ..PagerConfig::default()
    };
    let feed = FeedClient::with_client(reqwest::Client::new(), &server.uri());
    let mut pager = Pager::new(cfg, feed, seeded_store(&cached), HtmlView::new(Some(4)));
    pager.init().await.unwrap();

    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn pager_link_sets_page_size() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 12,
        post_dates: post_dates(12),
        blog_updated: Some("2024-02-01".to_string()),
    };
    let feed = FeedClient::with_client(reqwest::Client::new(), &server.uri());
    let view = HtmlView::new(Some(10)).with_pager_links(vec![format!(
        "{}/search?updated-max=2024-01-01T00%3A00%3A00Z&max-results=4",
        server.uri()
    )]);
    let mut pager = Pager::new(config(&server, 6), feed, seeded_store(&cached), view);
    pager.init().await.unwrap();

    assert_eq!(pager.config().max_results, Some(4));
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn huge_search_start_renders_without_overflow() {
    let server = MockServer::start().await;
    let mut cache = PostCache::new(MemoryStore::new());
    cache
        .set(
            Some("x"),
            None,
            &PostDateLedger {
                total_posts: 12,
                post_dates: post_dates(12),
                blog_updated: Some("2024-02-01".to_string()),
            },
        )
        .unwrap();
    let page_url =
        url::Url::parse(&format!("{}/search?q=x&max-results=5&start=18446744073709551615", server.uri())).unwrap();
    let cfg = PagerConfig::resolve(&Default::default(), &page_url, &Default::default());
    let mut pager = pager(&server, cfg, cache.into_store());
    pager.init().await.unwrap();

    assert_eq!(pager.current_page(), Some(usize::MAX.div_ceil(5) + 1));
    assert_eq!(link_texts(&pager.view().numbers), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn url_cursor_selects_current_page() {
    let server = MockServer::start().await;
    let dates = post_dates(30);
    let cached = PostDateLedger {
        total_posts: 30,
        post_dates: dates.clone(),
        blog_updated: Some("2024-02-01".to_string()),
    };
    let cfg = PagerConfig {
        updated_max: Some(dates[9].clone()),
        ..config(&server, 5)
    };
    let mut pager = pager(&server, cfg, seeded_store(&cached));
    pager.init().await.unwrap();

    assert_eq!(pager.current_page(), Some(3));
    let active: Vec<_> = pager
        .view()
        .numbers
        .iter()
        .filter_map(|n| match n {
            Node::Link { class, text, .. } if class.contains("is-active") => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(active, vec!["3".to_string()]);
}

#[tokio::test]
async fn interactive_ellipsis_jump_rerenders_offline() {
    let server = MockServer::start().await;
    let cached = PostDateLedger {
        total_posts: 100,
        post_dates: post_dates(100),
        blog_updated: Some("2024-02-01".to_string()),
    };
    let cfg = PagerConfig {
        enable_interactive_ellipsis: true,
        ..config(&server, 5)
    };
    let mut pager = pager(&server, cfg, seeded_store(&cached));
    pager.init().await.unwrap();

    let target = pager
        .view()
        .numbers
        .iter()
        .find_map(|n| match n {
            Node::Jump { target, .. } => Some(*target),
            _ => None,
        })
        .unwrap();
    assert_eq!(target, 6);

    assert!(pager.jump(target));
    assert_eq!(pager.current_page(), Some(6));
    assert_eq!(
        link_texts(&pager.view().numbers),
        vec!["1", "...", "4", "5", "6", "7", "8", "...", "20"]
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_cache_is_treated_as_empty() {
    let server = MockServer::start().await;
    mount_snapshot(&server, 6, "u").await;
    mount_batch(&server, 1, feed_body(6, "u", &post_dates(6)), 1).await;

    let mut store = MemoryStore::new();
    store.set(STORE_KEY, "[1, 2".to_string()).unwrap();
    let mut pager = pager(&server, config(&server, 5), store);
    let outcome = pager.init().await.unwrap();

    assert!(!outcome.rendered_from_cache);
    assert!(outcome.fetched_post_dates);
    assert_eq!(pager.cache().get(None, None).post_dates.len(), 6);
}

#[tokio::test]
async fn label_mode_uses_label_feed_and_partition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/-/Rust"))
        .and(query_param("max-results", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(8, "u", &[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/posts/summary/-/Rust"))
        .and(query_param("start-index", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(8, "u", &post_dates(8))))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = PagerConfig {
        label: Some("Rust".to_string()),
        ..config(&server, 3)
    };
    let mut pager = pager(&server, cfg, MemoryStore::new());
    pager.init().await.unwrap();

    assert_eq!(pager.cache().get(None, Some("Rust")).total_posts, 8);
    assert_eq!(pager.cache().get(None, None), PostDateLedger::default());
    match &pager.view().numbers[0] {
        Node::Link { href, .. } => {
            assert_eq!(href, &format!("{}/search/label/Rust?max-results=3", server.uri()))
        }
        other => panic!("unexpected node {other:?}"),
    }
}
