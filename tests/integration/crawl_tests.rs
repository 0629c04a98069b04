//! Integration tests for story archiving, polling cycles, and the monitor
//!
//! The fetcher is scripted so that timing and failures are deterministic;
//! HTTP itself is covered in `fetch_tests`.

use crate::support::{archiver, file_names, runner, story, ScriptedFetcher, FRONT_PAGE};
use hn_archiver::crawler::{CycleRunner, HostLimiter, Monitor, PageParser, StoryArchiver};
use hn_archiver::storage::ArchiveStore;
use hn_archiver::{ArchiverError, Story};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

#[tokio::test]
async fn test_archive_saves_article_detail_and_comments() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://a.example.com/post", "<p>article</p>")
            .page(
                "item?id=7",
                "https://links.example.com/one\nhttps://links.example.com/two",
            )
            .binary("https://links.example.com/one", b"%PDF-1.4", "application/pdf")
            .page("https://links.example.com/two", "<p>two</p>"),
    );

    let archiver = archiver(fetcher.clone(), vec![], tmp.path());
    archiver
        .archive(&story("7", "A story", "https://a.example.com/post"))
        .await;

    let dir = tmp.path().join("7");
    assert_eq!(
        file_names(&dir),
        vec!["article.html", "comment_1.pdf", "comment_2.html", "detail.html"]
    );
    assert_eq!(std::fs::read(dir.join("comment_1.pdf")).unwrap(), b"%PDF-1.4");
    assert_eq!(
        std::fs::read_to_string(dir.join("article.html")).unwrap(),
        "<p>article</p>"
    );
    assert!(ArchiveStore::new(tmp.path()).is_archived("7"));
}

#[tokio::test]
async fn test_failed_comment_link_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://a.example.com/post", "article")
            .page(
                "item?id=8",
                "https://l.example.com/1\nhttps://l.example.com/2\nhttps://l.example.com/3",
            )
            .page("https://l.example.com/1", "one")
            .failing("https://l.example.com/2")
            .page("https://l.example.com/3", "three"),
    );

    archiver(fetcher.clone(), vec![], tmp.path())
        .archive(&story("8", "Flaky links", "https://a.example.com/post"))
        .await;

    // The failed link keeps its number; later links are not renumbered
    assert_eq!(
        file_names(&tmp.path().join("8")),
        vec!["article.html", "comment_1.html", "comment_3.html", "detail.html"]
    );
    assert_eq!(fetcher.call_count("https://l.example.com/3"), 1);
}

#[tokio::test]
async fn test_comment_names_follow_parse_order() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://a.example.com/post", "article")
            .page("item?id=9", "https://l.example.com/slow\nhttps://l.example.com/fast")
            .delayed(
                "https://l.example.com/slow",
                "first",
                Duration::from_millis(60),
            )
            .page("https://l.example.com/fast", "second"),
    );

    archiver(fetcher, vec![], tmp.path())
        .archive(&story("9", "Ordering", "https://a.example.com/post"))
        .await;

    let dir = tmp.path().join("9");
    assert_eq!(
        std::fs::read_to_string(dir.join("comment_1.html")).unwrap(),
        "first"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("comment_2.html")).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_thread_failure_keeps_article() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://a.example.com/post", "article")
            .failing("item?id=10"),
    );

    archiver(fetcher, vec![], tmp.path())
        .archive(&story("10", "No thread", "https://a.example.com/post"))
        .await;

    assert_eq!(file_names(&tmp.path().join("10")), vec!["article.html"]);
}

#[tokio::test]
async fn test_host_connection_ceiling() {
    let tmp = TempDir::new().unwrap();
    let links: Vec<String> = (0..12)
        .map(|i| format!("http://links.example.com/{}", i))
        .collect();

    let mut scripted = ScriptedFetcher::new()
        .with_limiter(Arc::new(HostLimiter::new(3)))
        .page("http://a.example.com/post", "article")
        .page("item?id=11", &links.join("\n"));
    for link in &links {
        scripted = scripted.delayed(link, "linked", Duration::from_millis(20));
    }
    let fetcher = Arc::new(scripted);

    archiver(fetcher.clone(), vec![], tmp.path())
        .archive(&story("11", "Busy host", "http://a.example.com/post"))
        .await;

    assert_eq!(fetcher.peak_load("links.example.com:80"), 3);
    assert_eq!(file_names(&tmp.path().join("11")).len(), 14);
}

#[tokio::test]
async fn test_cycle_skips_archived_story() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("1")).unwrap();
    std::fs::write(tmp.path().join("1/article.html"), "old").unwrap();

    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "<html>front</html>")
            .page("https://one.example.com/", "one")
            .page("item?id=1", "")
            .page("https://two.example.com/", "two")
            .page("item?id=2", ""),
    );
    let stories = vec![
        story("1", "Old", "https://one.example.com/"),
        story("2", "New", "https://two.example.com/"),
    ];

    let report = runner(fetcher.clone(), stories, tmp.path())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.failed_tasks, 0);

    assert_eq!(fetcher.call_count("https://one.example.com/"), 0);
    assert_eq!(fetcher.call_count("item?id=1"), 0);
    assert_eq!(file_names(&tmp.path().join("1")), vec!["article.html"]);
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("1/article.html")).unwrap(),
        "old"
    );

    assert_eq!(
        file_names(&tmp.path().join("2")),
        vec!["article.html", "detail.html"]
    );
    assert!(tmp.path().join("main.html").exists());
}

#[tokio::test]
async fn test_second_cycle_dispatches_nothing() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "front")
            .page("https://a.example.com/", "article")
            .page("item?id=4", ""),
    );
    let runner = runner(
        fetcher.clone(),
        vec![story("4", "Once", "https://a.example.com/")],
        tmp.path(),
    );

    let first = runner.run_cycle().await.unwrap();
    let second = runner.run_cycle().await.unwrap();

    assert_eq!(first.dispatched, 1);
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(fetcher.call_count(FRONT_PAGE), 2);
    assert_eq!(fetcher.call_count("https://a.example.com/"), 1);
}

#[tokio::test]
async fn test_failed_article_is_retried_next_cycle() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "front")
            .failing("https://down.example.com/")
            .page("item?id=5", "https://l.example.com/x")
            .page("https://l.example.com/x", "x"),
    );
    let runner = runner(
        fetcher.clone(),
        vec![story("5", "Down", "https://down.example.com/")],
        tmp.path(),
    );

    let first = runner.run_cycle().await.unwrap();
    assert_eq!(first.dispatched, 1);
    assert!(!ArchiveStore::new(tmp.path()).is_archived("5"));
    assert_eq!(
        file_names(&tmp.path().join("5")),
        vec!["comment_1.html", "detail.html"]
    );

    let second = runner.run_cycle().await.unwrap();
    assert_eq!(second.dispatched, 1);
    assert_eq!(fetcher.call_count("https://down.example.com/"), 2);
}

#[tokio::test]
async fn test_duplicate_story_dispatched_once() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "front")
            .page("https://a.example.com/", "article")
            .page("item?id=3", ""),
    );
    let stories = vec![
        story("3", "Twice", "https://a.example.com/"),
        story("3", "Twice", "https://a.example.com/"),
    ];

    let report = runner(fetcher.clone(), stories, tmp.path())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(fetcher.call_count("https://a.example.com/"), 1);
}

#[tokio::test]
async fn test_front_page_failure_dispatches_nothing() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().page("https://a.example.com/", "article"));

    let result = runner(
        fetcher.clone(),
        vec![story("6", "Never", "https://a.example.com/")],
        tmp.path(),
    )
    .run_cycle()
    .await;

    assert!(matches!(result, Err(ArchiverError::Fetch(_))));
    assert_eq!(fetcher.calls(), vec![FRONT_PAGE.to_string()]);
    assert!(file_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_story_failure_does_not_block_others() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "front")
            .failing("https://broken.example.com/")
            .page("https://fine.example.com/", "fine")
            .page("item?id=21", ""),
    );
    let stories = vec![
        story("20", "Broken", "https://broken.example.com/"),
        story("21", "Fine", "https://fine.example.com/"),
    ];

    let report = runner(fetcher, stories, tmp.path())
        .run_cycle()
        .await
        .unwrap();

    let store = ArchiveStore::new(tmp.path());
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.failed_tasks, 0);
    assert!(!store.is_archived("20"));
    assert!(store.is_archived("21"));
}

#[tokio::test]
async fn test_dispatch_is_staggered() {
    let tmp = TempDir::new().unwrap();
    let mut scripted = ScriptedFetcher::new().page(FRONT_PAGE, "front");
    let mut stories = Vec::new();
    for id in ["30", "31", "32"] {
        let url = format!("https://{}.example.com/", id);
        scripted = scripted
            .page(&url, "article")
            .page(&format!("item?id={}", id), "");
        stories.push(story(id, "Staggered", &url));
    }

    let runner = CycleRunner::new(
        archiver(Arc::new(scripted), stories, tmp.path()),
        FRONT_PAGE,
        Duration::from_millis(80),
    );

    let started = Instant::now();
    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.dispatched, 3);
    assert!(started.elapsed() >= Duration::from_millis(160));
}

#[tokio::test]
async fn test_monitor_timeout_leaves_tasks_running() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(FRONT_PAGE, "front")
            .delayed(
                "https://slow.example.com/",
                "late article",
                Duration::from_millis(200),
            )
            .page("item?id=40", ""),
    );
    let monitor = Monitor::new(
        runner(
            fetcher,
            vec![story("40", "Slow", "https://slow.example.com/")],
            tmp.path(),
        ),
        Duration::from_millis(50),
    );

    let result = monitor.run_once().await;
    assert!(matches!(result, Err(ArchiverError::CycleTimeout(_))));
    assert!(!ArchiveStore::new(tmp.path()).is_archived("40"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(ArchiveStore::new(tmp.path()).is_archived("40"));
}

struct PanickingParser;

impl PageParser for PanickingParser {
    fn parse_front_page(&self, _html: &str) -> Vec<Story> {
        panic!("malformed front page");
    }

    fn parse_thread_links(&self, _html: &str) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_monitor_turns_panic_into_error() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().page(FRONT_PAGE, "front"));
    let archiver = StoryArchiver::new(
        fetcher,
        Arc::new(PanickingParser),
        ArchiveStore::new(tmp.path()),
    );
    let monitor = Monitor::new(
        CycleRunner::new(archiver, FRONT_PAGE, Duration::ZERO),
        Duration::from_secs(5),
    );

    match monitor.run_once().await {
        Err(ArchiverError::CyclePanic(message)) => {
            assert!(message.contains("malformed front page"))
        }
        other => panic!("expected a cycle panic, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_monitor_keeps_polling_after_failures() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let monitor = Monitor::new(
        runner(fetcher.clone(), vec![], tmp.path()),
        Duration::from_millis(20),
    );

    monitor
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await;

    assert!(fetcher.call_count(FRONT_PAGE) >= 3);
}
