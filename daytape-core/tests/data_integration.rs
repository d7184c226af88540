//! Integration tests for day loading against local trees and an HTTP server.

use daytape_core::config::DayTapeConfig;
use daytape_core::data::{
    DataSourceResolver, ExtractOptions, HttpRemote, LoadError, MemoryRemote, RemoteSource,
    SessionStore,
};
use daytape_core::tree::{generate_manifest, split_by_day};
use daytape_core::{DatesState, DayState, Viewer};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

const DATE: &str = "2024-01-02";

/// Monolithic document with `n` one-minute aliased records on each date.
fn monolithic(ticker: &str, dates: &[&str], n: usize, base: f64) -> String {
    let days: Vec<String> = dates
        .iter()
        .map(|date| {
            let rows: Vec<String> = (0..n)
                .map(|i| {
                    let m = 9 * 60 + 30 + i;
                    format!(
                        r#"{{"time":"{:02}:{:02}:00","open":{c},"high":{c},"low":{c},"close":{c},"volume":100,"count":2}}"#,
                        m / 60,
                        m % 60,
                        c = base + i as f64
                    )
                })
                .collect();
            format!(r#""{date}":[{}]"#, rows.join(","))
        })
        .collect();
    format!(r#"{{"ticker":"{ticker}","days":{{{}}}}}"#, days.join(","))
}

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}

// ── Resolver ─────────────────────────────────────────────────────────

#[test]
fn local_day_file_beats_monolithic() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("AAA.json"), &monolithic("AAA", &[DATE], 5, 100.0));
    write(
        &dir.path().join("AAA").join(format!("{DATE}.json")),
        r#"[{"t":"09:30:00","o":1,"h":1,"l":1,"c":42,"v":1,"cnt":1}]"#,
    );

    let mut session = SessionStore::new();
    session.select_directory(dir.path()).unwrap();
    let resolver = DataSourceResolver::new(None, ExtractOptions::default());

    let day = resolver.resolve(&mut session, "AAA", DATE).unwrap();
    assert_eq!(day.strategy, "local_day_file");
    assert_eq!(day.records.len(), 1);
    assert_eq!(day.records[0].c, 42.0);
    assert!(day.failures.is_empty());
}

#[test]
fn local_monolith_is_streamed_without_caching() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("AAA.json"),
        &monolithic("AAA", &["2024-01-01", DATE, "2024-01-03"], 7, 50.0),
    );

    let mut session = SessionStore::new();
    session.select_directory(dir.path()).unwrap();
    let resolver = DataSourceResolver::new(
        None,
        ExtractOptions {
            chunk_size: 13,
            ..ExtractOptions::default()
        },
    );

    let day = resolver.resolve(&mut session, "AAA", DATE).unwrap();
    assert_eq!(day.strategy, "stream_extract");
    assert_eq!(day.records.len(), 7);
    assert_eq!(day.records[6].c, 56.0);
    assert_eq!(day.failures.len(), 2);
    assert!(session.cached_dataset("AAA").is_none());
}

#[test]
fn absent_date_exhausts_every_strategy() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("AAA.json"), &monolithic("AAA", &[DATE], 3, 10.0));

    let mut session = SessionStore::new();
    session.select_directory(dir.path()).unwrap();
    let resolver = DataSourceResolver::new(None, ExtractOptions::default());

    match resolver.resolve(&mut session, "AAA", "2030-06-01").unwrap_err() {
        LoadError::Exhausted {
            ticker,
            date,
            attempts,
        } => {
            assert_eq!(ticker, "AAA");
            assert_eq!(date, "2030-06-01");
            let names: Vec<_> = attempts.iter().map(|a| a.strategy).collect();
            assert_eq!(
                names,
                vec!["local_day_file", "remote_day_file", "stream_extract", "full_dataset"]
            );
            assert_eq!(attempts[2].error.kind(), "NotFound");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert!(session.cached_dataset("AAA").is_some());
}

#[test]
fn split_tree_is_preferred_after_splitting() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("BBB.json"), &monolithic("BBB", &[DATE, "2024-01-03"], 4, 20.0));

    let summary = split_by_day(dir.path(), &[]).unwrap();
    assert_eq!(summary.total_files(), 2);

    let mut session = SessionStore::new();
    session.select_directory(dir.path()).unwrap();
    let resolver = DataSourceResolver::new(None, ExtractOptions::default());
    let day = resolver.resolve(&mut session, "BBB", "2024-01-03").unwrap();
    assert_eq!(day.strategy, "local_day_file");
    assert_eq!(day.records.len(), 4);
    assert_eq!(day.records[0].t, "09:30:00");
    assert_eq!(day.records[3].c, 23.0);
}

// ── HTTP source ──────────────────────────────────────────────────────

#[test]
fn http_remote_fetches_and_reports_status() {
    let mut server = mockito::Server::new();
    let ok = server
        .mock("GET", "/data_json/AAA/2024-01-02.json")
        .match_header("cache-control", "no-store")
        .with_status(200)
        .with_body(r#"[{"t":"09:30:00","c":5}]"#)
        .expect(1)
        .create();
    let missing = server
        .mock("GET", "/data_json/ZZZ.json")
        .with_status(404)
        .create();

    let remote = HttpRemote::new(&format!("{}/data_json", server.url()), Duration::from_secs(5));
    let body = remote.fetch("AAA/2024-01-02.json").unwrap();
    assert_eq!(body, br#"[{"t":"09:30:00","c":5}]"#);

    let err = remote.fetch("ZZZ.json").unwrap_err();
    assert!(matches!(err, LoadError::NotFound(ref m) if m.contains("404")), "{err:?}");

    ok.assert();
    missing.assert();
}

#[test]
fn http_monolith_is_streamed_by_resolver() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/data_json/CCC/2024-01-02.json")
        .with_status(404)
        .create();
    server
        .mock("GET", "/data_json/CCC.json")
        .with_status(200)
        .with_body(monolithic("CCC", &["2024-01-01", DATE], 40, 10.0))
        .expect(1)
        .create();

    let remote: Rc<dyn RemoteSource> = Rc::new(HttpRemote::new(
        &format!("{}/data_json", server.url()),
        Duration::from_secs(5),
    ));
    let resolver = DataSourceResolver::new(Some(remote), ExtractOptions::default());
    let mut session = SessionStore::new();

    let day = resolver.resolve(&mut session, "CCC", DATE).unwrap();
    assert_eq!(day.strategy, "stream_extract");
    assert_eq!(day.records.len(), 40);
}

#[test]
fn http_viewer_flow_with_manifest() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/data_json/manifest.json")
        .with_status(200)
        .with_body(r#"{"tickers":["DDD"],"dates":{"DDD":["2024-01-02"]}}"#)
        .expect(1)
        .create();
    server
        .mock("GET", "/data_json/DDD/2024-01-02.json")
        .with_status(200)
        .with_body(
            r#"[{"t":"09:30:00","o":1,"h":1,"l":1,"c":10,"v":5,"cnt":1},
                {"t":"09:31:00","o":1,"h":1,"l":1,"c":11,"v":null,"cnt":1}]"#,
        )
        .create();

    let config = DayTapeConfig::from_toml(&format!(
        "[remote]\nbase_url = \"{}/data_json\"\ntimeout_secs = 5\n",
        server.url()
    ))
    .unwrap();
    let mut viewer = Viewer::from_config(&config).unwrap();

    assert_eq!(viewer.tickers(), vec!["DDD"]);
    assert_eq!(
        viewer.select_ticker("DDD"),
        DatesState::Loaded(vec![DATE.to_string()])
    );
    assert!(matches!(viewer.select_date(DATE), DayState::Loaded(_)));

    let snap = viewer.render().unwrap();
    assert_eq!(snap.index, 1);
    assert_eq!(snap.cum_volume, 5.0);
    assert!((snap.pct_return - 10.0).abs() < 1e-9);
    assert!(snap.volatility.is_none());
}

// ── Viewer over a local tree ─────────────────────────────────────────

#[test]
fn viewer_reports_empty_day_for_absent_date() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("EEE.json"), &monolithic("EEE", &[DATE], 3, 1.0));

    let mut viewer = Viewer::new(None, &DayTapeConfig::default());
    viewer.select_directory(dir.path()).unwrap();
    assert_eq!(
        viewer.select_ticker("EEE"),
        DatesState::Loaded(vec![DATE.to_string()])
    );
    match viewer.select_date("2024-12-31") {
        DayState::Empty { diagnostic } => {
            assert!(diagnostic.contains("EEE"), "{diagnostic}");
            assert!(diagnostic.contains("2024-12-31"), "{diagnostic}");
        }
        other => panic!("expected Empty, got {other:?}"),
    }
    assert!(viewer.snapshot().is_none());
}

#[test]
fn manifest_makes_dates_cheap_for_the_remote_tree() {
    let dir = tempfile::tempdir().unwrap();
    let doc = monolithic("FFF", &["2024-01-03", DATE], 2, 1.0);
    write(&dir.path().join("FFF.json"), &doc);
    generate_manifest(dir.path()).unwrap();

    let manifest = std::fs::read(dir.path().join("manifest.json")).unwrap();
    let dates = std::fs::read(dir.path().join("FFF.dates.json")).unwrap();
    let remote = Rc::new(
        MemoryRemote::new()
            .with("manifest.json", manifest)
            .with("FFF.dates.json", dates)
            .with("FFF.json", doc),
    );

    let mut viewer = Viewer::new(Some(remote.clone()), &DayTapeConfig::default());
    assert_eq!(
        viewer.select_ticker("FFF"),
        DatesState::Loaded(vec![DATE.to_string(), "2024-01-03".to_string()])
    );
    assert_eq!(remote.request_count("FFF.json"), 0);
    assert_eq!(remote.request_count("FFF.dates.json"), 0);
}
