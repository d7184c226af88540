//! Ticker discovery.
//!
//! A selected local directory lists its own tickers. Otherwise the remote tree
//! is asked in order: manifest tickers, then the server's directory listing,
//! then a fixed fallback list.

use super::classify;
use crate::data::{LocalFileIndex, RemoteSource};
use crate::domain::Manifest;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Shown when neither the manifest nor a directory listing is available.
pub const FALLBACK_TICKERS: [&str; 5] = ["ABNB", "AMAT", "NFLX", "NIO", "UAL"];

/// Sorted, deduplicated tickers available to the session.
pub fn discover_tickers(
    local: &LocalFileIndex,
    remote: Option<&dyn RemoteSource>,
    manifest: &Manifest,
) -> Vec<String> {
    if !local.is_empty() {
        return local.all_tickers();
    }
    let Some(remote) = remote else {
        return Vec::new();
    };

    if !manifest.tickers.is_empty() {
        debug!(tickers = manifest.tickers.len(), "tickers from manifest");
        return sorted_unique(manifest.tickers.iter().cloned());
    }

    match remote.fetch("") {
        Ok(body) => {
            let tickers = parse_listing(&String::from_utf8_lossy(&body));
            if !tickers.is_empty() {
                debug!(tickers = tickers.len(), "tickers from directory listing");
                return tickers;
            }
        }
        Err(e) => debug!(error = %e, "no directory listing"),
    }

    info!("no manifest or listing, using fallback tickers");
    sorted_unique(FALLBACK_TICKERS.iter().map(|t| t.to_string()))
}

/// Ticker names linked from an HTML directory listing.
///
/// Each `<a href>` is resolved against the listing's location and its last
/// path segment is percent-decoded before classification.
pub fn parse_listing(html: &str) -> Vec<String> {
    let (Ok(base), Ok(anchors)) = (Url::parse(LISTING_BASE), Selector::parse("a[href]")) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    sorted_unique(
        document
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| listing_file_name(&base, href))
            .filter_map(|name| classify(&name).map(|(ticker, _)| ticker)),
    )
}

/// Placeholder location for resolving relative links; only the final path
/// segment of each link is used.
const LISTING_BASE: &str = "http://listing.invalid/";

/// Decoded file name an `href` points at, or `None` for directories and
/// links without a path.
fn listing_file_name(base: &Url, href: &str) -> Option<String> {
    let url = base.join(href.trim()).ok()?;
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}

fn sorted_unique(tickers: impl Iterator<Item = String>) -> Vec<String> {
    tickers.collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryRemote;

    const LISTING: &str = r#"<html><body><h1>Index of /data_json/</h1>
        <a href="../">../</a>
        <A HREF="NFLX.json">NFLX.json</A>
        <a class="f" href='AMAT.json.gz'>AMAT.json.gz</a>
        <a href=BRK%2EB.json>BRK.B</a>
        <a href="/data_json/NFLX.json?v=2">dup</a>
        <a href="manifest.json">manifest</a>
        <a href="NFLX.dates.json">dates</a>
        <a href="NFLX/">NFLX/</a>
        <abbr href="FAKE.json">no</abbr>
        </body></html>"#;

    #[test]
    fn listing_anchors_become_tickers() {
        assert_eq!(parse_listing(LISTING), vec!["AMAT", "BRK.B", "NFLX"]);
        assert!(parse_listing("<p>empty</p>").is_empty());
    }

    #[test]
    fn manifest_tickers_win() {
        let remote = MemoryRemote::new().with("", LISTING);
        let manifest = Manifest {
            tickers: vec!["UAL".into(), "ABNB".into(), "UAL".into()],
            ..Manifest::default()
        };
        let tickers = discover_tickers(&LocalFileIndex::new(), Some(&remote), &manifest);
        assert_eq!(tickers, vec!["ABNB", "UAL"]);
        assert_eq!(remote.request_count(""), 0);
    }

    #[test]
    fn listing_then_fallback() {
        let remote = MemoryRemote::new().with("", LISTING);
        let tickers = discover_tickers(&LocalFileIndex::new(), Some(&remote), &Manifest::empty());
        assert_eq!(tickers, vec!["AMAT", "BRK.B", "NFLX"]);

        let bare = MemoryRemote::new();
        let tickers = discover_tickers(&LocalFileIndex::new(), Some(&bare), &Manifest::empty());
        assert_eq!(tickers, vec!["ABNB", "AMAT", "NFLX", "NIO", "UAL"]);
    }

    #[test]
    fn local_index_and_offline() {
        let mut local = LocalFileIndex::new();
        local.insert("tree/ZZZ.json".into());
        local.insert("tree/AAA/2024-01-02.json".into());
        let remote = MemoryRemote::new();
        assert_eq!(
            discover_tickers(&local, Some(&remote), &Manifest::empty()),
            vec!["AAA", "ZZZ"]
        );
        assert!(discover_tickers(&LocalFileIndex::new(), None, &Manifest::empty()).is_empty());
    }

    #[test]
    fn listing_ignores_comments_and_decodes_entities() {
        let html = r#"<ul>
            <!-- <a href="OLD.json">OLD</a> -->
            <li><a href="A&amp;B.json">A&amp;B</a></li>
            <li><a title="x>y" href="NFLX.json">NFLX</a></li>
            <li><a href="https://mirror.example/data_json/UAL.json.gz#top">UAL</a></li>
            <li><a href="mailto:ops@example.com">ops</a></li>
            </ul>"#;
        assert_eq!(parse_listing(html), vec!["A&B", "NFLX", "UAL"]);
    }

    #[test]
    fn file_names_are_resolved_and_decoded() {
        let base = Url::parse(LISTING_BASE).unwrap();
        assert_eq!(listing_file_name(&base, "A%20B.json").as_deref(), Some("A B.json"));
        assert_eq!(listing_file_name(&base, "../x/NIO.json?v=1").as_deref(), Some("NIO.json"));
        assert_eq!(listing_file_name(&base, "NFLX/"), None);
        assert_eq!(listing_file_name(&base, "%FF.json"), None);
    }
}
