use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use url::Url;

use crate::browser::PageLoader;
use crate::classify;
use crate::config::CrawlConfig;
use crate::error::BrowserError;
use crate::page::{PageDescriptor, PagePath, parse_published_at};

/// Links ending in one of these are assets, not pages.
const NON_DOCUMENT_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".pdf", ".xml", ".json", ".zip"];

#[derive(Debug, Default)]
pub struct CrawlStats {
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub pages_discovered: usize,
    pub list_pages_visited: usize,
    pub pages_failed: usize,
    pub pages_skipped_taxonomy: usize,
    pub pages_skipped_sources: usize,
    pub links_discovered: usize,
}

impl CrawlStats {
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            Some(end.duration_since(start))
        } else {
            None
        }
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_discovered + self.list_pages_visited
    }

    pub fn write_stats_to_stderr(&self) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();

        let _ = writeln!(handle, "\n=== Discovery Statistics ===");
        let _ = writeln!(handle, "Pages discovered: {}", self.pages_discovered);
        let _ = writeln!(handle, "List pages visited: {}", self.list_pages_visited);
        let _ = writeln!(handle, "Pages failed: {}", self.pages_failed);
        let _ = writeln!(
            handle,
            "Skipped (taxonomy): {}",
            self.pages_skipped_taxonomy
        );
        let _ = writeln!(handle, "Skipped (sources): {}", self.pages_skipped_sources);
        let _ = writeln!(handle, "Links discovered: {}", self.links_discovered);

        if let Some(duration) = self.duration() {
            let _ = writeln!(handle, "Total duration: {:.2}s", duration.as_secs_f64());
        }
        let _ = writeln!(handle, "============================\n");
    }
}

/// Breadth-first work queue plus everything already visited or queued.
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<PagePath>,
    queued: HashSet<PagePath>,
}

impl Frontier {
    fn seeded<S: AsRef<str>>(seeds: &[S]) -> Self {
        let mut frontier = Self::default();
        for seed in seeds {
            frontier.queued.insert(PagePath::new(seed.as_ref()));
            frontier.queue.push_back(seed.as_ref().to_string());
        }
        frontier
    }

    fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Returns false if the path was already visited.
    fn mark_visited(&mut self, path: &PagePath) -> bool {
        self.visited.insert(path.clone())
    }

    fn is_known(&self, path: &PagePath) -> bool {
        self.visited.contains(path) || self.queued.contains(path)
    }

    fn push(&mut self, raw: String, normalized: PagePath) {
        self.queued.insert(normalized);
        self.queue.push_back(raw);
    }
}

pub struct Crawler {
    base_url: Url,
    config: CrawlConfig,
    stats: CrawlStats,
}

impl Crawler {
    pub fn new(base_url: Url, config: CrawlConfig) -> Self {
        Self {
            base_url,
            config,
            stats: CrawlStats::default(),
        }
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn into_stats(self) -> CrawlStats {
        self.stats
    }

    fn is_excluded(&self, path: &PagePath) -> bool {
        classify::is_taxonomy(path.as_str())
            || (self.config.skip_sources && classify::is_source_page(path.as_str()))
    }

    /// Walks the site from `seeds` and returns one descriptor per content
    /// page, in discovery order. A page that fails to load is dropped.
    pub async fn discover<P, S>(&mut self, page: &mut P, seeds: &[S]) -> Vec<PageDescriptor>
    where
        P: PageLoader + ?Sized,
        S: AsRef<str>,
    {
        self.stats.start_time = Some(Instant::now());
        tracing::info!(
            "Discovery crawl of {} (skip sources: {})",
            self.base_url,
            self.config.skip_sources
        );

        let mut frontier = Frontier::seeded(seeds);
        let mut discovered = Vec::new();

        while let Some(raw) = frontier.pop() {
            let current = PagePath::new(&raw);
            if !frontier.mark_visited(&current) {
                tracing::debug!("Skipping already visited path: {}", current);
                continue;
            }

            if classify::is_taxonomy(current.as_str()) {
                self.stats.pages_skipped_taxonomy += 1;
                continue;
            }
            if self.config.skip_sources && classify::is_source_page(current.as_str()) {
                tracing::debug!("Skipping source page: {}", current);
                self.stats.pages_skipped_sources += 1;
                continue;
            }

            if let Some(max_pages) = self.config.max_pages
                && self.stats.pages_loaded() >= max_pages
            {
                tracing::warn!(
                    "Page limit of {} reached, {} paths left unvisited",
                    max_pages,
                    frontier.queue.len() + 1
                );
                break;
            }

            let url = match self.base_url.join(current.as_str()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Cannot build URL for {}: {}", current, e);
                    self.stats.pages_failed += 1;
                    continue;
                }
            };

            let (document_url, html) = match load_html(page, &url).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::debug!("Dropping {}: {}", current, e);
                    self.stats.pages_failed += 1;
                    continue;
                }
            };

            let links = extract_links(&html, &document_url, &self.base_url);
            self.stats.links_discovered += links.len();
            for link in links {
                let normalized = PagePath::new(&link);
                if !frontier.is_known(&normalized) && !self.is_excluded(&normalized) {
                    frontier.push(link, normalized);
                }
            }

            if classify::is_list_page(current.as_str()) {
                self.stats.list_pages_visited += 1;
                continue;
            }

            let published_at = extract_published_at(&html);
            let descriptor = PageDescriptor::new(current, published_at);
            tracing::info!(
                "Found: {} [{}] ({} pages)",
                descriptor.path,
                descriptor.category,
                discovered.len() + 1
            );
            discovered.push(descriptor);
            self.stats.pages_discovered += 1;
        }

        self.stats.end_time = Some(Instant::now());
        tracing::info!("Discovery finished with {} pages", discovered.len());
        discovered
    }
}

/// Final document URL (after redirects) and serialized DOM of `url`.
async fn load_html<P: PageLoader + ?Sized>(
    page: &mut P,
    url: &Url,
) -> Result<(Url, String), BrowserError> {
    let document_url = page.load(url).await?;
    let html = page.html().await?;
    Ok((document_url, html))
}

/// Same-origin links of a page as raw paths, resolved the way the browser
/// resolves `a.href`: against the first `<base href>` if there is one,
/// otherwise against the document URL. Links with a fragment or an asset
/// extension are dropped.
fn extract_links(html_content: &str, document_url: &Url, base_url: &Url) -> Vec<String> {
    let mut found = Vec::new();
    if html_content.is_empty() {
        return found;
    }

    let document = Html::parse_document(html_content);
    let link_selector = Selector::parse("a[href]").expect("Failed to parse 'a[href]' selector");
    let origin = base_url.origin();
    let link_base = document_base(&document, document_url);

    for element in document.select(&link_selector) {
        let Some(href_attr) = element.value().attr("href") else {
            continue;
        };

        match link_base.join(href_attr) {
            Ok(link) => {
                if link.origin() != origin || link.fragment().is_some() {
                    continue;
                }
                let lowered = link.as_str().to_lowercase();
                if NON_DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|extension| lowered.ends_with(extension))
                {
                    continue;
                }
                found.push(link.path().to_string());
            }
            Err(e) => {
                tracing::debug!(
                    "Failed to parse or join URL '{}' with base '{}': {}",
                    href_attr,
                    link_base,
                    e
                );
            }
        }
    }
    tracing::debug!("Extracted {} links from {}", found.len(), document_url);
    found
}

fn document_base(document: &Html, document_url: &Url) -> Url {
    let base_selector = Selector::parse("base[href]").expect("Failed to parse 'base[href]' selector");
    document
        .select(&base_selector)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| document_url.join(href).ok())
        .unwrap_or_else(|| document_url.clone())
}

/// The first `<time>` element decides; the Open Graph tag is only consulted
/// when the page has no `<time>` at all.
fn extract_published_at(html_content: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let document = Html::parse_document(html_content);
    let time_selector = Selector::parse("time").expect("Failed to parse 'time' selector");
    let meta_selector = Selector::parse(r#"meta[property="article:published_time"]"#)
        .expect("Failed to parse published_time selector");

    let raw = match document.select(&time_selector).next() {
        Some(time) => time.value().attr("datetime"),
        None => document
            .select(&meta_selector)
            .next()
            .and_then(|meta| meta.value().attr("content")),
    };

    raw.and_then(parse_published_at)
}
