use crate::configuration::Configuration;
use crate::dedup::Acceptance;
use crate::fetcher::{FetchError, FetchResult, Fetcher, HttpFetcher};
use crate::frontier::Frontier;
use crate::normalize;
use crate::page::Page;
use crate::stats::{CrawlReport, CrawlStats, REPORT_TOP_WORDS};
use crate::tokens;
use crate::utils::log;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded-domain web crawler.
///
/// Seeds a shared frontier with one start URL, fans out onto worker tasks,
/// and runs every fetched page through the processing pipeline until the
/// frontier is exhausted.
///
/// ```rust,no_run
/// use harvestman::configuration::Configuration;
/// use harvestman::crawler::Crawler;
///
/// #[tokio::main]
/// async fn main() {
///     let mut configuration = Configuration::new();
///     configuration
///         .with_allowed_domains(["ics.uci.edu", "stat.uci.edu"])
///         .with_subdomain_parent(Some("ics.uci.edu"));
///
///     let crawler = Crawler::new("https://www.ics.uci.edu/", configuration);
///
///     match crawler.crawl().await {
///         Ok(report) => println!("{report}"),
///         Err(e) => eprintln!("crawl never started: {e}"),
///     }
/// }
/// ```
pub struct Crawler {
    /// Configuration properties for the crawl.
    pub configuration: Configuration,
    start_url: String,
    fetcher: Option<Arc<dyn Fetcher>>,
    frontier: Arc<Frontier>,
    stats: Arc<CrawlStats>,
}

impl Crawler {
    /// Set up a crawler seeded with one start URL.
    pub fn new(start_url: &str, configuration: Configuration) -> Self {
        Self {
            configuration,
            start_url: start_url.to_string(),
            fetcher: None,
            frontier: Arc::new(Frontier::new()),
            stats: Arc::new(CrawlStats::new()),
        }
    }

    /// Replace the bundled HTTP fetcher, for tests or custom transports.
    pub fn with_fetcher(&mut self, fetcher: Arc<dyn Fetcher>) -> &mut Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Handle to the shared statistics, readable while the crawl runs.
    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    /// Handle to the frontier, readable while the crawl runs.
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.frontier)
    }

    /// Run the crawl to frontier exhaustion and summarize it.
    ///
    /// Fails only when the seed URL is unusable or the fetcher cannot be
    /// built. Failures on individual pages are logged and skipped.
    pub async fn crawl(&self) -> Result<CrawlReport, FetchError> {
        let seed = match normalize::canonical(&self.start_url) {
            Some(seed) => seed,
            _ => return Err(FetchError::Unfetchable(self.start_url.clone())),
        };

        let fetcher: Arc<dyn Fetcher> = match &self.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            _ => Arc::new(HttpFetcher::new(&self.configuration)?),
        };

        self.frontier.push(String::from(seed.clone()));

        let configuration = Arc::new(self.configuration.clone());
        let workers = configuration.workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for _ in 0..workers {
            handles.push(tokio::spawn(worker(
                Arc::clone(&configuration),
                Arc::clone(&fetcher),
                Arc::clone(&self.frontier),
                Arc::clone(&self.stats),
            )));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                log("worker panicked", e.to_string());
            }
        }

        Ok(self.stats.report(seed.as_str(), REPORT_TOP_WORDS))
    }
}

/// One crawl worker: pull, fetch, process, repeat until exhaustion.
async fn worker(
    configuration: Arc<Configuration>,
    fetcher: Arc<dyn Fetcher>,
    frontier: Arc<Frontier>,
    stats: Arc<CrawlStats>,
) {
    let delay_enabled = configuration.delay > 0;
    let delay = Duration::from_millis(configuration.delay);

    while let Some(url) = frontier.pop_next().await {
        log("fetch", &url);

        {
            let _complete = CompletionGuard {
                frontier: &frontier,
                url: &url,
            };

            match fetcher.fetch(&url).await {
                Ok(result) => {
                    for link in process_page(&url, &result, &configuration, &stats) {
                        frontier.push(link);
                    }
                }
                Err(e) => {
                    log("fetch failed", format!("{url} {e}"));
                }
            }
        }

        if delay_enabled {
            sleep(delay).await;
        }
    }

    log("frontier exhausted", "worker stopping");
}

/// Marks a popped URL complete when dropped. A panic while fetching or
/// processing unwinds through this, so the frontier's in-flight count still
/// drains and the remaining workers are not stranded waiting on it.
struct CompletionGuard<'a> {
    frontier: &'a Frontier,
    url: &'a str,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.frontier.mark_complete(self.url);
    }
}

/// Run the processing pipeline for one fetched page and return the links to
/// admit to the frontier.
///
/// The canonical URL counts as visited no matter what. Every rejection after
/// that, bad status, nofollow, duplicate or thin content, ends the pipeline
/// early with no links extracted.
pub fn process_page(
    url: &str,
    result: &FetchResult,
    configuration: &Configuration,
    stats: &CrawlStats,
) -> Vec<String> {
    stats.record_visited(url);

    if result.status != 200 {
        log("skipped status", format!("{} {url}", result.status));
        return Vec::new();
    }

    let origin = normalize::canonical(url);

    let base = match normalize::canonical(&result.resolved_url).or_else(|| origin.clone()) {
        Some(base) => base,
        _ => return Vec::new(),
    };

    let page = Page::build(base, &result.content);

    if page.nofollow() {
        log("nofollow", url);
        return Vec::new();
    }

    let text = page.visible_text();
    let page_tokens = tokens::tokenize(&text);

    match stats.try_accept(&text, result.content.len(), &page_tokens, configuration) {
        Acceptance::Accepted => (),
        outcome => {
            log("content rejected", format!("{url} {outcome:?}"));
            return Vec::new();
        }
    }

    stats.record_tokens(url, &page_tokens);

    // the tally follows the visited set in crediting the origin URL, even
    // when the response came back from a redirect on another host
    if let (Some(parent), Some(origin)) = (&configuration.subdomain_parent, &origin) {
        stats.record_subdomain(origin, parent);
    }

    page.out_links(configuration).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn fetched(status: u16, url: &str, body: &str) -> FetchResult {
        FetchResult {
            status,
            resolved_url: url.to_string(),
            content: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn test_configuration() -> Configuration {
        let mut configuration = Configuration::new();
        configuration
            .with_allowed_domains(["ics.uci.edu"])
            .with_subdomain_parent(Some("ics.uci.edu"));
        configuration
    }

    #[test]
    fn test_process_page_accepts_and_extracts() {
        let configuration = test_configuration();
        let stats = CrawlStats::new();
        let url = "https://vision.ics.uci.edu/projects";
        let result = fetched(
            200,
            url,
            "<html><body><p>Computer vision research across perception and graphics</p>\
             <a href=\"/people\">people</a><a href=\"https://example.com/\">offsite</a></body></html>",
        );

        let links = process_page(url, &result, &configuration, &stats);

        assert_eq!(links, vec!["https://vision.ics.uci.edu/people".to_string()]);
        assert_eq!(stats.visited_count(), 1);
        assert_eq!(stats.word_count("vision"), 1);
        assert_eq!(stats.word_count("research"), 1);

        let report = stats.report("https://www.ics.uci.edu/", REPORT_TOP_WORDS);
        assert_eq!(
            report.subdomains,
            vec![("https://vision.ics.uci.edu".to_string(), 1)]
        );
    }

    #[test]
    fn test_process_page_redirect_keeps_origin_tally() {
        let configuration = test_configuration();
        let stats = CrawlStats::new();
        let url = "https://vision.ics.uci.edu/gallery";
        let result = fetched(
            200,
            "https://www.ics.uci.edu/vision-gallery",
            "<html><body><p>Annotated image gallery with detection benchmarks</p>\
             <a href=\"/datasets\">datasets</a></body></html>",
        );

        let links = process_page(url, &result, &configuration, &stats);

        // links resolve against the redirect target, the tally credits the origin
        assert_eq!(links, vec!["https://www.ics.uci.edu/datasets".to_string()]);

        let report = stats.report("https://www.ics.uci.edu/", REPORT_TOP_WORDS);
        assert_eq!(
            report.subdomains,
            vec![("https://vision.ics.uci.edu".to_string(), 1)]
        );
    }

    #[test]
    fn test_process_page_skips_bad_status() {
        let configuration = test_configuration();
        let stats = CrawlStats::new();
        let url = "https://www.ics.uci.edu/missing";
        let result = fetched(404, url, "<html><body><a href=\"/a\">a</a></body></html>");

        let links = process_page(url, &result, &configuration, &stats);

        assert!(links.is_empty());
        assert_eq!(stats.visited_count(), 1);
    }

    #[test]
    fn test_process_page_honors_nofollow() {
        let configuration = test_configuration();
        let stats = CrawlStats::new();
        let url = "https://www.ics.uci.edu/private";
        let result = fetched(
            200,
            url,
            "<html><head><meta name=\"robots\" content=\"nofollow\"></head>\
             <body><p>Hidden words here</p><a href=\"/a\">a</a></body></html>",
        );

        let links = process_page(url, &result, &configuration, &stats);

        assert!(links.is_empty());
        assert_eq!(stats.visited_count(), 1);
        assert_eq!(stats.word_count("hidden"), 0);
    }

    #[test]
    fn test_process_page_rejects_duplicate_content() {
        let configuration = test_configuration();
        let stats = CrawlStats::new();
        let body = "<html><body><p>Course catalog for the winter quarter sessions</p>\
                    <a href=\"/next\">next</a></body></html>";

        let first = process_page(
            "https://www.ics.uci.edu/catalog",
            &fetched(200, "https://www.ics.uci.edu/catalog", body),
            &configuration,
            &stats,
        );
        let second = process_page(
            "https://www.ics.uci.edu/catalog-mirror",
            &fetched(200, "https://www.ics.uci.edu/catalog-mirror", body),
            &configuration,
            &stats,
        );

        assert!(!first.is_empty());
        assert!(second.is_empty());
        assert_eq!(stats.visited_count(), 2);
        assert_eq!(stats.word_count("catalog"), 1);
    }
}
