use hashbrown::HashSet;
use std::time::Duration;

/// Default politeness delay between requests issued by one worker, in milliseconds.
pub const DEFAULT_DELAY: u64 = 500;

/// Default request timeout for the bundled HTTP fetcher.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default strict upper bound on the normalized fingerprint distance below which
/// two pages count as near duplicates.
pub const DEFAULT_NEAR_DUPLICATE_THRESHOLD: f64 = 0.025;

/// Default minimum ratio of extracted text bytes to raw body bytes for a page
/// to count as informative.
pub const DEFAULT_MIN_CONTENT_RATIO: f64 = 0.05;

/// Default maximum number of non-empty path segments before a URL is treated
/// as a crawler trap.
pub const DEFAULT_MAX_PATH_SEGMENTS: usize = 15;

/// Default maximum number of differing positions between two equal-length URLs
/// before the candidate is treated as a near-identical sibling of its origin.
pub const DEFAULT_MAX_URL_CHAR_DIFF: usize = 2;

/// Structure to configure the `Crawler`.
///
/// ```rust
/// use harvestman::configuration::Configuration;
/// let mut configuration = Configuration::new();
/// configuration
///     .with_allowed_domains(["ics.uci.edu", "stat.uci.edu"])
///     .with_subdomain_parent(Some("ics.uci.edu"))
///     .with_delay(250);
/// ```
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Registrable domain suffixes a host must end on to stay in scope.
    pub allowed_domains: HashSet<String>,
    /// Parent domain whose proper subdomains are tallied per crawl, if any.
    pub subdomain_parent: Option<String>,
    /// User-Agent header presented by the bundled HTTP fetcher.
    pub user_agent: Option<String>,
    /// Politeness delay between requests issued by one worker, in milliseconds.
    pub delay: u64,
    /// Number of concurrent crawl workers.
    pub workers: usize,
    /// Request timeout for the bundled HTTP fetcher. None to disable.
    pub request_timeout: Option<Duration>,
    /// Strict upper bound on normalized fingerprint distance for near duplicates.
    pub near_duplicate_threshold: f64,
    /// Minimum extracted-text to raw-body byte ratio for an informative page.
    pub min_content_ratio: f64,
    /// Maximum non-empty path segments before a URL counts as a trap.
    pub max_path_segments: usize,
    /// Maximum differing positions between equal-length URLs before the
    /// candidate counts as a near-identical sibling of its origin.
    pub max_url_char_diff: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            allowed_domains: HashSet::new(),
            subdomain_parent: None,
            user_agent: None,
            delay: DEFAULT_DELAY,
            workers: num_cpus::get(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            near_duplicate_threshold: DEFAULT_NEAR_DUPLICATE_THRESHOLD,
            min_content_ratio: DEFAULT_MIN_CONTENT_RATIO,
            max_path_segments: DEFAULT_MAX_PATH_SEGMENTS,
            max_url_char_diff: DEFAULT_MAX_URL_CHAR_DIFF,
        }
    }
}

impl Configuration {
    /// Represents crawl configuration with sensible defaults.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replace the set of in-scope domain suffixes.
    pub fn with_allowed_domains<I, S>(&mut self, domains: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Tally proper subdomains of this parent domain during the crawl.
    pub fn with_subdomain_parent(&mut self, parent: Option<&str>) -> &mut Self {
        self.subdomain_parent = parent.map(String::from);
        self
    }

    /// Use a custom User-Agent for outbound requests.
    pub fn with_user_agent(&mut self, user_agent: Option<&str>) -> &mut Self {
        self.user_agent = user_agent.map(String::from);
        self
    }

    /// Politeness delay between requests issued by one worker, in milliseconds.
    pub fn with_delay(&mut self, delay: u64) -> &mut Self {
        self.delay = delay;
        self
    }

    /// Number of concurrent crawl workers. Clamped to at least one at crawl time.
    pub fn with_workers(&mut self, workers: usize) -> &mut Self {
        self.workers = workers;
        self
    }

    /// Request timeout for the bundled HTTP fetcher.
    pub fn with_request_timeout(&mut self, request_timeout: Option<Duration>) -> &mut Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Strict near-duplicate distance bound, as a fraction of fingerprint width.
    pub fn with_near_duplicate_threshold(&mut self, threshold: f64) -> &mut Self {
        self.near_duplicate_threshold = threshold;
        self
    }

    /// Minimum extracted-text to raw-body ratio for an informative page.
    pub fn with_min_content_ratio(&mut self, ratio: f64) -> &mut Self {
        self.min_content_ratio = ratio;
        self
    }

    /// Maximum non-empty path segments before a URL counts as a trap.
    pub fn with_max_path_segments(&mut self, segments: usize) -> &mut Self {
        self.max_path_segments = segments;
        self
    }

    /// Maximum differing positions between equal-length URLs before the
    /// candidate is discarded as a near-identical sibling.
    pub fn with_max_url_char_diff(&mut self, diff: usize) -> &mut Self {
        self.max_url_char_diff = diff;
        self
    }
}

#[test]
fn test_defaults() {
    let configuration = Configuration::new();

    assert_eq!(configuration.delay, DEFAULT_DELAY);
    assert_eq!(
        configuration.near_duplicate_threshold,
        DEFAULT_NEAR_DUPLICATE_THRESHOLD
    );
    assert_eq!(configuration.max_path_segments, DEFAULT_MAX_PATH_SEGMENTS);
    assert!(configuration.allowed_domains.is_empty());
    assert!(configuration.workers >= 1);
}

#[test]
fn test_builder_chain() {
    let mut configuration = Configuration::new();
    configuration
        .with_allowed_domains(["ics.uci.edu"])
        .with_subdomain_parent(Some("ics.uci.edu"))
        .with_delay(0)
        .with_workers(4);

    assert!(configuration.allowed_domains.contains("ics.uci.edu"));
    assert_eq!(configuration.subdomain_parent.as_deref(), Some("ics.uci.edu"));
    assert_eq!(configuration.delay, 0);
    assert_eq!(configuration.workers, 4);
}
