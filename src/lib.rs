#![warn(missing_docs)]

//! Bounded-domain website crawling library.
//!
//! Harvestman crawls outward from one seed URL, keeps every visit inside a
//! configured set of domain suffixes, and reduces what it fetches into crawl
//! statistics: unique pages, word frequencies, the longest page, and
//! subdomain tallies. Pages carrying duplicate or near-duplicate content are
//! detected by fingerprint and contribute nothing.
//!
//! - Customization with allowed domains, politeness delay, worker count,
//!   and duplicate thresholds through [`configuration::Configuration`].
//! - Fetch transport behind the [`fetcher::Fetcher`] trait, so a crawl can
//!   run against an in-memory site in tests.
//! - One shared frontier with crawl-lifetime URL dedup and clean shutdown
//!   once no work remains.
//!
//! ```rust,no_run
//! use harvestman::configuration::Configuration;
//! use harvestman::crawler::Crawler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut configuration = Configuration::new();
//!     configuration.with_allowed_domains(["ics.uci.edu"]);
//!
//!     let crawler = Crawler::new("https://www.ics.uci.edu/", configuration);
//!
//!     if let Ok(report) = crawler.crawl().await {
//!         println!("{report}");
//!     }
//! }
//! ```

extern crate hashbrown;
extern crate log;
extern crate reqwest;
extern crate scraper;
pub extern crate tokio;
pub extern crate url;
#[macro_use]
extern crate string_concat;
#[macro_use]
extern crate lazy_static;

/// Configuration structure for the crawler.
pub mod configuration;
/// Crawl orchestration and the page processing pipeline.
pub mod crawler;
/// Content fingerprints and duplicate decisions.
pub mod dedup;
/// Fetch collaborator trait and the bundled HTTP implementation.
pub mod fetcher;
/// Shared work queue with crawl-lifetime URL dedup.
pub mod frontier;
/// Hyperlink canonicalization.
pub mod normalize;
/// A fetched page and its extraction methods.
pub mod page;
/// Crawl scope and trap rules.
pub mod scope;
/// Statistics shared across workers and the final report.
pub mod stats;
/// Tokenization and the stop-word list.
pub mod tokens;
/// Application utils.
pub mod utils;
