use crate::configuration::Configuration;
use crate::dedup::{self, Acceptance};
use crate::normalize;
use crate::tokens;
use dashmap::{DashMap, DashSet};
use hashbrown::HashSet;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Number of top words included in a crawl report.
pub const REPORT_TOP_WORDS: usize = 50;

/// Longest page seen so far, by raw token count.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LongestPage {
    /// Canonical URL of the page.
    pub url: String,
    /// Raw token count, stop words included.
    pub words: usize,
}

#[derive(Default)]
struct DuplicateIndex {
    exact: HashSet<u64>,
    similar: Vec<u128>,
}

/// Crawl statistics shared across workers.
///
/// Plain counters go through concurrent maps. The compound steps, duplicate
/// test-and-insert and the longest-page maximum, run under small mutexes so
/// no interleaving can double-accept content or lose an update.
#[derive(Default)]
pub struct CrawlStats {
    visited: DashSet<String>,
    words: DashMap<String, u64>,
    subdomains: DashMap<String, u64>,
    duplicates: Mutex<DuplicateIndex>,
    longest: Mutex<LongestPage>,
}

impl CrawlStats {
    /// Fresh statistics with nothing recorded.
    pub fn new() -> Self {
        Default::default()
    }

    /// Record a canonical URL as visited. Re-recording is a no-op.
    pub fn record_visited(&self, url: &str) {
        self.visited.insert(url.to_string());
    }

    /// Count of unique canonical URLs visited so far.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Offer one page's content to the duplicate index.
    ///
    /// Checks run in order: exact duplicate, near duplicate, information
    /// ratio. Fingerprints are recorded only on acceptance, and the whole
    /// test-and-insert holds one lock so two workers carrying identical
    /// content cannot both be accepted.
    pub fn try_accept(
        &self,
        text: &str,
        raw_len: usize,
        page_tokens: &[String],
        configuration: &Configuration,
    ) -> Acceptance {
        let exact = dedup::exact_fingerprint(text);
        let similar = dedup::simhash(page_tokens);

        let mut index = self.duplicates.lock();

        if index.exact.contains(&exact) {
            return Acceptance::ExactDuplicate;
        }

        let near = index
            .similar
            .iter()
            .any(|recorded| dedup::is_near(*recorded, similar, configuration.near_duplicate_threshold));

        if near {
            return Acceptance::NearDuplicate;
        }

        if raw_len == 0 || (text.len() as f64 / raw_len as f64) < configuration.min_content_ratio {
            return Acceptance::LowInformation;
        }

        index.exact.insert(exact);
        index.similar.push(similar);

        Acceptance::Accepted
    }

    /// Merge one accepted page's tokens into the word frequencies and the
    /// longest-page maximum. The raw count includes stop words so page length
    /// is judged before filtering.
    pub fn record_tokens(&self, url: &str, page_tokens: &[String]) {
        let raw_count = page_tokens.len();

        for token in page_tokens {
            if !tokens::is_stop_word(token) {
                *self.words.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let mut longest = self.longest.lock();

        if raw_count > longest.words {
            longest.words = raw_count;
            longest.url = url.to_string();
        }
    }

    /// Tally the URL's host when it sits strictly below the parent domain.
    pub fn record_subdomain(&self, url: &Url, parent: &str) {
        let host = match url.host_str() {
            Some(host) => host,
            _ => return,
        };

        let below_parent = host
            .strip_suffix(parent)
            .map_or(false, |head| head.ends_with('.'));

        if below_parent {
            let key = string_concat::string_concat!(url.scheme(), "://", host);
            *self.subdomains.entry(key).or_insert(0) += 1;
        }
    }

    /// Current frequency recorded for one word.
    pub fn word_count(&self, word: &str) -> u64 {
        self.words.get(word).map_or(0, |count| *count)
    }

    /// Summarize the crawl. Words sort by descending count with alphabetical
    /// ties, subdomains alphabetically with the crawl root's own host left out.
    pub fn report(&self, root_url: &str, top_words: usize) -> CrawlReport {
        let mut words: Vec<(String, u64)> = self
            .words
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(top_words);

        let root_key = normalize::canonical(root_url)
            .and_then(|root| {
                root.host_str()
                    .map(|host| string_concat::string_concat!(root.scheme(), "://", host))
            })
            .unwrap_or_default();

        let mut subdomains: Vec<(String, u64)> = self
            .subdomains
            .iter()
            .filter(|entry| entry.key() != &root_key)
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        subdomains.sort_by(|a, b| a.0.cmp(&b.0));

        let longest = self.longest.lock().clone();

        CrawlReport {
            unique_pages: self.visited.len(),
            longest_page: (longest.words > 0).then_some(longest),
            top_words: words,
            subdomains,
        }
    }
}

/// Summary of one finished crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Count of unique canonical URLs visited.
    pub unique_pages: usize,
    /// Page with the highest raw token count, if any content was accepted.
    pub longest_page: Option<LongestPage>,
    /// Most frequent non-stop words, highest count first, ties alphabetical.
    pub top_words: Vec<(String, u64)>,
    /// Proper subdomains of the configured parent, alphabetical, with counts.
    pub subdomains: Vec<(String, u64)>,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unique pages: {}", self.unique_pages)?;

        match &self.longest_page {
            Some(page) => writeln!(f, "longest page: {} ({} words)", page.url, page.words)?,
            _ => writeln!(f, "longest page: none")?,
        }

        writeln!(f, "top words:")?;
        for (word, count) in &self.top_words {
            writeln!(f, "  {word}, {count}")?;
        }

        writeln!(f, "subdomains:")?;
        for (subdomain, count) in &self.subdomains {
            writeln!(f, "  {subdomain}, {count}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn informative(text: &str) -> (String, usize, Vec<String>) {
        (text.to_string(), text.len(), tokens::tokenize(text))
    }

    #[test]
    fn test_visited_unique() {
        let stats = CrawlStats::new();

        stats.record_visited("https://www.ics.uci.edu/");
        stats.record_visited("https://www.ics.uci.edu/");
        stats.record_visited("https://www.ics.uci.edu/about");

        assert_eq!(stats.visited_count(), 2);
    }

    #[test]
    fn test_accept_then_reject_duplicates() {
        let stats = CrawlStats::new();
        let configuration = Configuration::new();

        let (text, raw, toks) = informative("machine learning systems and their evaluation");

        assert_eq!(
            stats.try_accept(&text, raw, &toks, &configuration),
            Acceptance::Accepted
        );
        assert_eq!(
            stats.try_accept(&text, raw, &toks, &configuration),
            Acceptance::ExactDuplicate
        );

        // different bytes, same vocabulary: caught by the similarity pass
        let shuffled = "evaluation and machine learning systems their";
        assert_eq!(
            stats.try_accept(shuffled, shuffled.len(), &toks, &configuration),
            Acceptance::NearDuplicate
        );
    }

    #[test]
    fn test_single_token_edit_is_not_near() {
        let stats = CrawlStats::new();
        let configuration = Configuration::new();

        let first = "faculty directory for the computing school departments";
        let second = "faculty directory for the computing school department";

        assert_eq!(
            stats.try_accept(first, first.len(), &tokens::tokenize(first), &configuration),
            Acceptance::Accepted
        );
        assert_eq!(
            stats.try_accept(second, second.len(), &tokens::tokenize(second), &configuration),
            Acceptance::Accepted
        );
    }

    #[test]
    fn test_low_information_rejected_and_not_recorded() {
        let stats = CrawlStats::new();
        let configuration = Configuration::new();

        let (text, _, toks) = informative("graduate research opportunities in statistics");

        assert_eq!(
            stats.try_accept(&text, text.len() * 100, &toks, &configuration),
            Acceptance::LowInformation
        );
        assert_eq!(
            stats.try_accept(&text, 0, &toks, &configuration),
            Acceptance::LowInformation
        );

        // a thin rejection leaves no fingerprint behind
        assert_eq!(
            stats.try_accept(&text, text.len(), &toks, &configuration),
            Acceptance::Accepted
        );
    }

    #[test]
    fn test_record_tokens_filters_stop_words() {
        let stats = CrawlStats::new();
        let toks = tokens::tokenize("the cat and the dog");

        stats.record_tokens("https://www.ics.uci.edu/pets", &toks);

        assert_eq!(stats.word_count("cat"), 1);
        assert_eq!(stats.word_count("dog"), 1);
        assert_eq!(stats.word_count("the"), 0);
        assert_eq!(stats.word_count("and"), 0);
    }

    #[test]
    fn test_longest_page_first_wins_ties() {
        let stats = CrawlStats::new();

        stats.record_tokens("https://a.ics.uci.edu/", &tokens::tokenize("one two three"));
        stats.record_tokens("https://b.ics.uci.edu/", &tokens::tokenize("four five"));
        stats.record_tokens("https://c.ics.uci.edu/", &tokens::tokenize("six seven eight"));

        let report = report_for(&stats);
        let longest = report.longest_page.unwrap();

        assert_eq!(longest.url, "https://a.ics.uci.edu/");
        assert_eq!(longest.words, 3);
    }

    #[test]
    fn test_subdomain_tally_and_report_exclusion() {
        let stats = CrawlStats::new();
        let parent = "ics.uci.edu";

        for _ in 0..2 {
            let url = Url::parse("https://vision.ics.uci.edu/people").unwrap();
            stats.record_subdomain(&url, parent);
        }
        stats.record_subdomain(&Url::parse("https://www.ics.uci.edu/").unwrap(), parent);
        stats.record_subdomain(&Url::parse("https://ics.uci.edu/").unwrap(), parent);
        stats.record_subdomain(&Url::parse("https://stat.uci.edu/").unwrap(), parent);

        let report = report_for(&stats);

        assert_eq!(
            report.subdomains,
            vec![("https://vision.ics.uci.edu".to_string(), 2)]
        );
    }

    #[test]
    fn test_report_word_ordering() {
        let stats = CrawlStats::new();

        stats.record_tokens("https://x.ics.uci.edu/", &tokens::tokenize("cider apple apple"));
        stats.record_tokens("https://y.ics.uci.edu/", &tokens::tokenize("banana cider"));

        let report = stats.report("https://www.ics.uci.edu/", 2);

        assert_eq!(
            report.top_words,
            vec![("apple".to_string(), 2), ("cider".to_string(), 2)]
        );
    }

    #[test]
    fn test_concurrent_accept_once() {
        let stats = CrawlStats::new();
        let configuration = Configuration::new();
        let (text, raw, toks) = informative("concurrent workers racing over identical content");

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| stats.try_accept(&text, raw, &toks, &configuration))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|outcome| *outcome == Acceptance::Accepted)
                .count()
        });

        assert_eq!(accepted, 1);
    }

    fn report_for(stats: &CrawlStats) -> CrawlReport {
        stats.report("https://www.ics.uci.edu/", REPORT_TOP_WORDS)
    }
}
