use crate::configuration::Configuration;
use crate::normalize;
use crate::scope;
use hashbrown::HashSet;
use scraper::{Html, Selector};
use url::Url;

lazy_static! {
    static ref LINK_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
    static ref META_SELECTOR: Selector = Selector::parse("meta[name][content]").unwrap();
}

/// A fetched page pending processing.
///
/// The HTML is kept as a string and parsed per call, so the page stays
/// `Send` for task spawning; the parsed DOM is not.
#[derive(Debug, Clone)]
pub struct Page {
    html: String,
    base: Url,
}

impl Page {
    /// Build a page from the URL its content resolved from and the raw body.
    pub fn build(base: Url, content: &[u8]) -> Self {
        Self {
            html: String::from_utf8_lossy(content).into_owned(),
            base,
        }
    }

    /// Canonical URL this page's content resolved from.
    pub fn get_url(&self) -> &Url {
        &self.base
    }

    /// Whether a robots meta tag forbids following links from this page.
    pub fn nofollow(&self) -> bool {
        let document = self.parse_html();

        document.select(&META_SELECTOR).any(|element| {
            let name = element.value().attr("name").unwrap_or_default();
            let content = element.value().attr("content").unwrap_or_default();

            name.eq_ignore_ascii_case("robots")
                && content.split(',').any(|directive| {
                    let directive = directive.trim();
                    directive.eq_ignore_ascii_case("nofollow")
                        || directive.eq_ignore_ascii_case("none")
                })
        })
    }

    /// Extract the page's visible text with script, style, and noscript
    /// subtrees left out. Fragments join on single spaces.
    pub fn visible_text(&self) -> String {
        let document = self.parse_html();
        let mut text = String::new();

        for node in document.root_element().descendants() {
            let fragment = match node.value().as_text() {
                Some(fragment) => fragment,
                _ => continue,
            };

            let skipped = node.ancestors().any(|ancestor| {
                ancestor.value().as_element().map_or(false, |element| {
                    matches!(element.name(), "script" | "style" | "noscript")
                })
            });

            if skipped {
                continue;
            }

            let trimmed = fragment.trim();

            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }

        text
    }

    /// Extract, canonicalize, and filter this page's outbound links.
    ///
    /// Scope and trap rules apply here, so the frontier only ever sees
    /// admissible canonical URLs. Links are deduplicated within the page.
    pub fn out_links(&self, configuration: &Configuration) -> HashSet<String> {
        let document = self.parse_html();
        let mut links = HashSet::new();

        for element in document.select(&LINK_SELECTOR) {
            let href = match element.value().attr("href") {
                Some(href) => href,
                _ => continue,
            };

            if let Some(resolved) = normalize::canonicalize(&self.base, href) {
                if scope::is_in_scope(&resolved, configuration)
                    && !scope::looks_like_trap(&resolved, &self.base, configuration)
                {
                    links.insert(String::from(resolved));
                }
            }
        }

        links
    }

    fn parse_html(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

#[cfg(test)]
fn test_configuration() -> Configuration {
    let mut configuration = Configuration::new();
    configuration.with_allowed_domains(["ics.uci.edu", "stat.uci.edu"]);
    configuration
}

#[test]
fn test_visible_text_skips_non_content() {
    let base = Url::parse("https://www.ics.uci.edu/").unwrap();
    let page = Page::build(
        base,
        b"<html><body><script>var x = 1;</script><style>p { color: red }</style>\
          <p>Hello</p><noscript>enable scripts</noscript><div> World </div></body></html>",
    );

    assert_eq!(page.visible_text(), "Hello World");
}

#[test]
fn test_nofollow_directives() {
    let base = Url::parse("https://www.ics.uci.edu/").unwrap();

    let blocked = Page::build(
        base.clone(),
        b"<html><head><meta name=\"ROBOTS\" content=\"NOINDEX, NOFOLLOW\"></head></html>",
    );
    let none = Page::build(
        base.clone(),
        b"<html><head><meta name=\"robots\" content=\"none\"></head></html>",
    );
    let open = Page::build(
        base.clone(),
        b"<html><head><meta name=\"robots\" content=\"index, follow\"></head></html>",
    );
    let plain = Page::build(base, b"<html><body>no directives here</body></html>");

    assert!(blocked.nofollow());
    assert!(none.nofollow());
    assert!(!open.nofollow());
    assert!(!plain.nofollow());
}

#[test]
fn test_out_links_scope_and_dedup() {
    let configuration = test_configuration();
    let base = Url::parse("https://www.ics.uci.edu/a/").unwrap();
    let page = Page::build(
        base,
        b"<html><body>\
          <a href=\"b.html\">one</a>\
          <a href=\"b.html#section\">same after canonicalization</a>\
          <a href=\"//stat.uci.edu/c\">protocol relative</a>\
          <a href=\"https://example.com/offsite\">offsite</a>\
          <a href=\"/brochure.pdf\">binary</a>\
          <a href=\"#top\">fragment only</a>\
          </body></html>",
    );

    assert_eq!(page.get_url().as_str(), "https://www.ics.uci.edu/a/");

    let links = page.out_links(&configuration);

    assert_eq!(links.len(), 2);
    assert!(links.contains("https://www.ics.uci.edu/a/b.html"));
    assert!(links.contains("https://stat.uci.edu/c"));
}

#[test]
fn test_out_links_drops_trap_sibling() {
    let configuration = test_configuration();
    let base = Url::parse("https://www.ics.uci.edu/events/2023-01-01").unwrap();
    let page = Page::build(
        base,
        b"<html><body>\
          <a href=\"2023-01-02\">tomorrow</a>\
          <a href=\"/research\">fine</a>\
          </body></html>",
    );

    let links = page.out_links(&configuration);

    assert_eq!(links.len(), 1);
    assert!(links.contains("https://www.ics.uci.edu/research"));
}
