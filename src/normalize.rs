use url::Url;

/// Parse an absolute URL and strip its query and fragment.
pub fn canonical(url: &str) -> Option<Url> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    strip(&mut parsed);
    Some(parsed)
}

/// Canonicalize one hyperlink reference found on `base`.
///
/// Empty and fragment-only references resolve to the page itself and are
/// dropped. Protocol-relative references are pinned to https. The resolved
/// URL loses its query and fragment, so every alias of a page collapses to
/// one string.
pub fn canonicalize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut resolved = if href.starts_with("//") {
        Url::parse(&string_concat::string_concat!("https:", href)).ok()?
    } else {
        base.join(href).ok()?
    };

    strip(&mut resolved);

    Some(resolved)
}

fn strip(url: &mut Url) {
    url.set_query(None);
    url.set_fragment(None);
}

#[test]
fn test_canonicalize_relative() {
    let base = Url::parse("https://www.ics.uci.edu/about/index.html").unwrap();

    assert_eq!(
        canonicalize(&base, "visit.html").unwrap().as_str(),
        "https://www.ics.uci.edu/about/visit.html"
    );
    assert_eq!(
        canonicalize(&base, "/research").unwrap().as_str(),
        "https://www.ics.uci.edu/research"
    );
}

#[test]
fn test_canonicalize_protocol_relative() {
    let base = Url::parse("http://www.ics.uci.edu/").unwrap();
    let resolved = canonicalize(&base, "//stat.uci.edu/courses").unwrap();

    assert_eq!(resolved.scheme(), "https");
    assert_eq!(resolved.as_str(), "https://stat.uci.edu/courses");
}

#[test]
fn test_canonicalize_strips_query_and_fragment() {
    let base = Url::parse("https://www.ics.uci.edu/").unwrap();

    let with_query = canonicalize(&base, "/events?d=2023-01-01&view=list").unwrap();
    let with_fragment = canonicalize(&base, "/events#today").unwrap();

    assert_eq!(with_query.as_str(), "https://www.ics.uci.edu/events");
    assert_eq!(with_query, with_fragment);
}

#[test]
fn test_canonicalize_drops_empty_and_fragment_only() {
    let base = Url::parse("https://www.ics.uci.edu/").unwrap();

    assert_eq!(canonicalize(&base, ""), None);
    assert_eq!(canonicalize(&base, "   "), None);
    assert_eq!(canonicalize(&base, "#section-2"), None);
}

#[test]
fn test_canonicalize_rejects_malformed() {
    let base = Url::parse("https://www.ics.uci.edu/").unwrap();

    assert_eq!(canonicalize(&base, "https://["), None);
}

#[test]
fn test_canonicalize_idempotent() {
    let base = Url::parse("https://www.ics.uci.edu/a/b.html").unwrap();

    let once = canonicalize(&base, "../c?q=1#top").unwrap();
    let twice = canonicalize(&base, once.as_str()).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_canonical_absolute() {
    let parsed = canonical("https://www.ics.uci.edu/path?page=2#frag").unwrap();

    assert_eq!(parsed.as_str(), "https://www.ics.uci.edu/path");
    assert_eq!(canonical("not a url"), None);
}
