use crate::configuration::Configuration;
use phf::phf_set;
use url::Url;

/// File extensions that never resolve to crawlable markup.
static DENY_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff",
    "mid", "mp2", "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v",
    "mkv", "ogg", "ogv", "pdf", "ps", "eps", "tex", "ppt", "pptx", "doc",
    "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2", "tar",
    "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz",
    "sha1", "thmx", "mso", "arff", "rtf", "jar", "csv", "rm", "smil",
    "wmv", "swf", "wma", "zip", "rar", "gz",
};

/// Check that a canonical URL is eligible for crawling: an http or https
/// scheme, no denied file extension, and a host ending on one of the
/// configured domain suffixes.
pub fn is_in_scope(url: &Url, configuration: &Configuration) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    if has_denied_extension(url.path()) {
        return false;
    }

    match url.host_str() {
        Some(host) => domain_allowed(host, configuration),
        _ => false,
    }
}

/// Heuristics against unbounded URL spaces. A candidate link is treated as a
/// trap when its path nests deeper than the configured segment bound, or when
/// it differs from its origin's URL in only a few positions of an equal-length
/// string. The latter catches calendar grids and session aliases that mint
/// one near-identical sibling per visit.
pub fn looks_like_trap(candidate: &Url, origin: &Url, configuration: &Configuration) -> bool {
    let depth = candidate.path().split('/').filter(|s| !s.is_empty()).count();

    if depth > configuration.max_path_segments {
        return true;
    }

    let a = candidate.as_str();
    let b = origin.as_str();

    a.len() == b.len() && char_difference(a, b) <= configuration.max_url_char_diff
}

fn has_denied_extension(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((_, extension)) => DENY_EXTENSIONS.contains(extension.to_ascii_lowercase().as_str()),
        _ => false,
    }
}

fn domain_allowed(host: &str, configuration: &Configuration) -> bool {
    let components: Vec<&str> = host.split('.').collect();

    if components.len() < 3 {
        return false;
    }

    let suffix = components[components.len() - 3..].join(".");

    configuration.allowed_domains.contains(suffix.as_str())
}

/// Count of positions where two equal-length strings differ.
fn char_difference(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
fn test_configuration() -> Configuration {
    let mut configuration = Configuration::new();
    configuration.with_allowed_domains([
        "ics.uci.edu",
        "cs.uci.edu",
        "informatics.uci.edu",
        "stat.uci.edu",
    ]);
    configuration
}

#[test]
fn test_scheme_required() {
    let configuration = test_configuration();

    let ftp = Url::parse("ftp://www.ics.uci.edu/pub").unwrap();
    let mailto = Url::parse("mailto:chair@ics.uci.edu").unwrap();
    let https = Url::parse("https://www.ics.uci.edu/pub").unwrap();

    assert!(!is_in_scope(&ftp, &configuration));
    assert!(!is_in_scope(&mailto, &configuration));
    assert!(is_in_scope(&https, &configuration));
}

#[test]
fn test_denied_extensions() {
    let configuration = test_configuration();

    let pdf = Url::parse("https://www.ics.uci.edu/papers/draft.PDF").unwrap();
    let tarball = Url::parse("https://www.ics.uci.edu/dist/release.tar.gz").unwrap();
    let page = Url::parse("https://www.ics.uci.edu/papers/draft").unwrap();
    let dotted_dir = Url::parse("https://www.ics.uci.edu/v1.2/index").unwrap();

    assert!(!is_in_scope(&pdf, &configuration));
    assert!(!is_in_scope(&tarball, &configuration));
    assert!(is_in_scope(&page, &configuration));
    assert!(is_in_scope(&dotted_dir, &configuration));
}

#[test]
fn test_domain_suffixes() {
    let configuration = test_configuration();

    let www = Url::parse("https://www.ics.uci.edu/").unwrap();
    let bare = Url::parse("https://ics.uci.edu/").unwrap();
    let nested = Url::parse("https://vision.ics.uci.edu/people").unwrap();
    let short = Url::parse("https://uci.edu/").unwrap();
    let other = Url::parse("https://www.eng.uci.edu/").unwrap();

    assert!(is_in_scope(&www, &configuration));
    assert!(is_in_scope(&bare, &configuration));
    assert!(is_in_scope(&nested, &configuration));
    assert!(!is_in_scope(&short, &configuration));
    assert!(!is_in_scope(&other, &configuration));
}

#[test]
fn test_trap_path_depth() {
    let configuration = test_configuration();
    let origin = Url::parse("https://www.ics.uci.edu/").unwrap();

    let deep = Url::parse(&format!(
        "https://www.ics.uci.edu/{}",
        ["a"; 16].join("/")
    ))
    .unwrap();
    let shallow = Url::parse("https://www.ics.uci.edu/a/b/c").unwrap();

    assert!(looks_like_trap(&deep, &origin, &configuration));
    assert!(!looks_like_trap(&shallow, &origin, &configuration));
}

#[test]
fn test_trap_near_identical_sibling() {
    let configuration = test_configuration();
    let origin = Url::parse("https://www.ics.uci.edu/events/2023-01-01").unwrap();

    let sibling = Url::parse("https://www.ics.uci.edu/events/2023-01-02").unwrap();
    let distant = Url::parse("https://www.ics.uci.edu/events/9999-12-31").unwrap();
    let longer = Url::parse("https://www.ics.uci.edu/events/2023-01-01/x").unwrap();

    assert!(looks_like_trap(&sibling, &origin, &configuration));
    assert!(!looks_like_trap(&distant, &origin, &configuration));
    assert!(!looks_like_trap(&longer, &origin, &configuration));
}
