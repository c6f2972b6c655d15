use phf::phf_set;

/// Minimum length, in characters, for a token to be kept.
pub const MIN_TOKEN_LEN: usize = 3;

/// Common English words excluded from word-frequency reporting.
static STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "a", "about", "above", "after", "again", "against", "all", "am", "an",
    "and", "any", "are", "aren't", "as", "at", "be", "because", "been",
    "before", "being", "below", "between", "both", "but", "by", "can't",
    "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from",
    "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having",
    "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers",
    "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its",
    "itself", "let's", "me", "more", "most", "mustn't", "my", "myself",
    "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
    "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't",
    "so", "some", "such", "than", "that", "that's", "the", "their",
    "theirs", "them", "themselves", "then", "there", "there's", "these",
    "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was",
    "wasn't", "we", "we'd", "we'll", "we're", "we've", "were", "weren't",
    "what", "what's", "when", "when's", "where", "where's", "which",
    "while", "who", "who's", "whom", "why", "why's", "with", "won't",
    "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've",
    "your", "yours", "yourself", "yourselves",
};

/// Split visible text into lowercase tokens.
///
/// A token is a maximal run of alphanumeric or apostrophe characters. Runs
/// shorter than [`MIN_TOKEN_LEN`] are dropped. Stop words are kept here so
/// the raw count still reflects page length; frequency reporting filters
/// them out with [`is_stop_word`].
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut run = String::new();

    for character in text.chars() {
        if character.is_alphanumeric() || character == '\'' {
            for lowered in character.to_lowercase() {
                run.push(lowered);
            }
        } else if !run.is_empty() {
            flush(&mut run, &mut tokens);
        }
    }

    if !run.is_empty() {
        flush(&mut run, &mut tokens);
    }

    tokens
}

/// Check a lowercase token against the stop-word list.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

fn flush(run: &mut String, tokens: &mut Vec<String>) {
    if run.chars().count() >= MIN_TOKEN_LEN {
        tokens.push(run.clone());
    }
    run.clear();
}

#[test]
fn test_tokenize_splits_and_lowercases() {
    assert_eq!(
        tokenize("Hello, World! hello?"),
        vec!["hello", "world", "hello"]
    );
}

#[test]
fn test_tokenize_minimum_length() {
    assert_eq!(tokenize("ab cat 123 a1"), vec!["cat", "123"]);
}

#[test]
fn test_tokenize_keeps_apostrophes() {
    assert_eq!(
        tokenize("Don't stop believing"),
        vec!["don't", "stop", "believing"]
    );
}

#[test]
fn test_tokenize_empty_and_punctuation() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("!!! -- ## ..").is_empty());
}

#[test]
fn test_stop_words() {
    assert!(is_stop_word("the"));
    assert!(is_stop_word("don't"));
    assert!(!is_stop_word("research"));
}
