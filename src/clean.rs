//! Text clean-up applied to posts before they are written out

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Abbreviations that are followed by more of the same sentence, never by a new one.
/// Words that double as ordinary words ("no.", "co.") or commonly close a sentence
/// ("Inc.", "U.S.") are left out.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "mt.", "vs.", "e.g.", "i.e.", "cf.", "approx.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Break each post into sentences, one output line per sentence
    pub split_sentences: bool,
    /// Drop posts that are nothing but a link
    pub remove_urls: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            split_sentences: false,
            remove_urls: true,
        }
    }
}

pub fn clean_posts<I, S>(posts: I, options: &CleanOptions) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned = Vec::new();
    for post in posts {
        let post = normalize_whitespace(post.as_ref());
        if post.is_empty() {
            continue;
        }
        if options.remove_urls && is_url(&post) {
            continue;
        }
        if options.split_sentences {
            // Links trailing a "!" or "?" become sentences of their own
            cleaned.extend(
                split_sentences(&post)
                    .into_iter()
                    .filter(|sentence| !(options.remove_urls && is_url(sentence))),
            );
        } else {
            cleaned.push(post);
        }
    }
    cleaned
}

fn normalize_whitespace(text: &str) -> String {
    text.replace(|c: char| matches!(c, '\n' | '\t' | '\r'), " ")
        .trim()
        .to_string()
}

/// Whether the whole of `text` is a single web link
pub fn is_url(text: &str) -> bool {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(text) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https" | "ftp")
                && url.host_str().map_or(false, |host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Split on Unicode sentence boundaries, without breaking after common abbreviations
/// or initials
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut pending = String::new();
    for segment in text.split_sentence_bounds() {
        pending.push_str(segment);
        if ends_with_abbreviation(pending.trim_end()) {
            continue;
        }
        push_trimmed(&mut sentences, &pending);
        pending.clear();
    }
    push_trimmed(&mut sentences, &pending);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
}

fn ends_with_abbreviation(text: &str) -> bool {
    let word = match text.rsplit(char::is_whitespace).next() {
        Some(word) if word.ends_with('.') => word,
        _ => return false,
    };
    let lower = word.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Initials such as the "J." in "J. Smith", but not the pronoun
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_uppercase() && c != 'I'
    )
}
