// Text Processing Service
// Sentence/word tokenisation, readability statistics and search chunking

use crate::models::{TextMetrics, TextStats};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Fewer sentences than this yields no metrics.
pub const MIN_SENTENCES: usize = 3;

/// Soft upper bound (in chars) of a search chunk.
pub const SEARCH_CHUNK_MAX_CHARS: usize = 200;

const SENTENCE_TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];
const CLOSING_MARKS: [char; 7] = ['"', '\'', ')', ']', '\u{201d}', '\u{2019}', '\u{00bb}'];
const OPENING_MARKS: [char; 5] = ['(', '[', '"', '\u{201c}', '\u{2018}'];

// Lowercased tokens that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "e.g.", "i.e.", "fig.",
    "eq.", "no.", "inc.", "ltd.", "co.", "approx.", "u.s.",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextError {
    #[error("Text too short: {found} sentence(s), at least {MIN_SENTENCES} required")]
    InsufficientText { found: usize },
    #[error("Text contains no words")]
    NoWords,
    #[error("Metric {0} is not a finite number")]
    NonFiniteMetric(&'static str),
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Constant pattern; compiling it cannot fail.
    RE.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:['\u{2019}][\p{L}\p{N}]+)*").expect("word regex")
    })
}

fn is_wide_terminator(ch: char) -> bool {
    matches!(ch, '。' | '！' | '？')
}

/// Split text into sentences.
///
/// A terminator (`.`, `!`, `?`) ends a sentence only when followed by whitespace
/// or the end of input; runs of terminators and closing quotes/brackets stay with
/// the sentence they close. Decimal numbers, common abbreviations, single-letter
/// initials and continuations starting in lowercase do not split. CJK terminators
/// split unconditionally.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut buffer = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        buffer.push(ch);

        if SENTENCE_TERMINATORS.contains(&ch) {
            while i + 1 < chars.len()
                && (SENTENCE_TERMINATORS.contains(&chars[i + 1])
                    || CLOSING_MARKS.contains(&chars[i + 1]))
            {
                i += 1;
                buffer.push(chars[i]);
            }

            let at_gap = chars.get(i + 1).map_or(true, |c| c.is_whitespace());
            if is_wide_terminator(ch) || (at_gap && !is_false_boundary(&buffer, &chars[i + 1..])) {
                push_sentence(&mut sentences, &buffer);
                buffer.clear();
            }
        }

        i += 1;
    }

    push_sentence(&mut sentences, &buffer);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, buffer: &str) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn is_false_boundary(buffer: &str, rest: &[char]) -> bool {
    let token = buffer
        .split_whitespace()
        .last()
        .unwrap_or("")
        .trim_start_matches(|c: char| OPENING_MARKS.contains(&c))
        .trim_end_matches(|c: char| CLOSING_MARKS.contains(&c));

    if token.ends_with('.') {
        let lower = token.to_lowercase();
        if ABBREVIATIONS.contains(&lower.as_str()) {
            return true;
        }
        // Initials such as "J."
        let mut cs = token.chars();
        if let (Some(first), Some('.'), None) = (cs.next(), cs.next(), cs.next()) {
            if first.is_uppercase() {
                return true;
            }
        }
    }

    rest.iter()
        .find(|c| !c.is_whitespace())
        .map_or(false, |c| c.is_lowercase())
}

/// Lowercased word tokens; punctuation is dropped, inner apostrophes kept.
pub fn tokenize_words(text: &str) -> Vec<String> {
    word_re()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Vowel-group syllable estimate, at least one per word.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0usize;
    let mut prev_vowel = false;
    for &c in &letters {
        let v = is_vowel(c);
        if v && !prev_vowel {
            count += 1;
        }
        prev_vowel = v;
    }

    // Silent trailing "e" ("make"), but not "-le" ("table").
    let n = letters.len();
    if n > 2 && count > 1 && letters[n - 1] == 'e' && letters[n - 2] != 'l' && !is_vowel(letters[n - 2]) {
        count -= 1;
    }

    count.max(1)
}

/// Mean and population variance.
fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// Compute readability and lexical statistics for a document.
pub fn compute_text_metrics(text: &str) -> Result<TextMetrics, TextError> {
    let sentences = split_sentences(text);
    if sentences.len() < MIN_SENTENCES {
        return Err(TextError::InsufficientText {
            found: sentences.len(),
        });
    }

    let words = tokenize_words(text);
    if words.is_empty() {
        return Err(TextError::NoWords);
    }

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| word_re().find_iter(s).count() as f64)
        .collect();
    let (avg_sentence_length, sentence_length_variance) = mean_and_variance(&lengths);

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentences.len() as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;

    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();

    let metrics = TextMetrics {
        flesch_reading_ease: 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word,
        flesch_kincaid_grade: 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59,
        avg_sentence_length,
        sentence_length_variance,
        unique_word_ratio: unique.len() as f64 / words.len() as f64,
    };

    for (name, value) in [
        ("flesch_reading_ease", metrics.flesch_reading_ease),
        ("flesch_kincaid_grade", metrics.flesch_kincaid_grade),
        ("avg_sentence_length", metrics.avg_sentence_length),
        ("sentence_length_variance", metrics.sentence_length_variance),
        ("unique_word_ratio", metrics.unique_word_ratio),
    ] {
        if !value.is_finite() {
            return Err(TextError::NonFiniteMetric(name));
        }
    }

    Ok(metrics)
}

/// Greedily pack sentences into chunks shorter than `max_chars`.
///
/// A sentence that would bring the running chunk (joined with single spaces)
/// to `max_chars` or more starts a new chunk; a lone sentence longer than the
/// bound is emitted intact.
pub fn chunk_sentences(sentences: &[String], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in sentences {
        let sent_chars = sentence.chars().count();
        let would_be = if current.is_empty() {
            sent_chars
        } else {
            current_chars + 1 + sent_chars
        };

        if would_be < max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_chars = would_be;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
            current_chars = sent_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Sentence-aligned chunks used as exact-phrase search queries.
pub fn build_search_chunks(text: &str) -> Vec<String> {
    chunk_sentences(&split_sentences(text), SEARCH_CHUNK_MAX_CHARS)
}

/// Deterministic identity of a document (SHA-256, lowercase hex).
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Count-only summary of a document for the report header.
pub fn text_stats(text: &str) -> TextStats {
    TextStats {
        total_words: text.split_whitespace().count(),
        total_characters: text.chars().count(),
        total_sentences: split_sentences(text).len(),
    }
}

/// First `max_chars` Unicode scalars of `s`.
pub fn head_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_sentence(i: usize) -> String {
        format!("This is sentence {} {}.", i, "word ".repeat(13).trim())
    }

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences("The cat sat. The dog ran! Did the bird fly?");
        assert_eq!(sentences, vec!["The cat sat.", "The dog ran!", "Did the bird fly?"]);
    }

    #[test]
    fn test_split_sentences_keeps_decimals_and_abbreviations() {
        let sentences =
            split_sentences("Dr. Smith measured 3.14 meters. J. R. Tolkien wrote it. Done.");
        assert_eq!(
            sentences,
            vec![
                "Dr. Smith measured 3.14 meters.",
                "J. R. Tolkien wrote it.",
                "Done."
            ]
        );
    }

    #[test]
    fn test_split_sentences_closing_quote_stays() {
        let sentences = split_sentences("He said \"stop.\" Then he left. Wait...");
        assert_eq!(sentences, vec!["He said \"stop.\"", "Then he left.", "Wait..."]);
    }

    #[test]
    fn test_split_sentences_lowercase_continuation() {
        let sentences = split_sentences("Is it? maybe not. Fine.");
        assert_eq!(sentences, vec!["Is it? maybe not.", "Fine."]);
    }

    #[test]
    fn test_split_sentences_cjk() {
        let sentences = split_sentences("这是第一句。这是第二句！这是第三句？");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn test_split_sentences_without_terminator() {
        assert_eq!(split_sentences("no punctuation here"), vec!["no punctuation here"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_tokenize_words() {
        assert_eq!(
            tokenize_words("Don't STOP, it's 42 o'clock!"),
            vec!["don't", "stop", "it's", "42", "o'clock"]
        );
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("42"), 1);
    }

    #[test]
    fn test_compute_text_metrics_uniform_sentences() {
        let m = compute_text_metrics("The cat sat down. The dog ran off. The bird flew by.").unwrap();
        assert_eq!(m.avg_sentence_length, 4.0);
        assert_eq!(m.sentence_length_variance, 0.0);
        assert!((m.unique_word_ratio - 10.0 / 12.0).abs() < 1e-9);
        // 12 words, 12 syllables, 3 sentences
        assert!((m.flesch_reading_ease - 118.175).abs() < 1e-9);
        assert!((m.flesch_kincaid_grade - (-2.23)).abs() < 1e-9);
    }

    #[test]
    fn test_compute_text_metrics_population_variance() {
        // Sentence lengths 2, 4, 6 -> population variance 8/3
        let m = compute_text_metrics("Birds sing. Dogs bark at night. Cats sleep all day long too.").unwrap();
        assert_eq!(m.avg_sentence_length, 4.0);
        assert!((m.sentence_length_variance - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_text_metrics_too_few_sentences() {
        let err = compute_text_metrics("One sentence. Two sentences.").unwrap_err();
        assert_eq!(err, TextError::InsufficientText { found: 2 });
    }

    #[test]
    fn test_compute_text_metrics_no_words() {
        let err = compute_text_metrics("... !!! ???").unwrap_err();
        assert!(matches!(err, TextError::InsufficientText { .. } | TextError::NoWords));
        let err = compute_text_metrics("-- . ++ . ** .").unwrap_err();
        assert_eq!(err, TextError::NoWords);
    }

    #[test]
    fn test_chunk_sentences_respects_bound_and_order() {
        let sentences: Vec<String> = (1..=5).map(long_sentence).collect();
        let text = sentences.join(" ");
        assert!(text.chars().count() > 400);

        let chunks = build_search_chunks(&text);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() < SEARCH_CHUNK_MAX_CHARS);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_chunk_sentences_keeps_oversized_sentence_intact() {
        let huge = format!("{}.", "x".repeat(250));
        let sentences = vec!["Short one.".to_string(), huge.clone(), "Tail.".to_string()];
        let chunks = chunk_sentences(&sentences, SEARCH_CHUNK_MAX_CHARS);
        assert_eq!(chunks, vec!["Short one.".to_string(), huge, "Tail.".to_string()]);
    }

    #[test]
    fn test_chunk_sentences_empty() {
        assert!(chunk_sentences(&[], SEARCH_CHUNK_MAX_CHARS).is_empty());
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        let a = content_hash("hello");
        assert_eq!(a, content_hash("hello"));
        assert_ne!(a, content_hash("hello!"));
        assert_eq!(
            a,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_text_stats() {
        let stats = text_stats("One two three. Four five.");
        assert_eq!(stats.total_words, 5);
        assert_eq!(stats.total_characters, 25);
        assert_eq!(stats.total_sentences, 2);
    }

    #[test]
    fn test_head_chars_is_char_safe() {
        assert_eq!(head_chars("你好世界", 2), "你好");
        assert_eq!(head_chars("abc", 10), "abc");
    }
}
