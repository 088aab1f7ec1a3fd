//! A small closed stopword list for title-similarity tokenization
//! (SPEC_FULL.md §4.C stage 2).

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "will", "be", "is", "are", "was", "were", "to", "of", "in", "on", "at",
    "by", "for", "with", "and", "or", "win", "does", "do", "this", "that", "it", "its", "as",
];

#[must_use]
pub(crate) fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}
