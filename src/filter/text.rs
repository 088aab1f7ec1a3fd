//! Title similarity — token-set Jaccard over stopword-stripped words
//! (SPEC_FULL.md §4.C stage 2, shared with the ML feature extractor).

use std::collections::HashSet;

fn tokenize(title: &str, is_stopword: impl Fn(&str) -> bool) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the two titles' stopword-stripped token sets.
/// Two empty token sets are defined as dissimilar (0.0), not undefined.
#[must_use]
pub fn title_jaccard(a: &str, b: &str, is_stopword: impl Fn(&str) -> bool + Copy) -> f64 {
    let set_a = tokenize(a, is_stopword);
    let set_b = tokenize(b, is_stopword);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::stopwords::is_stopword;

    #[test]
    fn identical_titles_are_fully_similar() {
        assert_eq!(title_jaccard("Will Bitcoin hit $100k?", "Will Bitcoin hit $100k?", is_stopword), 1.0);
    }

    #[test]
    fn disjoint_titles_score_zero() {
        assert_eq!(title_jaccard("completely unrelated filler", "another thing entirely", is_stopword), 0.0);
    }

    #[test]
    fn stopwords_do_not_inflate_similarity() {
        let a = "Will the president win the election";
        let b = "the election of the president is in doubt";
        // Shares "president"/"election" as content words; "will"/"the"/"win"/"is"/"in"/"of"/"doubt" don't all overlap.
        let score = title_jaccard(a, b, is_stopword);
        assert!(score > 0.0 && score < 1.0);
    }
}
