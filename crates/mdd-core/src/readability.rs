//! Flesch reading ease.
//!
//! `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`.
//! Higher is simpler; typical prose lands between 0 and 100 but the raw score
//! is unbounded, so callers normalise it.

/// Sentences with this many words or fewer are not counted as sentences.
const MIN_SENTENCE_WORDS: usize = 2;

pub fn flesch_reading_ease(text: &str) -> f64 {
    let words = words(text);
    if words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let sentences = sentence_count(text) as f64;
    let syllables: usize = words.iter().map(|word| syllable_count(word)).sum();

    let score = 206.835 - 1.015 * (word_count / sentences) - 84.6 * (syllables as f64 / word_count);
    (score * 100.0).round() / 100.0
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|ch| ch.is_alphanumeric() || *ch == '\'')
                .collect::<String>()
        })
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .collect()
}

/// Terminal-punctuation delimited sentences with more than two words; at least 1.
pub fn sentence_count(text: &str) -> usize {
    let count = text
        .split(['.', '!', '?'])
        .filter(|segment| words(segment).len() > MIN_SENTENCE_WORDS)
        .count();
    count.max(1)
}

/// Vowel-group syllable estimate for an English word; at least 1.
pub fn syllable_count(word: &str) -> usize {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphabetic())
        .collect();
    if letters.is_empty() {
        return 1;
    }

    let is_vowel = |ch: char| matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0;
    let mut previous_vowel = false;
    for &ch in &letters {
        let vowel = is_vowel(ch);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    // Silent trailing "e", but not "-le" as in "table".
    let len = letters.len();
    if len > 2 && letters[len - 1] == 'e' && !is_vowel(letters[len - 2]) && letters[len - 2] != 'l' {
        groups -= 1;
    }

    groups.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_count_common_words() {
        assert_eq!(syllable_count("cat"), 1);
        assert_eq!(syllable_count("make"), 1);
        assert_eq!(syllable_count("table"), 2);
        assert_eq!(syllable_count("banana"), 3);
        assert_eq!(syllable_count("rhythm"), 1);
        assert_eq!(syllable_count("42"), 1);
    }

    #[test]
    fn sentence_count_ignores_short_fragments() {
        assert_eq!(sentence_count("We met today. Ok. The plan is set!"), 2);
        assert_eq!(sentence_count("Hi."), 1);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(flesch_reading_ease(""), 0.0);
        assert_eq!(flesch_reading_ease("... !!"), 0.0);
    }

    #[test]
    fn simple_text_reads_easier_than_dense_text() {
        let simple = flesch_reading_ease("The cat sat on the mat. The dog ran to the park.");
        let dense = flesch_reading_ease(
            "Institutional operationalisation necessitates comprehensive intergovernmental coordination mechanisms.",
        );
        assert!(simple > 90.0, "simple = {simple}");
        assert!(dense < 0.0, "dense = {dense}");
    }
}
