use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::model::{Headline, Period, TermDataset};

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "couldn", "couldn't", "d", "did", "didn", "didn't",
    "do", "does", "doesn", "doesn't", "doing", "don", "don't", "down", "during", "each", "few",
    "for", "from", "further", "had", "hadn", "hadn't", "has", "hasn", "hasn't", "have", "haven",
    "haven't", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "isn", "isn't", "it", "it's", "its", "itself", "just", "ll",
    "m", "ma", "me", "mightn", "mightn't", "more", "most", "mustn", "mustn't", "my", "myself",
    "needn", "needn't", "no", "nor", "not", "now", "o", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "ourselves", "out", "over", "own", "re", "s", "same", "shan",
    "shan't", "she", "she's", "should", "should've", "shouldn", "shouldn't", "so", "some",
    "such", "t", "than", "that", "that'll", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "ve", "very", "was", "wasn", "wasn't", "we", "were", "weren", "weren't", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "won", "won't",
    "wouldn", "wouldn't", "y", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

pub struct Tokenizer {
    word: Regex,
    stop_words: HashSet<&'static str>,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        let word = Regex::new(r"[\p{L}\p{N}]+").context("failed to compile token regex")?;
        Ok(Self {
            word,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    pub fn tokenize<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.word
            .find_iter(text)
            .map(|token| token.as_str().to_lowercase())
            .filter(|token| token.chars().all(char::is_alphabetic))
            .filter(move |token| !self.stop_words.contains(token.as_str()))
    }

    pub fn aggregate(&self, headlines: &[Headline], period: Period) -> TermDataset {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut out_of_period = 0_usize;

        for headline in headlines {
            if !period.contains(headline.publication_date) {
                out_of_period += 1;
                continue;
            }
            for token in self.tokenize(&headline.headline) {
                *counts.entry(token).or_default() += 1;
            }
        }

        debug!(
            headlines = headlines.len(),
            out_of_period,
            terms = counts.len(),
            "aggregated headline terms"
        );

        TermDataset::from_counts(counts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn headline(date: (i32, u32, u32), text: &str) -> Headline {
        Headline {
            publication_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("date"),
            headline: text.to_string(),
        }
    }

    #[test]
    fn tokenize_drops_stop_words_numbers_and_punctuation() {
        let tokenizer = Tokenizer::new().expect("tokenizer");
        let tokens: Vec<String> = tokenizer
            .tokenize("The Apple of 2022: an Orange, and the BANANA!")
            .collect();
        assert_eq!(tokens, vec!["apple", "orange", "banana"]);
    }

    #[test]
    fn aggregate_counts_terms_across_headlines() {
        let tokenizer = Tokenizer::new().expect("tokenizer");
        let period = Period::new(2022, 9).expect("period");
        let headlines = vec![
            headline((2022, 9, 1), "Apple and banana prices rise"),
            headline((2022, 9, 2), "Orange banana apple"),
            headline((2022, 9, 30), "Banana orange"),
        ];

        let dataset = tokenizer.aggregate(&headlines, period);
        let frequency = |term: &str| {
            dataset
                .rows
                .iter()
                .find(|row| row.term == term)
                .map(|row| row.frequency.clone())
        };

        assert_eq!(frequency("apple").as_deref(), Some("2"));
        assert_eq!(frequency("orange").as_deref(), Some("2"));
        assert_eq!(frequency("banana").as_deref(), Some("3"));
        assert_eq!(frequency("and"), None);
    }

    #[test]
    fn aggregate_skips_headlines_outside_period() {
        let tokenizer = Tokenizer::new().expect("tokenizer");
        let period = Period::new(2022, 9).expect("period");
        let headlines = vec![
            headline((2022, 8, 31), "Stale news"),
            headline((2022, 9, 15), "Test headline"),
        ];

        let dataset = tokenizer.aggregate(&headlines, period);
        let terms: Vec<&str> = dataset.rows.iter().map(|row| row.term.as_str()).collect();
        assert_eq!(terms, vec!["headline", "test"]);
    }
}
