//! Reference word dataset and the anagram-derivability check

use rand::Rng;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Words used when no word list is configured.
pub const DEFAULT_WORDS: [&str; 6] = ["example", "python", "pickle", "thread", "socket", "server"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read word list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("word list is empty")]
    Empty,
}

/// Returns true if every character of `word` occurs in `reference` at least
/// as many times as it occurs in `word`.
///
/// Case-sensitive. The empty word passes; callers that must refuse it check
/// that separately.
pub fn is_derivable(reference: &str, word: &str) -> bool {
    let mut available: HashMap<char, usize> = HashMap::new();
    for c in reference.chars() {
        *available.entry(c).or_insert(0) += 1;
    }

    for c in word.chars() {
        match available.get_mut(&c) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    true
}

/// Immutable list of candidate reference words, never empty.
#[derive(Debug, Clone)]
pub struct WordDataset {
    words: Vec<String>,
}

impl WordDataset {
    pub fn new<I, S>(words: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|word| {
                let word: String = word.into();
                word.trim().to_string()
            })
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            return Err(DatasetError::Empty);
        }

        Ok(Self { words })
    }

    pub fn builtin() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Loads one word per line; blank lines are skipped.
    pub async fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DatasetError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        Self::new(contents.lines())
    }

    /// Picks a word uniformly at random.
    pub fn choose(&self) -> &str {
        let index = rand::thread_rng().gen_range(0..self.words.len());
        &self.words[index]
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_of_letters_is_derivable() {
        assert!(is_derivable("server", "rev"));
        assert!(is_derivable("server", "serve"));
        assert!(is_derivable("server", "server"));
        assert!(is_derivable("thread", "hat"));
    }

    #[test]
    fn test_multiplicity_is_respected() {
        // "server" has two e's and two r's but only one s
        assert!(is_derivable("server", "err"));
        assert!(!is_derivable("server", "errr"));
        assert!(!is_derivable("server", "sss"));
    }

    #[test]
    fn test_foreign_letters_fail() {
        assert!(!is_derivable("server", "rez"));
        assert!(!is_derivable("python", "pythons"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!is_derivable("server", "Rev"));
        assert!(is_derivable("Server", "Se"));
    }

    #[test]
    fn test_empty_word_passes_multiset_check() {
        assert!(is_derivable("server", ""));
        assert!(!is_derivable("", "a"));
    }

    #[test]
    fn test_dataset_drops_blank_entries() {
        let dataset = WordDataset::new(vec!["  socket ", "", "thread", "   "]).unwrap();
        assert_eq!(dataset.words(), &["socket".to_string(), "thread".to_string()]);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let result = WordDataset::new(Vec::<String>::new());
        assert!(matches!(result, Err(DatasetError::Empty)));
    }

    #[test]
    fn test_choose_returns_dataset_word() {
        let dataset = WordDataset::builtin();
        assert!(!dataset.is_empty());

        for _ in 0..100 {
            let word = dataset.choose();
            assert!(DEFAULT_WORDS.contains(&word));
        }
    }

    #[tokio::test]
    async fn test_missing_word_file() {
        let result = WordDataset::from_file(Path::new("/nonexistent/anagrams/words.txt")).await;
        assert!(matches!(result, Err(DatasetError::Io { .. })));
    }
}
