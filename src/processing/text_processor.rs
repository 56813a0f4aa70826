//! Skill text normalization and tokenization

use regex::Regex;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Alternate spellings mapped to one canonical skill name
const SYNONYMS: &[(&str, &str)] = &[
    ("natural language processing", "nlp"),
    ("js", "javascript"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("nodejs", "node.js"),
    ("cpp", "c++"),
    ("c plus plus", "c++"),
    ("unity", "unity3d"),
    ("ml", "machine learning"),
    ("postgres", "postgresql"),
    ("golang", "go"),
    ("ms excel", "excel"),
    ("microsoft excel", "excel"),
];

pub struct TextProcessor {
    synonyms: HashMap<String, String>,
    separator_regex: Regex,
    strip_regex: Regex,
    list_split_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let synonyms = SYNONYMS
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .collect();

        let separator_regex = Regex::new(r"[\s\-_]+").expect("Invalid separator regex");

        // Keep characters that carry meaning in skill names: c++, c#, node.js
        let strip_regex = Regex::new(r"[^\w\s+#.]").expect("Invalid strip regex");

        let list_split_regex = Regex::new(r"[,;|\n]+").expect("Invalid list split regex");

        Self {
            synonyms,
            separator_regex,
            strip_regex,
            list_split_regex,
        }
    }

    /// Lowercase and collapse separators without dropping punctuation
    pub fn normalize_text(&self, text: &str) -> String {
        self.separator_regex
            .replace_all(&text.to_lowercase(), " ")
            .trim()
            .to_string()
    }

    /// Normalize a single skill name to its canonical form
    pub fn normalize_skill(&self, skill: &str) -> String {
        let collapsed = self.normalize_text(skill);
        let stripped = self.strip_regex.replace_all(&collapsed, "");
        let cleaned = stripped.trim().trim_end_matches('.').trim();

        self.synonyms
            .get(cleaned)
            .cloned()
            .unwrap_or_else(|| cleaned.to_string())
    }

    /// Every spelling that normalizes to the same canonical skill
    pub fn spellings(&self, canonical: &str) -> Vec<String> {
        let mut spellings = vec![canonical.to_string()];
        spellings.extend(
            self.synonyms
                .iter()
                .filter(|(_, target)| target.as_str() == canonical)
                .map(|(alias, _)| alias.clone()),
        );
        spellings.sort();
        spellings.dedup();
        spellings
    }

    /// Split a requirements field into normalized skill names.
    ///
    /// Handles both comma separated text and the bracketed list form
    /// (`['Python', 'SQL']`) found in scraped exports.
    pub fn parse_skill_list(&self, requirements: &str) -> Vec<String> {
        let trimmed = requirements.trim();
        let body = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed);

        let mut skills: Vec<String> = self
            .list_split_regex
            .split(body)
            .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"'))
            .map(|item| self.normalize_skill(item))
            .filter(|item| !item.is_empty())
            .collect();

        skills.sort();
        skills.dedup();
        skills
    }

    /// Tokenize text into lowercase words using Unicode segmentation
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|word| word.to_lowercase())
            .filter(|word| word.chars().any(|c| c.is_alphabetic()))
            .collect()
    }

    /// Sort the words of a phrase so word order does not affect comparison
    pub fn token_sort(&self, phrase: &str) -> String {
        let mut words: Vec<&str> = phrase.split_whitespace().collect();
        words.sort_unstable();
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skill() {
        let processor = TextProcessor::new();
        assert_eq!(processor.normalize_skill("  Machine-Learning "), "machine learning");
        assert_eq!(processor.normalize_skill("ReactJS"), "react");
        assert_eq!(processor.normalize_skill("C++"), "c++");
        assert_eq!(processor.normalize_skill("C#"), "c#");
        assert_eq!(processor.normalize_skill("Node.js"), "node.js");
        assert_eq!(processor.normalize_skill("Python!"), "python");
        assert_eq!(processor.normalize_skill("JS"), "javascript");
    }

    #[test]
    fn test_parse_skill_list_forms() {
        let processor = TextProcessor::new();
        assert_eq!(
            processor.parse_skill_list("['Python', 'Machine Learning', 'python']"),
            vec!["machine learning", "python"]
        );
        assert_eq!(
            processor.parse_skill_list("SQL; Excel | Power-BI"),
            vec!["excel", "power bi", "sql"]
        );
        assert!(processor.parse_skill_list("  ").is_empty());
    }

    #[test]
    fn test_spellings_include_aliases() {
        let processor = TextProcessor::new();
        let spellings = processor.spellings("react");
        assert!(spellings.contains(&"react".to_string()));
        assert!(spellings.contains(&"reactjs".to_string()));
        assert!(spellings.contains(&"react.js".to_string()));
    }

    #[test]
    fn test_tokenize_and_sort() {
        let processor = TextProcessor::new();
        assert_eq!(
            processor.tokenize("Requires Python and Excel, 2 years"),
            vec!["requires", "python", "and", "excel", "years"]
        );
        assert_eq!(processor.token_sort("learning machine"), "learning machine");
        assert_eq!(processor.token_sort("machine learning"), "learning machine");
    }
}
