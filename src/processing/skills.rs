//! Hard skill filter and skill overlap scoring

use crate::config::{EmptySkillPolicy, ScoringConfig};
use crate::error::{RecommenderError, Result};
use crate::processing::text_processor::TextProcessor;
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::fmt;
use strsim::normalized_levenshtein;

/// Shortest skill name considered for fuzzy comparison
const MIN_FUZZY_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

/// A user skill found in a listing's requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub mode: MatchMode,
    pub score: f64,
}

impl fmt::Display for SkillMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            MatchMode::Exact => write!(f, "{} (exact)", self.skill),
            MatchMode::Fuzzy => write!(f, "{} (fuzzy {:.2})", self.skill, self.score),
        }
    }
}

#[derive(Debug, Clone)]
struct UserSkill {
    original: String,
    canonical: String,
}

/// Matches one profile's skills against listing requirement text
pub struct SkillMatcher {
    processor: TextProcessor,
    skills: Vec<UserSkill>,
    automaton: Option<AhoCorasick>,
    /// Index into `skills` for each automaton pattern
    pattern_owner: Vec<usize>,
    fuzzy_threshold: f64,
    min_matches: usize,
    empty_policy: EmptySkillPolicy,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '_')
}

/// True when `text[start..end]` is not part of a longer word
fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));

    let mut after = text[end..].chars();
    let after_ok = match after.next() {
        None => true,
        // "node" must not match inside "node.js", but "python." ends a sentence
        Some('.') => after.next().map_or(true, |c| !c.is_alphanumeric()),
        Some(c) => !is_word_char(c),
    };

    before_ok && after_ok
}

impl SkillMatcher {
    pub fn new(profile_skills: &[String], scoring: &ScoringConfig) -> Result<Self> {
        let processor = TextProcessor::new();

        let mut skills: Vec<UserSkill> = Vec::new();
        for original in profile_skills {
            let canonical = processor.normalize_skill(original);
            if canonical.is_empty() || skills.iter().any(|s| s.canonical == canonical) {
                continue;
            }
            skills.push(UserSkill {
                original: original.trim().to_string(),
                canonical,
            });
        }

        let mut patterns = Vec::new();
        let mut pattern_owner = Vec::new();
        for (index, skill) in skills.iter().enumerate() {
            let mut spellings = processor.spellings(&skill.canonical);
            let typed = processor.normalize_text(&skill.original);
            if !spellings.contains(&typed) {
                spellings.push(typed);
            }
            for spelling in spellings {
                patterns.push(spelling);
                pattern_owner.push(index);
            }
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&patterns).map_err(|e| {
                RecommenderError::InvalidUserProfile(format!("Failed to build skill matcher: {}", e))
            })?)
        };

        Ok(Self {
            processor,
            skills,
            automaton,
            pattern_owner,
            fuzzy_threshold: scoring.fuzzy_threshold,
            min_matches: scoring.min_skill_matches,
            empty_policy: scoring.empty_skills,
        })
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    /// Find which user skills appear in the requirements, in profile order
    pub fn match_skills(&self, requirements: &str) -> Vec<SkillMatch> {
        if self.skills.is_empty() {
            return Vec::new();
        }

        let listed = self.processor.parse_skill_list(requirements);
        let text = self.processor.normalize_text(requirements);
        let mut found = vec![false; self.skills.len()];

        for (index, skill) in self.skills.iter().enumerate() {
            if listed.binary_search(&skill.canonical).is_ok() {
                found[index] = true;
            }
        }

        if let Some(automaton) = &self.automaton {
            for mat in automaton.find_overlapping_iter(&text) {
                if at_word_boundary(&text, mat.start(), mat.end()) {
                    found[self.pattern_owner[mat.pattern().as_usize()]] = true;
                }
            }
        }

        let mut candidates: Vec<String> = listed.iter().map(|s| self.processor.token_sort(s)).collect();
        candidates.extend(self.processor.tokenize(&text));

        self.skills
            .iter()
            .enumerate()
            .filter_map(|(index, skill)| {
                if found[index] {
                    return Some(SkillMatch {
                        skill: skill.original.clone(),
                        mode: MatchMode::Exact,
                        score: 1.0,
                    });
                }
                self.best_fuzzy(&skill.canonical, &candidates).map(|score| SkillMatch {
                    skill: skill.original.clone(),
                    mode: MatchMode::Fuzzy,
                    score,
                })
            })
            .collect()
    }

    fn best_fuzzy(&self, canonical: &str, candidates: &[String]) -> Option<f64> {
        if canonical.chars().count() < MIN_FUZZY_LEN {
            return None;
        }
        let sorted = self.processor.token_sort(canonical);

        candidates
            .iter()
            .filter(|c| c.chars().count() >= MIN_FUZZY_LEN)
            .map(|c| normalized_levenshtein(&sorted, c))
            .filter(|score| *score >= self.fuzzy_threshold)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Hard filter: keep the listing when enough user skills match
    pub fn passes(&self, matches: &[SkillMatch]) -> bool {
        if self.skills.is_empty() {
            return self.empty_policy == EmptySkillPolicy::PassAll;
        }
        matches.len() >= self.min_matches
    }

    /// Share of the user's skills found in the listing, in [0, 1]
    pub fn overlap(&self, matches: &[SkillMatch]) -> f64 {
        if self.skills.is_empty() {
            return 0.0;
        }
        (matches.len() as f64 / self.skills.len() as f64).clamp(0.0, 1.0)
    }
}
