use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::path;

/// Role of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialCategory {
    LessonCode,
    HomeworkCode,
    ConsultationCode,
    Plan,
    Theory,
    Homework,
    SupportingFiles,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 7] = [
        MaterialCategory::LessonCode,
        MaterialCategory::HomeworkCode,
        MaterialCategory::ConsultationCode,
        MaterialCategory::Plan,
        MaterialCategory::Theory,
        MaterialCategory::Homework,
        MaterialCategory::SupportingFiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialCategory::LessonCode => "LESSON_CODE",
            MaterialCategory::HomeworkCode => "HOMEWORK_CODE",
            MaterialCategory::ConsultationCode => "CONSULTATION_CODE",
            MaterialCategory::Plan => "PLAN",
            MaterialCategory::Theory => "THEORY",
            MaterialCategory::Homework => "HOMEWORK",
            MaterialCategory::SupportingFiles => "SUPPORTING_FILES",
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown material category '{}'", s))
    }
}

/// What a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    /// Each pattern must match some directory segment; the two may hit the
    /// same segment or different ones.
    DirectorySegments(&'static str, &'static str),
    /// The pattern must match the file name.
    FileName(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub category: MaterialCategory,
    pub matcher: RuleMatch,
}

/// Rules in precedence order. The first match wins; anything left over is
/// `SupportingFiles`.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: MaterialCategory::LessonCode,
        matcher: RuleMatch::DirectorySegments("*lesson*", "*code*"),
    },
    ClassificationRule {
        category: MaterialCategory::HomeworkCode,
        matcher: RuleMatch::DirectorySegments("*homework*", "*code*"),
    },
    ClassificationRule {
        category: MaterialCategory::ConsultationCode,
        matcher: RuleMatch::DirectorySegments("*consultation*", "*code*"),
    },
    ClassificationRule {
        category: MaterialCategory::Plan,
        matcher: RuleMatch::FileName("*plan*.md"),
    },
    ClassificationRule {
        category: MaterialCategory::Theory,
        matcher: RuleMatch::FileName("*theory*.md"),
    },
    ClassificationRule {
        category: MaterialCategory::Homework,
        matcher: RuleMatch::FileName("*homework*.md"),
    },
];

pub const DEFAULT_CATEGORY: MaterialCategory = MaterialCategory::SupportingFiles;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

enum CompiledMatch {
    DirectorySegments(Pattern, Pattern),
    FileName(Pattern),
}

lazy_static::lazy_static! {
    static ref COMPILED_RULES: Vec<(MaterialCategory, CompiledMatch)> = CLASSIFICATION_RULES
        .iter()
        .map(|rule| {
            let compiled = match rule.matcher {
                RuleMatch::DirectorySegments(a, b) => {
                    CompiledMatch::DirectorySegments(compile(a), compile(b))
                }
                RuleMatch::FileName(p) => CompiledMatch::FileName(compile(p)),
            };
            (rule.category, compiled)
        })
        .collect();
}

fn compile(pattern: &str) -> Pattern {
    Pattern::new(pattern).expect("classification rule patterns are valid globs")
}

impl CompiledMatch {
    fn matches(&self, file_path: &str) -> bool {
        match self {
            CompiledMatch::DirectorySegments(a, b) => {
                let any = |p: &Pattern| {
                    path::directory_segments(file_path)
                        .any(|seg| p.matches_with(seg, MATCH_OPTIONS))
                };
                any(a) && any(b)
            }
            CompiledMatch::FileName(p) => {
                p.matches_with(path::file_name(file_path), MATCH_OPTIONS)
            }
        }
    }
}

/// Classify a repository-relative file path. Never fails.
pub fn classify(path: &str) -> MaterialCategory {
    for (category, matcher) in COMPILED_RULES.iter() {
        if matcher.matches(path) {
            return *category;
        }
    }
    trace!("No classification rule matched '{}', using {}", path, DEFAULT_CATEGORY);
    DEFAULT_CATEGORY
}
