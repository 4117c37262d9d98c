use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// One search/replace rule applied to every fetched title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TitleRule {
    /// Regular expression; every match is replaced.
    pub to_replace: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default = "TitleRule::default_case_sensitive")]
    pub case_sensitive: bool,
}

impl TitleRule {
    const fn default_case_sensitive() -> bool {
        true
    }

    fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.to_replace)
            .case_insensitive(!self.case_sensitive)
            .build()
    }
}

const ELLIPSIS: &str = "...";

/// Compiled replacement rules plus an optional character limit.
#[derive(Debug, Clone)]
pub struct TitleFormatter {
    rules: Vec<(Regex, String)>,
    limit: Option<usize>,
}

impl TitleFormatter {
    pub fn new(rules: &[TitleRule], limit: Option<usize>) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| rule.compile().map(|re| (re, rule.replacement.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules, limit })
    }

    pub fn format(&self, title: &str) -> String {
        let mut out = title.to_string();
        for (pattern, replacement) in &self.rules {
            out = pattern
                .replace_all(&out, replacement.as_str())
                .into_owned();
        }

        let Some(limit) = self.limit else {
            return out;
        };
        let full_len = out.chars().count();
        let truncated: String = out.chars().take(limit).collect();
        let truncated = truncated.trim();
        if truncated.chars().count() == full_len {
            truncated.to_string()
        } else {
            format!("{truncated}{ELLIPSIS}")
        }
    }
}
