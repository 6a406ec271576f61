//! Display-time filtering of assistant replies.
//!
//! The assistant backend occasionally leaks project-scaffold text (file
//! paths of a web starter project, tutorial step headings) into its answers.
//! [`ScaffoldFilter`] drops those lines when a reply is rendered. It is a pure
//! function of the stored text; stored messages are never rewritten.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Line prefixes dropped by [`ScaffoldFilter::default`] (matched after trimming).
pub const DEFAULT_SCAFFOLD_PREFIXES: &[&str] = &["my-next-app/"];

/// Substrings dropped by [`ScaffoldFilter::default`].
pub const DEFAULT_SCAFFOLD_SUBSTRINGS: &[&str] =
    &["Pages vs components", "Step 1 Create", "Step 2 Create"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldFilter {
    /// A line whose trimmed text starts with any of these is dropped.
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// A line containing any of these is dropped.
    #[serde(default)]
    pub substrings: Vec<String>,
}

impl Default for ScaffoldFilter {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_SCAFFOLD_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            substrings: DEFAULT_SCAFFOLD_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ScaffoldFilter {
    /// A filter that keeps every line.
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            substrings: Vec::new(),
        }
    }

    pub fn is_scaffold_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.prefixes
            .iter()
            .any(|p| !p.is_empty() && trimmed.starts_with(p.as_str()))
            || self
                .substrings
                .iter()
                .any(|s| !s.is_empty() && line.contains(s.as_str()))
    }

    /// Returns `text` without scaffold lines, borrowing when nothing matched.
    pub fn clean<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.split('\n').any(|line| self.is_scaffold_line(line)) {
            return Cow::Borrowed(text);
        }
        let kept: Vec<&str> = text
            .split('\n')
            .filter(|line| !self.is_scaffold_line(line))
            .collect();
        Cow::Owned(kept.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_project_path_lines() {
        let filter = ScaffoldFilter::default();
        let reply = "Room 101 is available.\nmy-next-app/src/app/page.tsx\nRoom 102 is booked.";
        assert_eq!(
            filter.clean(reply),
            "Room 101 is available.\nRoom 102 is booked."
        );
    }

    #[test]
    fn test_prefix_matches_after_trimming() {
        let filter = ScaffoldFilter::default();
        assert!(filter.is_scaffold_line("   my-next-app/components/Card.tsx"));
        assert!(!filter.is_scaffold_line("see my-next-app/ for details"));
    }

    #[test]
    fn test_drops_instructional_substrings() {
        let filter = ScaffoldFilter::default();
        let reply = "Answer first.\n## Step 1 Create a project\nPages vs components explained\nStep 2 Create a page\nAnswer last.";
        assert_eq!(filter.clean(reply), "Answer first.\nAnswer last.");
    }

    #[test]
    fn test_clean_text_is_borrowed() {
        let filter = ScaffoldFilter::default();
        let reply = "Room 101 is available";
        assert!(matches!(filter.clean(reply), Cow::Borrowed(_)));
    }

    #[test]
    fn test_preserves_blank_lines_and_order() {
        let filter = ScaffoldFilter::default();
        let reply = "a\n\nmy-next-app/x\nb\n\nc";
        assert_eq!(filter.clean(reply), "a\n\nb\n\nc");
    }

    #[test]
    fn test_none_keeps_everything() {
        let filter = ScaffoldFilter::none();
        let reply = "my-next-app/src\nStep 1 Create";
        assert_eq!(filter.clean(reply), reply);
    }

    #[test]
    fn test_empty_patterns_match_nothing() {
        let filter = ScaffoldFilter {
            prefixes: vec![String::new()],
            substrings: vec![String::new()],
        };
        assert!(!filter.is_scaffold_line("anything"));
    }
}
