//! Task reference extraction from commit messages.
//!
//! A reference is written as `[qualifier|]ref|https://<host>/<workspace>/<project>/<task>`,
//! for example `complete|ref|https://app.asana.com/0/1204/5678`. The `ref|`
//! marker must immediately precede the URL so that links mentioned in prose
//! are never picked up.

use regex::Regex;
use std::sync::LazyLock;

/// Matches one reference starting at the beginning of the text or after
/// whitespace. `lead` holds that whitespace so stripping can keep it.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<lead>^|\s)(?:(?P<qualifier>[^|\s]+)\|)?ref\|",
        r"https://[^/\s|]+/[^/\s|]+/(?P<project>[^/\s|?#]+)/(?P<task>[^/\s|?#]+)",
    ))
    .unwrap()
});

/// A project/task pair mentioned in a commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReference {
    /// Action keyword written before the marker; empty when absent.
    pub qualifier: String,
    /// Tracker project id.
    pub project_id: String,
    /// Tracker task id.
    pub task_id: String,
}

impl TaskReference {
    /// Qualifier, if one was written.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        if self.qualifier.is_empty() {
            None
        } else {
            Some(&self.qualifier)
        }
    }
}

/// Extract every reference in `message`, in order of appearance.
///
/// Duplicates are kept. A message without references yields an empty vector.
#[must_use]
pub fn extract_references(message: &str) -> Vec<TaskReference> {
    REFERENCE_PATTERN
        .captures_iter(message)
        .map(|caps| TaskReference {
            qualifier: caps
                .name("qualifier")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            project_id: caps["project"].to_string(),
            task_id: caps["task"].to_string(),
        })
        .collect()
}

/// Remove every reference (qualifier included) from `message`, leaving the
/// remaining text untouched.
#[must_use]
pub fn strip_references(message: &str) -> String {
    REFERENCE_PATTERN.replace_all(message, "${lead}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(qualifier: &str, project_id: &str, task_id: &str) -> TaskReference {
        TaskReference {
            qualifier: qualifier.to_string(),
            project_id: project_id.to_string(),
            task_id: task_id.to_string(),
        }
    }

    #[test]
    fn test_plain_text_has_no_references() {
        assert!(extract_references("test").is_empty());
        assert!(extract_references("").is_empty());
    }

    #[test]
    fn test_bare_url_is_not_a_reference() {
        assert!(extract_references("https://app.asana.com/0/1/2").is_empty());
        assert!(extract_references("see https://app.asana.com/0/1/2 for details").is_empty());
    }

    #[test]
    fn test_marker_must_precede_url() {
        assert!(extract_references("ref|Added feature https://app.asana.com/0/1/2").is_empty());
        assert!(extract_references("ref| https://app.asana.com/0/1/2").is_empty());
    }

    #[test]
    fn test_qualifier_without_marker() {
        assert!(extract_references("completed|https://app.asana.com/0/1/2").is_empty());
    }

    #[test]
    fn test_multiple_references_without_qualifier() {
        let refs =
            extract_references("ref|https://app.asana.com/0/1/2 ref|https://app.asana.com/0/3/4");
        assert_eq!(refs, vec![reference("", "1", "2"), reference("", "3", "4")]);
    }

    #[test]
    fn test_single_qualified_reference() {
        let refs = extract_references("complete|ref|https://app.asana.com/0/1/2");
        assert_eq!(refs, vec![reference("complete", "1", "2")]);
        assert_eq!(refs[0].qualifier(), Some("complete"));
    }

    #[test]
    fn test_qualified_references_keep_order() {
        let refs = extract_references(
            "complete|ref|https://app.asana.com/0/1/2 close|ref|https://app.asana.com/0/2/3",
        );
        assert_eq!(
            refs,
            vec![reference("complete", "1", "2"), reference("close", "2", "3")]
        );
    }

    #[test]
    fn test_whitespace_breaks_qualifier() {
        let refs = extract_references("complete |ref|https://app.asana.com/0/1/2");
        assert!(refs.is_empty());

        let refs = extract_references("complete| ref|https://app.asana.com/0/1/2");
        assert_eq!(refs, vec![reference("", "1", "2")]);
        assert_eq!(refs[0].qualifier(), None);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let message = "ref|https://app.asana.com/0/1/2 and ref|https://app.asana.com/0/1/2";
        let refs = extract_references(message);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], refs[1]);
    }

    #[test]
    fn test_reference_inside_prose() {
        let refs = extract_references(
            "fix: adjust timeout ref|https://tracker.example/ws/proj-9/task-42\n\nbody text",
        );
        assert_eq!(refs, vec![reference("", "proj-9", "task-42")]);
    }

    #[test]
    fn test_trailing_path_segment_ignored() {
        let refs = extract_references("ref|https://app.asana.com/0/11/22/f");
        assert_eq!(refs, vec![reference("", "11", "22")]);
    }

    #[test]
    fn test_strip_keeps_surrounding_text() {
        let stripped = strip_references(
            "fix: adjust timeout close|ref|https://app.asana.com/0/1/2\n\n  details here",
        );
        assert_eq!(stripped, "fix: adjust timeout \n\n  details here");
    }

    #[test]
    fn test_marker_inside_word_is_ignored() {
        let message = "see xref|https://app.asana.com/0/1/2";
        assert!(extract_references(message).is_empty());
        assert_eq!(strip_references(message), message);
    }

    #[test]
    fn test_reference_after_newline() {
        let refs = extract_references("fix: retry\nclose|ref|https://app.asana.com/0/1/2");
        assert_eq!(refs, vec![reference("close", "1", "2")]);
        assert_eq!(
            strip_references("fix: retry\nclose|ref|https://app.asana.com/0/1/2 tail"),
            "fix: retry\n tail"
        );
    }

    #[test]
    fn test_strip_adjacent_references_keeps_separators() {
        let stripped = strip_references(
            "a ref|https://app.asana.com/0/1/2 ref|https://app.asana.com/0/3/4 b",
        );
        assert_eq!(stripped, "a   b");
    }

    #[test]
    fn test_strip_without_references_is_identity() {
        let message = "  plain\tmessage\n";
        assert_eq!(strip_references(message), message);
    }
}
