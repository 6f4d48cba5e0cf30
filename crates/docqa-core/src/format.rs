//! Display cleanup for extracted source chunks
//!
//! PDF extraction tends to glue words together and flatten bullet lists.
//! This only reshapes whitespace for reading; the chunk text itself is never
//! interpreted.

use regex::Regex;
use std::sync::OnceLock;

const BULLET: char = '•';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedChunk {
    /// The raw chunk contained bullet characters
    pub bulleted: bool,
    pub lines: Vec<String>,
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn repeated_newlines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("valid regex"))
}

pub fn format_chunk(text: &str) -> FormattedChunk {
    let spaced = camel_boundary().replace_all(text, "$1 $2");
    let collapsed = whitespace_run().replace_all(&spaced, " ");
    let bulleted_lines = collapsed.replace(BULLET, "\n• ");
    let tidy = repeated_newlines().replace_all(&bulleted_lines, "\n");

    let lines = tidy
        .trim()
        .split(|c: char| c == '\n' || c == BULLET)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    FormattedChunk {
        bulleted: text.contains(BULLET),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_glued_words() {
        let chunk = format_chunk("the quarterly reportShows growth");
        assert_eq!(chunk.lines, vec!["the quarterly report Shows growth"]);
        assert!(!chunk.bulleted);
    }

    #[test]
    fn test_collapses_whitespace() {
        let chunk = format_chunk("  lots\n\n of   \t space  ");
        assert_eq!(chunk.lines, vec!["lots of space"]);
    }

    #[test]
    fn test_bullets_become_lines() {
        let chunk = format_chunk("Intro textMain point • first item • second item");
        assert!(chunk.bulleted);
        assert_eq!(
            chunk.lines,
            vec!["Intro text Main point", "first item", "second item"]
        );
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = format_chunk("   ");
        assert!(chunk.lines.is_empty());
        assert!(!chunk.bulleted);
    }
}
