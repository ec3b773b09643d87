use crate::book::Section;
use crate::error::BookError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static SKIPPED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(#|$)").unwrap());
static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Read an index file into sections sorted by first page
pub fn read_index<P: AsRef<Path>>(path: P) -> Result<Vec<Section>, BookError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| BookError::ReadIndex {
        path: path.to_path_buf(),
        source,
    })?;
    parse_index(&text, path)
}

/// Parse index text; `path` is only used in diagnostics
pub fn parse_index(text: &str, path: &Path) -> Result<Vec<Section>, BookError> {
    let mut sections = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if SKIPPED_LINE.is_match(line) {
            continue;
        }

        let fields = tokenize(line).map_err(|reason| BookError::Malformed {
            path: path.to_path_buf(),
            line: line_no,
            reason,
            text: line.to_string(),
        })?;

        if let Some(section) = parse_fields(&fields, path, line_no)? {
            sections.push(section.at_line(line_no));
        }
    }

    // Stable, so sections sharing a first page keep their index order
    sections.sort_by_key(|s| s.first_page);
    Ok(sections)
}

/// Reject quoting the `csv` reader would otherwise let through: a quote
/// inside an unquoted field, text after a closing quote, or a quoted field
/// that never closes.
fn check_quoting(line: &str) -> Result<(), String> {
    let mut chars = line.chars().peekable();
    loop {
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    None => return Err("unclosed quoted field".to_string()),
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                    }
                    Some('"') => break,
                    Some(_) => {}
                }
            }
            match chars.next() {
                None => return Ok(()),
                Some(',') => {}
                Some(c) => return Err(format!("unexpected '{}' after closing quote", c)),
            }
        } else {
            loop {
                match chars.next() {
                    None => return Ok(()),
                    Some(',') => break,
                    Some('"') => return Err("quote in unquoted field".to_string()),
                    Some(_) => {}
                }
            }
        }
    }
}

fn tokenize(line: &str) -> Result<Vec<String>, String> {
    check_quoting(line)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();

    match reader.read_record(&mut record) {
        Ok(true) => {
            if record.len() > 3 {
                return Err(format!("expected at most 3 fields, found {}", record.len()));
            }
            Ok(record.iter().map(str::to_string).collect())
        }
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_fields(fields: &[String], path: &Path, line: usize) -> Result<Option<Section>, BookError> {
    let name = fields.first().map(String::as_str).unwrap_or_default();
    let first = fields.get(1).map(String::as_str).unwrap_or_default();

    let first_page = match parse_page(first) {
        Some(page) if page > 0 => page,
        _ => {
            tracing::warn!("Invalid first page '{}' for '{}'; skipping", first, name);
            return Ok(None);
        }
    };

    let last_page = match fields.get(2).map(String::as_str) {
        None | Some("") => None,
        Some(last) => match parse_page(last) {
            Some(page) if page >= first_page => Some(page),
            _ => {
                return Err(BookError::InvalidLastPage {
                    path: path.to_path_buf(),
                    line,
                    section: name.to_string(),
                    value: last.to_string(),
                })
            }
        },
    };

    Ok(Some(Section::new(name, first_page, last_page)))
}

fn parse_page(s: &str) -> Option<u32> {
    if PAGE_NUMBER.is_match(s) {
        s.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<Section>, BookError> {
        parse_index(text, Path::new("index.csv"))
    }

    fn summary(sections: &[Section]) -> Vec<(&str, u32, Option<u32>)> {
        sections
            .iter()
            .map(|s| (s.name.as_str(), s.first_page, s.last_page))
            .collect()
    }

    #[test]
    fn test_parse_basic() {
        let sections = parse("\"Intro\",1,5\n\"Chapter 1\",6\n").unwrap();
        assert_eq!(
            summary(&sections),
            vec![("Intro", 1, Some(5)), ("Chapter 1", 6, None)]
        );
        assert_eq!(sections[0].line, 1);
        assert_eq!(sections[1].line, 2);
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let text = "# table of contents\n\n   \n  # indented comment\n\"Intro\",1\n";
        let sections = parse(text).unwrap();
        assert_eq!(summary(&sections), vec![("Intro", 1, None)]);
        assert_eq!(sections[0].line, 5);
    }

    #[test]
    fn test_quoted_name_with_comma() {
        let sections = parse("\"Tools, Tips and Tricks\",4,9\n").unwrap();
        assert_eq!(summary(&sections), vec![("Tools, Tips and Tricks", 4, Some(9))]);
    }

    #[test]
    fn test_whitespace_around_fields() {
        let sections = parse("Intro, 1, 3\n").unwrap();
        assert_eq!(summary(&sections), vec![("Intro", 1, Some(3))]);
    }

    #[test]
    fn test_empty_last_page_is_unset() {
        let sections = parse("\"Intro\",1,\n").unwrap();
        assert_eq!(summary(&sections), vec![("Intro", 1, None)]);
    }

    #[test]
    fn test_invalid_first_page_is_skipped() {
        let text = "\"Intro\",1\n\"Typo\",x4\n\"Zero\",0\n\"No page\"\n\"Chapter\",3\n";
        let sections = parse(text).unwrap();
        assert_eq!(summary(&sections), vec![("Intro", 1, None), ("Chapter", 3, None)]);
    }

    #[test]
    fn test_sorted_by_first_page_stably() {
        let text = "\"C\",9\n\"A\",2\n\"B1\",5\n\"B2\",5\n";
        let sections = parse(text).unwrap();
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B1", "B2", "C"]);
    }

    #[test]
    fn test_unbalanced_quote_is_fatal() {
        let err = parse("\"Intro\",1\n\"Broken,2\n").unwrap_err();
        match err {
            BookError::Malformed { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "\"Broken,2");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_text_after_closing_quote_is_fatal() {
        let err = parse("\"Intro\",1\n\"A\"x,2\n").unwrap_err();
        match err {
            BookError::Malformed { line, reason, .. } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "unexpected 'x' after closing quote");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_quote_in_unquoted_field_is_fatal() {
        let err = parse("Say \"hi\",1\n").unwrap_err();
        match err {
            BookError::Malformed { line, reason, .. } => {
                assert_eq!(line, 1);
                assert_eq!(reason, "quote in unquoted field");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_escaped_quote_inside_quoted_field() {
        let sections = parse("\"The \"\"Best\"\" Bits\",2,4\n").unwrap();
        assert_eq!(summary(&sections), vec![("The \"Best\" Bits", 2, Some(4))]);
    }

    #[test]
    fn test_too_many_fields_is_fatal() {
        let err = parse("\"Intro\",1,2,3\n").unwrap_err();
        assert!(matches!(err, BookError::Malformed { line: 1, .. }));
        assert!(err.to_string().contains("line 1 of index.csv"));
    }

    #[test]
    fn test_invalid_last_page_is_fatal() {
        let err = parse("\"Intro\",1,five\n").unwrap_err();
        assert!(matches!(err, BookError::InvalidLastPage { line: 1, .. }));
    }

    #[test]
    fn test_last_page_before_first_is_fatal() {
        let err = parse("\"Intro\",5,3\n").unwrap_err();
        assert!(matches!(err, BookError::InvalidLastPage { line: 1, .. }));
    }

    #[test]
    fn test_read_index_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_index(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, BookError::ReadIndex { .. }));
    }
}
