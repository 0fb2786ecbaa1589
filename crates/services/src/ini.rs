//! Minimal INI codec for the config file.
//!
//! Supports `[section]` headers, `key = value` / `key: value` items, `#` and `;`
//! full-line comments, and indented continuation lines (blank lines inside a
//! continued value are kept). Sections and items keep their insertion order so
//! rewritten files diff cleanly.

use std::fmt::Write as _;

/// Error raised when a config file does not follow the INI layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// Whether `key` can be written as an option name and read back unchanged.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && !key.starts_with(['#', ';', '['])
        && !key.contains(['=', ':', '\n', '\r'])
}

/// Whether `name` can be written as a `[name]` header and read back unchanged.
pub fn is_valid_section_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\n', '\r'])
}

/// One `[name]` block with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }
}

/// Parsed INI file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut doc = IniDocument::new();
        let mut current: Option<usize> = None;
        let mut last_key: Option<String> = None;
        // Blank lines seen since the last item; kept only if the value continues
        let mut blank_run = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if last_key.is_some() {
                    blank_run += 1;
                }
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Indented line continues the previous value
            if line.starts_with(char::is_whitespace) {
                if let (Some(section), Some(key)) = (current, last_key.as_deref()) {
                    let section = &mut doc.sections[section];
                    let joined = format!(
                        "{}{}{}",
                        section.get(key).unwrap_or_default(),
                        "\n".repeat(blank_run + 1),
                        trimmed
                    );
                    section.set(key, joined);
                    blank_run = 0;
                    continue;
                }
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
                let name = &trimmed[1..trimmed.len() - 1];
                if name.is_empty() {
                    return Err(ParseError {
                        line: line_no,
                        message: "empty section name".into(),
                    });
                }
                current = Some(doc.section_index_or_insert(name));
                last_key = None;
                blank_run = 0;
                continue;
            }

            let Some(section) = current else {
                return Err(ParseError {
                    line: line_no,
                    message: "option found before any section header".into(),
                });
            };

            let split_at = match (trimmed.find('='), trimmed.find(':')) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => {
                    return Err(ParseError {
                        line: line_no,
                        message: format!("expected `key = value`, got {:?}", trimmed),
                    })
                }
            };
            let key = trimmed[..split_at].trim();
            let value = trimmed[split_at + 1..].trim();
            if key.is_empty() {
                return Err(ParseError {
                    line: line_no,
                    message: "empty option name".into(),
                });
            }
            doc.sections[section].set(key, value);
            last_key = Some(key.to_string());
            blank_run = 0;
        }

        Ok(doc)
    }

    /// Render the whole document. Each section is followed by a blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(out, "[{}]", section.name);
            for (key, value) in &section.entries {
                let value = value.replace('\n', "\n\t");
                if value.is_empty() {
                    let _ = writeln!(out, "{} =", key);
                } else {
                    let _ = writeln!(out, "{} = {}", key, value);
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub fn section_or_insert(&mut self, name: &str) -> &mut Section {
        let idx = self.section_index_or_insert(name);
        &mut self.sections[idx]
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        self.sections.len() != before
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_items() {
        let text = "\
# leading comment
[UserPreferences]
last_folder = {\"type\": \"str\", \"value\": \"/tmp\"}
top_k: 40
; another comment

[Other]
empty =
";
        let doc = IniDocument::parse(text).unwrap();
        assert_eq!(doc.sections().len(), 2);
        let prefs = doc.section("UserPreferences").unwrap();
        assert_eq!(
            prefs.get("last_folder"),
            Some("{\"type\": \"str\", \"value\": \"/tmp\"}")
        );
        assert_eq!(prefs.get("top_k"), Some("40"));
        assert_eq!(doc.section("Other").unwrap().get("empty"), Some(""));
    }

    #[test]
    fn test_continuation_lines() {
        let doc = IniDocument::parse("[s]\nnote = first\n\tsecond\n  third\n").unwrap();
        assert_eq!(
            doc.section("s").unwrap().get("note"),
            Some("first\nsecond\nthird")
        );

        let rendered = doc.render();
        assert_eq!(IniDocument::parse(&rendered).unwrap(), doc);
    }

    #[test]
    fn test_blank_lines_inside_a_continued_value() {
        let text = "[s]\nnote = first\n\n\tsecond\n\n\n  third\n\nnext = 1\n";
        let doc = IniDocument::parse(text).unwrap();
        let s = doc.section("s").unwrap();
        assert_eq!(s.get("note"), Some("first\n\nsecond\n\n\nthird"));
        assert_eq!(s.get("next"), Some("1"));

        let rendered = doc.render();
        assert_eq!(IniDocument::parse(&rendered).unwrap(), doc);
    }

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("top_k"));
        assert!(is_valid_key("last folder"));
        for bad in ["", " b", "b ", "a=b", "a:b", "a\nb", "#x", ";x", "[x]"] {
            assert!(!is_valid_key(bad), "{:?} should be rejected", bad);
        }
        assert!(is_valid_section_name("UserPreferences"));
        assert!(!is_valid_section_name(""));
        assert!(!is_valid_section_name("a\nb"));
    }

    #[test]
    fn test_option_before_section_is_error() {
        let err = IniDocument::parse("\nkey = value\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_line_without_separator_is_error() {
        let err = IniDocument::parse("[s]\njust words\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_repeated_section_merges_and_last_key_wins() {
        let doc = IniDocument::parse("[a]\nx = 1\n[b]\n[a]\nx = 2\ny = 3\n").unwrap();
        assert_eq!(doc.sections().len(), 2);
        let a = doc.section("a").unwrap();
        assert_eq!(a.get("x"), Some("2"));
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_render_layout() {
        let mut doc = IniDocument::new();
        doc.section_or_insert("one").set("a", "1");
        doc.section_or_insert("two").set("b", "2");
        assert_eq!(doc.render(), "[one]\na = 1\n\n[two]\nb = 2\n\n");
    }

    #[test]
    fn test_remove() {
        let mut doc = IniDocument::parse("[a]\nx = 1\n[b]\n").unwrap();
        assert!(doc.section_mut("a").unwrap().remove("x"));
        assert!(!doc.section_mut("a").unwrap().remove("x"));
        assert!(doc.remove_section("b"));
        assert!(!doc.remove_section("b"));
    }
}
