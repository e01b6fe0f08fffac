//! Paragraph, sentence and word segmentation

use std::sync::LazyLock;

use regex::Regex;

/// Abbreviations that end in a period without ending the sentence
pub const ABBREVIATIONS: [&str; 8] = ["т.е.", "т.к.", "и т.д.", "и т.п.", "д.р.", "г.", "стр.", "рис."];

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("static regex"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[А-Яа-яA-Za-z0-9ёЁ\-]+").expect("static regex"));
static TRAILING_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("static regex"));
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

/// Lowercase and collapse whitespace runs to single spaces.
#[must_use]
pub fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-empty, trimmed paragraphs separated by blank lines.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split at whitespace that follows `.`, `!` or `?`.
fn split_after_terminators(para: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut prev = None;
    let mut chars = para.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            pieces.push(&para[start..i]);
            let mut end = i + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if !d.is_whitespace() {
                    break;
                }
                end = j + d.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    pieces.push(&para[start..]);
    pieces
}

/// True when `chunk` ends with a known abbreviation that starts at a word boundary.
fn ends_with_abbreviation(chunk: &str) -> bool {
    let normalized = normalize(chunk);
    ABBREVIATIONS.iter().any(|abbr| {
        normalized.strip_suffix(abbr).is_some_and(|head| {
            head.chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric())
        })
    })
}

/// Sentences of a paragraph, re-joined where a split landed after an abbreviation.
#[must_use]
pub fn split_sentences(para: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for piece in split_after_terminators(para) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if ends_with_abbreviation(last) => {
                last.push(' ');
                last.push_str(piece);
            }
            _ => merged.push(piece.to_string()),
        }
    }
    merged
}

#[must_use]
pub fn word_count(s: &str) -> usize {
    WORD.find_iter(s).count()
}

/// Strip trailing spaces and tabs and collapse runs of blank lines to one.
#[must_use]
pub fn fix_whitespace(text: &str) -> String {
    let stripped = TRAILING_BLANKS.replace_all(text, "");
    EXTRA_NEWLINES.replace_all(&stripped, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs() {
        let text = "\nПервый абзац.\n\n  \nВторой\nабзац.\n\n";
        assert_eq!(split_paragraphs(text), vec!["Первый абзац.", "Второй\nабзац."]);
    }

    #[test]
    fn test_sentences_split_on_terminators() {
        assert_eq!(
            split_sentences("Раз. Два!  Три? Четыре"),
            vec!["Раз.", "Два!", "Три?", "Четыре"]
        );
    }

    #[test]
    fn test_abbreviations_do_not_end_sentences() {
        assert_eq!(
            split_sentences("См. рис. 3 и т.д. Новая мысль."),
            vec!["См.", "рис. 3 и т.д. Новая мысль."]
        );
        assert_eq!(
            split_sentences("Это т.е. пример. Дальше."),
            vec!["Это т.е. пример.", "Дальше."]
        );
    }

    #[test]
    fn test_abbreviation_needs_word_boundary() {
        assert_eq!(
            split_sentences("Сделай шаг. Потом второй."),
            vec!["Сделай шаг.", "Потом второй."]
        );
        assert_eq!(
            split_sentences("Это было в 2020 г. Тогда всё началось."),
            vec!["Это было в 2020 г. Тогда всё началось."]
        );
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Агент-критик проверяет 3 главы, Ёлки!"), 5);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Играет   ВАЖНУЮ\nроль "), "играет важную роль");
    }

    #[test]
    fn test_fix_whitespace() {
        assert_eq!(fix_whitespace("a  \t\nb\n\n\n\nc\n"), "a\nb\n\nc\n");
    }
}
