use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::style::config::Settings;
use crate::style::report::{Issue, IssueKind, Level, TermCoverage};
use crate::style::text::{normalize, split_paragraphs, split_sentences, word_count};

/// Glossary terms every manuscript is expected to use
pub const TERMINOLOGY_KEYS: [&str; 19] = [
    "агент",
    "оркестратор",
    "планировщик",
    "критик",
    "редактор",
    "рутер",
    "память",
    "контекстное_окно",
    "RAG",
    "инструмент",
    "политика",
    "JSON_схема",
    "пайплайн",
    "idempotency",
    "телеметрия",
    "артефакт",
    "чеклист",
    "дедупликация",
    "грейдинг",
];

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static regex")
}

static PASSIVE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"\bбыло\s+принято\s+решение\b|\bбыл[аио]?\s+\w+н[а-я]+\b|\bпроизведен[аоы]?\b")
});
static VAGUE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"\bзначительно\b|\bсущественно\b|\bбыстро\b|\bэффективно\b|\bна порядок\b")
});
// `%` is not a word character, so only the unit words need a trailing boundary.
static METRIC: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"\d+\s?(?:%|(?:мин|час|дн|шаг|правил|MB|GB|стр|сек)\b)")
});
static ROUTER: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"\brouter\b"));

/// Run every rule over `text`.
#[must_use]
pub fn check_text(text: &str, banned: &[String], settings: &Settings) -> (Vec<Issue>, TermCoverage) {
    let banned_norm: Vec<(&String, String)> = banned.iter().map(|p| (p, normalize(p))).collect();
    let (target_lo, target_hi) = settings.target_len;

    let mut issues = Vec::new();
    for (pi, para) in split_paragraphs(text).into_iter().enumerate() {
        let para_no = pi + 1;
        let sentences = split_sentences(para);
        if sentences.len() > settings.max_paragraph_sentences {
            issues.push(Issue::paragraph(
                Level::Warn,
                IssueKind::ParagraphLen,
                para_no,
                format!(
                    "{} sentences in paragraph (max {}).",
                    sentences.len(),
                    settings.max_paragraph_sentences
                ),
            ));
        }

        let para_norm = normalize(para);
        for (phrase, norm) in &banned_norm {
            if !norm.is_empty() && para_norm.contains(norm.as_str()) {
                issues.push(Issue::paragraph(
                    Level::Error,
                    IssueKind::Banned,
                    para_no,
                    format!("Banned phrase: '{phrase}'"),
                ));
            }
        }

        for (si, sentence) in sentences.iter().enumerate() {
            let at = |level, kind, msg| Issue::sentence(level, kind, para_no, si + 1, msg);
            let words = word_count(sentence);
            if words > settings.max_sentence_len {
                issues.push(at(
                    Level::Warn,
                    IssueKind::SentenceLen,
                    format!("{words} words (max {}).", settings.max_sentence_len),
                ));
            } else if words < target_lo || words > target_hi {
                issues.push(at(
                    Level::Info,
                    IssueKind::SentenceTarget,
                    format!("{words} words (target range {target_lo}-{target_hi})."),
                ));
            }
            if !settings.passive_allowed && PASSIVE.is_match(sentence) {
                issues.push(at(
                    Level::Warn,
                    IssueKind::Passive,
                    "Possible passive voice.".to_string(),
                ));
            }
            if settings.require_metrics && VAGUE.is_match(sentence) && !METRIC.is_match(sentence) {
                issues.push(at(
                    Level::Warn,
                    IssueKind::VagueNoMetric,
                    "Vague claim without a metric nearby.".to_string(),
                ));
            }
            if ROUTER.is_match(sentence) {
                issues.push(at(
                    Level::Info,
                    IssueKind::Terminology,
                    "Use the glossary term 'рутер'.".to_string(),
                ));
            }
        }
    }

    (issues, term_coverage(text))
}

/// Which glossary terms appear anywhere in `text`, case-insensitively.
#[must_use]
pub fn term_coverage(text: &str) -> TermCoverage {
    let lower = text.to_lowercase();
    TermCoverage(
        TERMINOLOGY_KEYS
            .iter()
            .map(|term| ((*term).to_string(), lower.contains(&term.to_lowercase())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    fn relaxed() -> Settings {
        Settings {
            target_len: (1, 100),
            ..Settings::default()
        }
    }

    #[test]
    fn test_banned_phrase_is_error() {
        let banned = vec!["играет  важную роль".to_string()];
        let (issues, _) = check_text("Агент Играет важную\nроль.", &banned, &relaxed());
        assert_eq!(kinds(&issues), vec![IssueKind::Banned]);
        assert_eq!(issues[0].level, Level::Error);
        assert_eq!(issues[0].para, 1);
        assert_eq!(issues[0].sent, None);
    }

    #[test]
    fn test_sentence_length() {
        let long = "слово ".repeat(23);
        let (issues, _) = check_text(long.trim(), &[], &Settings::default());
        assert_eq!(kinds(&issues), vec![IssueKind::SentenceLen]);
        assert_eq!(issues[0].msg, "23 words (max 22).");

        let (issues, _) = check_text("Коротко.", &[], &Settings::default());
        assert_eq!(kinds(&issues), vec![IssueKind::SentenceTarget]);
        assert_eq!(issues[0].level, Level::Info);
    }

    #[test]
    fn test_paragraph_length() {
        let para = "Раз. Два. Три. Четыре. Пять. Шесть.";
        let (issues, _) = check_text(para, &[], &relaxed());
        assert_eq!(kinds(&issues), vec![IssueKind::ParagraphLen]);
        assert_eq!(issues[0].msg, "6 sentences in paragraph (max 5).");
    }

    #[test]
    fn test_passive_voice() {
        let text = "Было принято решение переписать главу.";
        let (issues, _) = check_text(text, &[], &relaxed());
        assert_eq!(kinds(&issues), vec![IssueKind::Passive]);

        let allowed = Settings {
            passive_allowed: true,
            ..relaxed()
        };
        assert!(check_text(text, &[], &allowed).0.is_empty());
    }

    #[test]
    fn test_vague_claims_need_metrics() {
        let (issues, _) = check_text("Сборка стала значительно быстрее.", &[], &relaxed());
        assert_eq!(kinds(&issues), vec![IssueKind::VagueNoMetric]);

        for text in [
            "Сборка стала значительно быстрее, на 40% меньше ожидания.",
            "Сборка стала значительно быстрее, минус 5 мин на главу.",
        ] {
            assert!(check_text(text, &[], &relaxed()).0.is_empty(), "{text}");
        }

        let lenient = Settings {
            require_metrics: false,
            ..relaxed()
        };
        assert!(check_text("Работает эффективно.", &[], &lenient).0.is_empty());
    }

    #[test]
    fn test_router_terminology() {
        let (issues, _) = check_text("Router выбирает агента.", &[], &relaxed());
        assert_eq!(kinds(&issues), vec![IssueKind::Terminology]);
        assert_eq!(issues[0].sent, Some(1));
    }

    #[test]
    fn test_term_coverage() {
        let coverage = term_coverage("Агент вызывает инструмент через rag.");
        let found: Vec<&str> = coverage
            .0
            .iter()
            .filter(|(_, present)| *present)
            .map(|(term, _)| term.as_str())
            .collect();
        assert_eq!(found, vec!["агент", "RAG", "инструмент"]);
        assert_eq!(coverage.0.len(), TERMINOLOGY_KEYS.len());
    }
}
