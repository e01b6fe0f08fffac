//! Deterministic brief content, generated without any model in the loop

use crate::brief::BriefInput;
use crate::brief::budget::{PART_TITLES, page_budget};
use crate::brief::project::{
    AcceptanceCriteria, Applicability, Audience, Factuality, OutlinePart, PartBudget,
    Positioning, Production, ProjectConfig, Readability, RisksAssumptions, Scope,
    StructureCriteria, WorkflowNotes,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn outline(part: &str, chapters: &[&str]) -> OutlinePart {
    OutlinePart {
        part: part.to_string(),
        chapters: strings(chapters),
    }
}

/// Build the full project skeleton for `input`.
#[must_use]
pub fn deterministic(input: &BriefInput) -> ProjectConfig {
    let budget = page_budget(input.target_pages);
    let page_budget = PART_TITLES
        .iter()
        .zip(budget)
        .map(|(part, pages)| PartBudget {
            part: (*part).to_string(),
            pages,
        })
        .collect();

    ProjectConfig {
        topic: input.topic.clone(),
        positioning: Positioning {
            for_whom: input.audience.clone(),
            problem_jobs: strings(&[
                "Быстрое, воспроизводимое создание книги с контролем качества",
            ]),
            unique_angle: "Инженерный пайплайн с KPI и автоматическими проверками качества"
                .to_string(),
        },
        audience: Audience {
            primary: input.audience.clone(),
            secondary: String::new(),
            prerequisites: strings(&["Базовые знания Git", "Опыт чтения YAML/JSON"]),
        },
        scope: Scope {
            target_pages: input.target_pages,
            page_budget,
            in_scope: strings(&["Дизайн ролей агентов и их промптов"]),
            out_of_scope: strings(&["Обучение собственных LLM с нуля"]),
        },
        reader_questions: strings(&[
            "Как быстро получить рабочий пайплайн книги под ключ?",
            "Какие роли агентов обязательны и как они взаимодействуют?",
            "Как измерять качество и ловить деградации?",
        ]),
        objectives: strings(&[
            "Зафиксировать архитектуру и роли (≤10 страниц) к концу Части I",
            "Собрать MVP пайплайна с автопроверками к концу Части II",
            "Покрытие упражнений ≥20% страниц к завершению Части III",
            "Экспорт DOCX/PDF/EPUB без ошибок к финалу проекта",
        ]),
        structure_outline: vec![
            outline(
                "I. Концепт и бриф",
                &["Позиционирование", "Карта ролей", "Контракты I/O"],
            ),
            outline(
                "II. Архитектура агентов",
                &["Оркестрация", "Хранилище и версии", "Промпт-инжиниринг"],
            ),
            outline(
                "III. Качество и продакшн",
                &["KPI и метрики", "Проверки и тесты", "CI/CD публикации"],
            ),
            outline(
                "IV. Кейсы и чек-листы",
                &["Внедрение A", "Внедрение B", "Антипаттерны"],
            ),
        ],
        outputs: input.outputs.clone(),
        acceptance_criteria: AcceptanceCriteria {
            readability: Readability {
                max_sentence_avg: 17,
                passive_voice_max: 8,
                simple_words_min: 75,
            },
            structure: StructureCriteria {
                chapter_len_variance_max: 20,
                each_chapter_has: strings(&["hook", "objective", "example", "checkpoint"]),
            },
            factuality: Factuality {
                claim_evidence_coverage_min: 80,
                zero_critical_errors_sample: 30,
            },
            applicability: Applicability {
                exercises_share_min: 20,
                case_studies_min: 6,
            },
            production: Production {
                styles_validated: true,
                export_success: strings(&["DOCX", "PDF", "EPUB"]),
            },
        },
        risks_assumptions: RisksAssumptions {
            risks: strings(&["Зависимость от нестабильных LLM-API"]),
            mitigations: strings(&["Кэширование, версионирование промптов и шаблонов"]),
            assumptions: strings(&["Доступна инфраструктура CI/CD"]),
        },
        workflow_notes: WorkflowNotes {
            sources_policy: "Каждый факт имеет ссылку на проверяемый источник".to_string(),
            glossary_policy:
                "Термины вводятся при первом употреблении и сводятся в глоссарий".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_and_outputs_follow_input() {
        let config = deterministic(&BriefInput {
            topic: "Topic".to_string(),
            audience: "Editors".to_string(),
            target_pages: 160,
            outputs: vec!["EPUB".to_string()],
        });
        let pages: Vec<u32> = config.scope.page_budget.iter().map(|p| p.pages).collect();
        assert_eq!(pages, vec![29, 61, 51, 19]);
        assert_eq!(config.outputs, vec!["EPUB"]);
        assert_eq!(config.positioning.for_whom, "Editors");
        assert_eq!(config.audience.primary, "Editors");
        assert_eq!(config.structure_outline.len(), 4);
    }
}
