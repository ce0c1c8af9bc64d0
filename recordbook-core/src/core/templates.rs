//! Built-in lesson templates offered when creating a record.

use crate::RecordInput;
use serde::Serialize;

/// A preset title, tag set and description for a common lesson kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub description: &'static str,
}

pub const LESSON_TEMPLATES: [LessonTemplate; 4] = [
    LessonTemplate {
        id: "speech-therapy",
        name: "Логопедическое занятие",
        tags: &["логопедия", "речь"],
        description: "Индивидуальное логопедическое занятие",
    },
    LessonTemplate {
        id: "reading-lesson",
        name: "Урок чтения",
        tags: &["чтение", "обучение"],
        description: "Занятие по развитию навыков чтения",
    },
    LessonTemplate {
        id: "consultation",
        name: "Консультация",
        tags: &["консультация", "диагностика"],
        description: "Консультация с родителями",
    },
    LessonTemplate {
        id: "group-lesson",
        name: "Групповое занятие",
        tags: &["группа", "социализация"],
        description: "Групповое развивающее занятие",
    },
];

impl LessonTemplate {
    /// Looks a template up by its `id`.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static LessonTemplate> {
        LESSON_TEMPLATES.iter().find(|t| t.id == id)
    }

    /// Starts a form pre-filled with this template; the caller adds the date.
    #[must_use]
    pub fn to_input(&self) -> RecordInput {
        RecordInput {
            title: Some(self.name.to_string()),
            description: Some(self.description.to_string()),
            tags: Some(self.tags.iter().map(|t| (*t).to_string()).collect()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;

    #[test]
    fn test_find_template() {
        let template = LessonTemplate::find("reading-lesson").unwrap();
        assert_eq!(template.name, "Урок чтения");
        assert!(LessonTemplate::find("yoga").is_none());
    }

    #[test]
    fn test_template_input_normalizes() {
        let mut input = LessonTemplate::find("consultation").unwrap().to_input();
        input.date = Some("2025-05-01T10:00:00Z".to_string());

        let record = normalize(&input).unwrap();
        assert_eq!(record.title.as_deref(), Some("Консультация"));
        assert_eq!(record.tags, vec!["консультация", "диагностика"]);
        assert_eq!(record.description.as_deref(), Some("Консультация с родителями"));
    }

    #[test]
    fn test_template_ids_are_unique() {
        for (i, a) in LESSON_TEMPLATES.iter().enumerate() {
            assert!(LESSON_TEMPLATES[i + 1..].iter().all(|b| b.id != a.id));
        }
    }
}
