//! Keyword rules that suggest tags from free text.
//!
//! [`TAG_RULES`] is a fixed, ordered table; [`classify`] scans it once per
//! call. Table order is the tie-breaker between rules of equal priority.

use serde::{Deserialize, Serialize};

/// Maximum number of suggestions [`classify`] returns.
pub const MAX_SUGGESTIONS: usize = 5;

/// Tag returned when no rule matches.
pub const FALLBACK_TAG: &str = "общее";

/// Neutral grey used for the fallback tag and for unknown tags.
pub const NEUTRAL_COLOR: &str = "#6b7280";

/// A single keyword heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    /// Lowercase substrings; any one of them triggers the rule.
    pub keywords: &'static [&'static str],
    pub tag: &'static str,
    pub color: &'static str,
    pub priority: u8,
}

impl TagRule {
    fn matches(&self, normalized_text: &str) -> bool {
        self.keywords.iter().any(|k| normalized_text.contains(k))
    }
}

/// The rule table, in evaluation order.
pub const TAG_RULES: &[TagRule] = &[
    // Speech
    TagRule {
        keywords: &["логопед", "речь", "произношение", "артикуляция", "дикция", "звуки"],
        tag: "логопедия",
        color: "#ef4444",
        priority: 10,
    },
    TagRule {
        keywords: &["заикание", "запинки", "темп речи", "ритм речи"],
        tag: "заикание",
        color: "#f97316",
        priority: 9,
    },
    // Reading and writing
    TagRule {
        keywords: &["чтение", "читать", "книга", "текст", "слоги", "буквы"],
        tag: "чтение",
        color: "#22c55e",
        priority: 8,
    },
    TagRule {
        keywords: &["письмо", "писать", "почерк", "каллиграфия", "прописи"],
        tag: "письмо",
        color: "#06b6d4",
        priority: 8,
    },
    TagRule {
        keywords: &["дислексия", "дисграфия", "трудности чтения", "трудности письма"],
        tag: "дислексия",
        color: "#8b5cf6",
        priority: 9,
    },
    // Development
    TagRule {
        keywords: &["развитие", "развивающий", "обучение", "урок", "занятие"],
        tag: "развитие",
        color: "#eab308",
        priority: 6,
    },
    TagRule {
        keywords: &["память", "внимание", "концентрация", "мышление", "логика"],
        tag: "когнитивное",
        color: "#ec4899",
        priority: 7,
    },
    TagRule {
        keywords: &["моторика", "координация", "движения", "пальчики", "руки"],
        tag: "моторика",
        color: "#84cc16",
        priority: 7,
    },
    // Social
    TagRule {
        keywords: &["общение", "социализация", "группа", "коллектив", "друзья"],
        tag: "социализация",
        color: "#3b82f6",
        priority: 6,
    },
    TagRule {
        keywords: &["поведение", "эмоции", "чувства", "настроение", "психология"],
        tag: "психология",
        color: "#6b7280",
        priority: 6,
    },
    // Age groups
    TagRule {
        keywords: &["дошкольник", "детский сад", "малыш", "ребенок", "дети"],
        tag: "дошкольники",
        color: "#f59e0b",
        priority: 5,
    },
    TagRule {
        keywords: &["школьник", "школа", "ученик", "класс", "учеба"],
        tag: "школьники",
        color: "#10b981",
        priority: 5,
    },
    TagRule {
        keywords: &["подросток", "тинейджер", "старшеклассник"],
        tag: "подростки",
        color: "#8b5cf6",
        priority: 5,
    },
    // Session types
    TagRule {
        keywords: &["консультация", "диагностика", "обследование", "тестирование"],
        tag: "консультация",
        color: "#6366f1",
        priority: 8,
    },
    TagRule {
        keywords: &["индивидуальный", "персональный", "один на один"],
        tag: "индивидуальное",
        color: "#14b8a6",
        priority: 7,
    },
    TagRule {
        keywords: &["групповой", "группа", "коллективный", "команда"],
        tag: "групповое",
        color: "#f59e0b",
        priority: 7,
    },
    TagRule {
        keywords: &["онлайн", "дистанционно", "удаленно", "видеосвязь", "zoom"],
        tag: "онлайн",
        color: "#8b5cf6",
        priority: 6,
    },
    // Special needs
    TagRule {
        keywords: &["аутизм", "рас", "спектр", "особенности развития"],
        tag: "аутизм",
        color: "#ef4444",
        priority: 9,
    },
    TagRule {
        keywords: &["дцп", "церебральный паралич", "нарушения движений"],
        tag: "дцп",
        color: "#f97316",
        priority: 9,
    },
    TagRule {
        keywords: &["слух", "слуховой", "глухота", "тугоухость"],
        tag: "нарушения слуха",
        color: "#06b6d4",
        priority: 9,
    },
    // Visit kind
    TagRule {
        keywords: &["первичный", "первое", "знакомство", "новый"],
        tag: "первичный прием",
        color: "#22c55e",
        priority: 8,
    },
    TagRule {
        keywords: &["повторный", "продолжение", "следующий"],
        tag: "повторный прием",
        color: "#eab308",
        priority: 7,
    },
    TagRule {
        keywords: &["срочно", "экстренно", "неотложно"],
        tag: "срочно",
        color: "#ef4444",
        priority: 10,
    },
];

/// A suggested tag and the color the UI should render it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub tag: String,
    pub color: String,
}

impl From<&TagRule> for TagSuggestion {
    fn from(rule: &TagRule) -> Self {
        Self {
            tag: rule.tag.to_string(),
            color: rule.color.to_string(),
        }
    }
}

/// Ordered, bounded result of [`classify`].
///
/// Never empty. Can be iterated as many times as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSuggestions(Vec<TagSuggestion>);

impl TagSuggestions {
    pub fn iter(&self) -> std::slice::Iter<'_, TagSuggestion> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the highest-priority suggestion.
    #[must_use]
    pub fn first(&self) -> Option<&TagSuggestion> {
        self.0.first()
    }

    /// Tag labels only, in order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.0.iter().map(|s| s.tag.clone()).collect()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<TagSuggestion> {
        self.0
    }
}

impl<'a> IntoIterator for &'a TagSuggestions {
    type Item = &'a TagSuggestion;
    type IntoIter = std::slice::Iter<'a, TagSuggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for TagSuggestions {
    type Item = TagSuggestion;
    type IntoIter = std::vec::IntoIter<TagSuggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Suggests up to [`MAX_SUGGESTIONS`] tags for `text`.
///
/// Matching rules are ordered by descending priority (table order breaks
/// ties), deduplicated by tag label, and truncated. When nothing matches the
/// single [`FALLBACK_TAG`] is returned.
#[must_use]
pub fn classify(text: &str) -> TagSuggestions {
    let normalized = text.trim().to_lowercase();

    let mut candidates: Vec<&TagRule> = if normalized.is_empty() {
        Vec::new()
    } else {
        TAG_RULES.iter().filter(|rule| rule.matches(&normalized)).collect()
    };
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut out: Vec<TagSuggestion> = Vec::with_capacity(MAX_SUGGESTIONS);
    for rule in candidates {
        if out.len() == MAX_SUGGESTIONS {
            break;
        }
        if !out.iter().any(|s| s.tag == rule.tag) {
            out.push(rule.into());
        }
    }

    if out.is_empty() {
        out.push(TagSuggestion {
            tag: FALLBACK_TAG.to_string(),
            color: NEUTRAL_COLOR.to_string(),
        });
    }
    TagSuggestions(out)
}

/// Tag labels suggested for a contact or lesson name.
#[must_use]
pub fn suggest_tags_from_name(name: &str) -> Vec<String> {
    classify(name).tags()
}

/// Color of the first rule producing `tag`, or [`NEUTRAL_COLOR`].
#[must_use]
pub fn tag_color(tag: &str) -> &'static str {
    TAG_RULES
        .iter()
        .find(|rule| rule.tag == tag)
        .map_or(NEUTRAL_COLOR, |rule| rule.color)
}

/// Classifies the combined title, name and description of a record.
#[must_use]
pub fn classify_record(
    title: Option<&str>,
    name: Option<&str>,
    description: Option<&str>,
) -> TagSuggestions {
    let text = [title, name, description]
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join(" ");
    classify(&text)
}
