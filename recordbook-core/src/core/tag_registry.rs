//! In-memory catalog of tag metadata.
//!
//! The registry is seeded with system tags that no call can modify or
//! remove. The `is_system` flag lives on each [`EnhancedTag`] and is checked
//! on every mutating path.
//!
//! The registry is process-local and holds no locks; construct one at
//! startup and pass it to whoever needs it.

use crate::{RecordbookError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Maximum number of entries returned by [`TagRegistry::suggestions`].
pub const MAX_TAG_SUGGESTIONS: usize = 8;

/// A grouping bucket for tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// The fixed set of categories.
pub const TAG_CATEGORIES: [TagCategory; 6] = [
    TagCategory {
        id: "therapy",
        name: "Терапия",
        color: "#ef4444",
        icon: "🎯",
        description: "Терапевтические направления",
    },
    TagCategory {
        id: "age-group",
        name: "Возрастные группы",
        color: "#3b82f6",
        icon: "👥",
        description: "Возрастная категория клиентов",
    },
    TagCategory {
        id: "skill-type",
        name: "Типы навыков",
        color: "#22c55e",
        icon: "🧠",
        description: "Развиваемые навыки",
    },
    TagCategory {
        id: "session-format",
        name: "Формат занятий",
        color: "#f59e0b",
        icon: "📋",
        description: "Формат проведения",
    },
    TagCategory {
        id: "priority",
        name: "Приоритет",
        color: "#8b5cf6",
        icon: "⭐",
        description: "Уровень приоритета",
    },
    TagCategory {
        id: "location",
        name: "Место проведения",
        color: "#06b6d4",
        icon: "📍",
        description: "Локация занятия",
    },
];

/// A registry entry.
///
/// `parent` and `children` are free-form references to other tag IDs. They
/// are stored as given and never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTag {
    pub id: String,
    pub name: String,
    pub category: String,
    pub color: String,
    pub description: Option<String>,
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub is_system: bool,
    pub aliases: Vec<String>,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

impl EnhancedTag {
    fn matches_query(&self, lower_query: &str) -> bool {
        self.name.to_lowercase().contains(lower_query)
            || self.aliases.iter().any(|a| a.to_lowercase().contains(lower_query))
    }
}

/// Caller-supplied fields for a new tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTag {
    pub name: String,
    pub category: String,
    pub color: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

/// Partial update for a user tag. `None` leaves the field unchanged.
///
/// `description` and `parent` are doubly optional: `Some(None)` (JSON
/// `null`) clears the field, an absent key leaves it alone. Identity,
/// creation time and the system flag are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    pub usage_count: Option<u64>,
    pub last_used: Option<DateTime<Utc>>,
    pub aliases: Option<Vec<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<String>>,
    pub children: Option<Vec<String>>,
}

/// Maps a key that is present (even as `null`) to `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

struct SystemTagSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    color: &'static str,
    aliases: &'static [&'static str],
    children: &'static [&'static str],
}

const SYSTEM_TAGS: &[SystemTagSeed] = &[
    SystemTagSeed {
        id: "speech-therapy",
        name: "Логопедия",
        category: "therapy",
        color: "#ef4444",
        aliases: &["речевая терапия", "логопедическое занятие"],
        children: &["articulation", "phonetics"],
    },
    SystemTagSeed {
        id: "psychology",
        name: "Психология",
        category: "therapy",
        color: "#ec4899",
        aliases: &["психологическая помощь"],
        children: &[],
    },
    SystemTagSeed {
        id: "preschool",
        name: "Дошкольники",
        category: "age-group",
        color: "#3b82f6",
        aliases: &["3-6 лет", "детский сад"],
        children: &[],
    },
    SystemTagSeed {
        id: "school-age",
        name: "Школьники",
        category: "age-group",
        color: "#1d4ed8",
        aliases: &["7-17 лет", "школа"],
        children: &[],
    },
    SystemTagSeed {
        id: "reading",
        name: "Чтение",
        category: "skill-type",
        color: "#22c55e",
        aliases: &["навыки чтения"],
        children: &[],
    },
    SystemTagSeed {
        id: "writing",
        name: "Письмо",
        category: "skill-type",
        color: "#16a34a",
        aliases: &["навыки письма", "каллиграфия"],
        children: &[],
    },
    SystemTagSeed {
        id: "individual",
        name: "Индивидуальное",
        category: "session-format",
        color: "#f59e0b",
        aliases: &["1 на 1", "персональное"],
        children: &[],
    },
    SystemTagSeed {
        id: "group",
        name: "Групповое",
        category: "session-format",
        color: "#d97706",
        aliases: &["группа", "коллективное"],
        children: &[],
    },
    SystemTagSeed {
        id: "high-priority",
        name: "Высокий приоритет",
        category: "priority",
        color: "#dc2626",
        aliases: &["срочно", "важно"],
        children: &[],
    },
    SystemTagSeed {
        id: "normal-priority",
        name: "Обычный приоритет",
        category: "priority",
        color: "#8b5cf6",
        aliases: &["стандартно"],
        children: &[],
    },
];

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Keyed store of [`EnhancedTag`]s.
pub struct TagRegistry {
    tags: BTreeMap<String, EnhancedTag>,
    /// IDs in seeding/creation order; name and alias lookups walk this.
    order: Vec<String>,
    clock: Clock,
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry").field("tags", &self.tags).finish_non_exhaustive()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    /// Creates a registry seeded with the system tags, timed by the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    /// Creates a seeded registry that reads "now" from `clock`.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        let now = clock();
        let tags = SYSTEM_TAGS
            .iter()
            .map(|seed| {
                let tag = EnhancedTag {
                    id: seed.id.to_string(),
                    name: seed.name.to_string(),
                    category: seed.category.to_string(),
                    color: seed.color.to_string(),
                    description: None,
                    usage_count: 0,
                    created_at: now,
                    last_used: now,
                    is_system: true,
                    aliases: seed.aliases.iter().map(|a| (*a).to_string()).collect(),
                    parent: None,
                    children: seed.children.iter().map(|c| (*c).to_string()).collect(),
                };
                (tag.id.clone(), tag)
            })
            .collect();
        let order = SYSTEM_TAGS.iter().map(|seed| seed.id.to_string()).collect();
        Self { tags, order, clock }
    }

    /// The fixed tag categories.
    #[must_use]
    pub fn categories(&self) -> &'static [TagCategory] {
        &TAG_CATEGORIES
    }

    /// Adds a user tag whose ID is the slug of its name.
    ///
    /// # Errors
    ///
    /// Returns [`RecordbookError::Validation`] if the name has no
    /// alphanumeric characters, or [`RecordbookError::Duplicate`] if the slug
    /// is already taken.
    pub fn create(&mut self, new_tag: NewTag) -> Result<EnhancedTag> {
        let id = slugify_tag_name(&new_tag.name);
        if id.is_empty() {
            return Err(RecordbookError::Validation(format!(
                "Tag name '{}' produces an empty id",
                new_tag.name
            )));
        }
        if self.tags.contains_key(&id) {
            return Err(RecordbookError::Duplicate(id));
        }

        let now = (self.clock)();
        let tag = EnhancedTag {
            id: id.clone(),
            name: new_tag.name,
            category: new_tag.category,
            color: new_tag.color,
            description: new_tag.description,
            usage_count: 0,
            created_at: now,
            last_used: now,
            is_system: false,
            aliases: new_tag.aliases,
            parent: new_tag.parent,
            children: new_tag.children,
        };
        log::debug!("created tag '{id}'");
        self.order.push(id.clone());
        self.tags.insert(id, tag.clone());
        Ok(tag)
    }

    /// Applies `update` to a user tag and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`RecordbookError::NotFound`] for an unknown ID and
    /// [`RecordbookError::ImmutableEntity`] for a system tag; the registry is
    /// left unchanged in both cases.
    pub fn update(&mut self, id: &str, update: TagUpdate) -> Result<EnhancedTag> {
        let tag = self.mutable_tag(id)?;
        if let Some(name) = update.name {
            tag.name = name;
        }
        if let Some(category) = update.category {
            tag.category = category;
        }
        if let Some(color) = update.color {
            tag.color = color;
        }
        if let Some(description) = update.description {
            tag.description = description;
        }
        if let Some(usage_count) = update.usage_count {
            tag.usage_count = usage_count;
        }
        if let Some(last_used) = update.last_used {
            tag.last_used = last_used;
        }
        if let Some(aliases) = update.aliases {
            tag.aliases = aliases;
        }
        if let Some(parent) = update.parent {
            tag.parent = parent;
        }
        if let Some(children) = update.children {
            tag.children = children;
        }
        log::debug!("updated tag '{id}'");
        Ok(tag.clone())
    }

    /// Removes a user tag and returns it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`update`](Self::update).
    pub fn delete(&mut self, id: &str) -> Result<EnhancedTag> {
        self.mutable_tag(id)?;
        let removed = self
            .tags
            .remove(id)
            .ok_or_else(|| RecordbookError::NotFound(id.to_string()))?;
        self.order.retain(|existing| existing != id);
        log::debug!("deleted tag '{id}'");
        Ok(removed)
    }

    /// Bumps the usage counter of the first tag, in seeding/creation order,
    /// whose name or alias equals `name_or_alias` exactly. System tags come
    /// first, so they win over a user tag reusing one of their aliases.
    /// Returns `false` when nothing matched.
    pub fn increment_usage(&mut self, name_or_alias: &str) -> bool {
        let now = (self.clock)();
        let matched = self.order.iter().find(|id| {
            self.tags.get(id.as_str()).is_some_and(|t| {
                t.name == name_or_alias || t.aliases.iter().any(|a| a == name_or_alias)
            })
        });
        match matched.cloned().and_then(|id| self.tags.get_mut(&id)) {
            Some(tag) => {
                tag.usage_count += 1;
                tag.last_used = now;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EnhancedTag> {
        self.tags.get(id)
    }

    /// All tags, ordered by ID.
    #[must_use]
    pub fn all(&self) -> Vec<&EnhancedTag> {
        self.tags.values().collect()
    }

    #[must_use]
    pub fn by_category(&self, category_id: &str) -> Vec<&EnhancedTag> {
        self.tags.values().filter(|t| t.category == category_id).collect()
    }

    /// Tags whose name or any alias contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&EnhancedTag> {
        let lower = query.to_lowercase();
        self.tags.values().filter(|t| t.matches_query(&lower)).collect()
    }

    /// Tags with the highest usage counts first.
    #[must_use]
    pub fn most_used(&self, limit: usize) -> Vec<&EnhancedTag> {
        let mut tags = self.all();
        tags.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        tags.truncate(limit);
        tags
    }

    /// Tags used most recently first.
    #[must_use]
    pub fn most_recent(&self, limit: usize) -> Vec<&EnhancedTag> {
        let mut tags = self.all();
        tags.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        tags.truncate(limit);
        tags
    }

    /// Autocomplete entries: names of matching tags followed by their
    /// matching aliases, without repeats, capped at [`MAX_TAG_SUGGESTIONS`].
    #[must_use]
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        let lower = query.to_lowercase();
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: &str| {
            if !out.iter().any(|existing| existing == s) {
                out.push(s.to_string());
            }
        };
        for tag in self.search(query) {
            push(&tag.name);
            for alias in tag.aliases.iter().filter(|a| a.to_lowercase().contains(&lower)) {
                push(alias);
            }
        }
        out.truncate(MAX_TAG_SUGGESTIONS);
        out
    }

    fn mutable_tag(&mut self, id: &str) -> Result<&mut EnhancedTag> {
        let tag = self
            .tags
            .get_mut(id)
            .ok_or_else(|| RecordbookError::NotFound(id.to_string()))?;
        if tag.is_system {
            return Err(RecordbookError::ImmutableEntity(id.to_string()));
        }
        Ok(tag)
    }
}

/// Converts a tag name into its ID.
///
/// Lowercases, maps every non-alphanumeric character to `-`, collapses runs
/// of `-` and trims them from both ends. May return an empty string.
pub fn slugify_tag_name(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    slug.split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Registry whose clock advances one minute on every read.
    fn ticking_registry() -> TagRegistry {
        let ticks = Arc::new(AtomicI64::new(0));
        let base = Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap();
        TagRegistry::with_clock(Box::new(move || {
            base + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst))
        }))
    }

    fn new_tag(name: &str) -> NewTag {
        NewTag {
            name: name.to_string(),
            category: "location".to_string(),
            color: "#06b6d4".to_string(),
            ..NewTag::default()
        }
    }

    #[test]
    fn test_seeded_with_system_tags() {
        let reg = TagRegistry::new();
        assert_eq!(reg.all().len(), SYSTEM_TAGS.len());
        assert_eq!(SYSTEM_TAGS.len(), 10);
        assert!(reg.all().iter().all(|t| t.is_system));
        assert_eq!(reg.categories().len(), 6);
    }

    #[test]
    fn test_system_tags_cannot_be_updated_or_deleted() {
        let mut reg = TagRegistry::new();
        let before: Vec<EnhancedTag> = reg.all().into_iter().cloned().collect();
        for seed in SYSTEM_TAGS {
            let update = TagUpdate { name: Some("hacked".into()), ..TagUpdate::default() };
            assert!(matches!(
                reg.update(seed.id, update),
                Err(RecordbookError::ImmutableEntity(_))
            ));
            assert!(matches!(reg.delete(seed.id), Err(RecordbookError::ImmutableEntity(_))));
        }
        let after: Vec<EnhancedTag> = reg.all().into_iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_create_slugifies_name() {
        let mut reg = TagRegistry::new();
        let tag = reg.create(new_tag("  Кабинет №2 (онлайн)!! ")).unwrap();
        assert_eq!(tag.id, "кабинет-2-онлайн");
        assert!(!tag.is_system);
        assert_eq!(tag.usage_count, 0);
        assert_eq!(reg.get("кабинет-2-онлайн").unwrap().name, "  Кабинет №2 (онлайн)!! ");
    }

    #[test]
    fn test_create_rejects_duplicate_slug() {
        let mut reg = TagRegistry::new();
        reg.create(new_tag("Home Visit")).unwrap();
        assert!(matches!(
            reg.create(new_tag("home---visit")),
            Err(RecordbookError::Duplicate(id)) if id == "home-visit"
        ));
        // Colliding with a system tag id is also a duplicate.
        assert!(matches!(reg.create(new_tag("Reading")), Err(RecordbookError::Duplicate(_))));
    }

    #[test]
    fn test_create_rejects_empty_slug() {
        let mut reg = TagRegistry::new();
        assert!(matches!(reg.create(new_tag("!!!")), Err(RecordbookError::Validation(_))));
    }

    #[test]
    fn test_update_and_delete_user_tag() {
        let mut reg = TagRegistry::new();
        reg.create(new_tag("Office")).unwrap();
        let updated = reg
            .update("office", TagUpdate { color: Some("#000000".into()), ..TagUpdate::default() })
            .unwrap();
        assert_eq!(updated.color, "#000000");
        assert_eq!(updated.name, "Office");

        reg.delete("office").unwrap();
        assert!(reg.get("office").is_none());
        assert!(matches!(reg.delete("office"), Err(RecordbookError::NotFound(_))));
        assert!(matches!(
            reg.update("office", TagUpdate::default()),
            Err(RecordbookError::NotFound(_))
        ));
    }

    #[test]
    fn test_increment_usage_by_name_or_alias() {
        let mut reg = ticking_registry();
        assert!(reg.increment_usage("Логопедия"));
        assert!(reg.increment_usage("логопедическое занятие"));
        assert!(!reg.increment_usage("логопедия"));
        assert_eq!(reg.get("speech-therapy").unwrap().usage_count, 2);
    }

    #[test]
    fn test_increment_usage_prefers_seeding_order() {
        let mut reg = TagRegistry::new();
        // "a-team" sorts before the system tag "group" but was created later.
        reg.create(NewTag { aliases: vec!["группа".into()], ..new_tag("A team") }).unwrap();
        assert!(reg.increment_usage("группа"));
        assert_eq!(reg.get("group").unwrap().usage_count, 1);
        assert_eq!(reg.get("a-team").unwrap().usage_count, 0);

        reg.delete("a-team").unwrap();
        reg.create(new_tag("Tutor")).unwrap();
        assert!(reg.increment_usage("Tutor"));
        assert_eq!(reg.get("tutor").unwrap().usage_count, 1);
    }

    #[test]
    fn test_update_can_clear_description_and_parent() {
        let mut reg = TagRegistry::new();
        reg.create(NewTag {
            description: Some("Выездные занятия".into()),
            parent: Some("individual".into()),
            ..new_tag("Home Visit")
        })
        .unwrap();

        let untouched = reg.update("home-visit", TagUpdate::default()).unwrap();
        assert_eq!(untouched.description.as_deref(), Some("Выездные занятия"));

        let cleared: TagUpdate =
            serde_json::from_str(r#"{"description": null, "parent": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        let updated = reg.update("home-visit", cleared).unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.parent, None);

        let absent: TagUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.parent, None);
    }

    #[test]
    fn test_most_used_and_most_recent() {
        let mut reg = ticking_registry();
        reg.increment_usage("Чтение");
        reg.increment_usage("Чтение");
        reg.increment_usage("школа");

        let used: Vec<&str> = reg.most_used(2).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(used, vec!["reading", "school-age"]);

        let recent: Vec<&str> = reg.most_recent(2).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(recent, vec!["school-age", "reading"]);
    }

    #[test]
    fn test_search_matches_name_and_alias() {
        let reg = TagRegistry::new();
        let ids: Vec<&str> = reg.search("ГРУПП").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["group"]);
        let by_alias: Vec<&str> = reg.search("сад").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(by_alias, vec!["preschool"]);
    }

    #[test]
    fn test_by_category() {
        let reg = TagRegistry::new();
        assert_eq!(reg.by_category("priority").len(), 2);
        assert!(reg.by_category("location").is_empty());
    }

    #[test]
    fn test_suggestions_include_matching_aliases() {
        let reg = TagRegistry::new();
        assert_eq!(reg.suggestions("письм"), vec!["Письмо", "навыки письма"]);
    }

    #[test]
    fn test_hierarchy_is_inert() {
        let mut reg = TagRegistry::new();
        let mut a = new_tag("A");
        a.children = vec!["b".into()];
        let mut b = new_tag("B");
        b.children = vec!["a".into()];
        b.parent = Some("a".into());
        reg.create(a).unwrap();
        reg.create(b).unwrap();
        assert_eq!(reg.get("b").unwrap().parent.as_deref(), Some("a"));
    }

    #[test]
    fn test_slugify_tag_name() {
        assert_eq!(slugify_tag_name("My Tag"), "my-tag");
        assert_eq!(slugify_tag_name("--Речь & Звуки--"), "речь-звуки");
        assert_eq!(slugify_tag_name("---"), "");
    }
}
