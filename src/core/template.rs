use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// The two permanent checklist categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Important,
    Moderate,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Important, Category::Moderate];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Important => "important",
            Self::Moderate => "moderate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A permanently recurring task definition. The id is assigned once and
/// survives label edits, so per-day completion flags can be matched back
/// to it across syncs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    #[serde(rename = "t")]
    pub label: String,
}

/// The two ordered template lists. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub important: Vec<TaskTemplate>,
    pub moderate: Vec<TaskTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let seed = |category: Category, labels: &[&str]| {
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| TaskTemplate {
                    id: fallback_id(category, label, i),
                    label: (*label).to_string(),
                })
                .collect()
        };
        Self {
            important: seed(Category::Important, &["Exercise", "Study"]),
            moderate: seed(Category::Moderate, &["Reading", "Revision"]),
        }
    }
}

impl TemplateSet {
    pub fn category(&self, category: Category) -> &[TaskTemplate] {
        match category {
            Category::Important => &self.important,
            Category::Moderate => &self.moderate,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut Vec<TaskTemplate> {
        match category {
            Category::Important => &mut self.important,
            Category::Moderate => &mut self.moderate,
        }
    }

    /// Append a new template. Returns the assigned id, or `None` when the
    /// label is empty after trimming.
    pub fn add(&mut self, category: Category, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let id = new_id(category);
        self.category_mut(category).push(TaskTemplate {
            id: id.clone(),
            label: label.to_string(),
        });
        Some(id)
    }

    /// Rename a template in place. Id and position are untouched. Returns
    /// false when the id is unknown or the new label is empty after trimming.
    pub fn edit(&mut self, id: &str, new_label: &str) -> bool {
        let new_label = new_label.trim();
        if new_label.is_empty() {
            return false;
        }
        for category in Category::ALL {
            if let Some(template) = self
                .category_mut(category)
                .iter_mut()
                .find(|t| t.id == id)
            {
                template.label = new_label.to_string();
                return true;
            }
        }
        false
    }

    /// Remove a template by id, leaving the order of the rest untouched.
    /// The yes/no confirmation happens at the caller boundary; this is the
    /// single irreversible call.
    pub fn remove(&mut self, id: &str) -> bool {
        for category in Category::ALL {
            let list = self.category_mut(category);
            let before = list.len();
            list.retain(|t| t.id != id);
            if list.len() != before {
                return true;
            }
        }
        false
    }

    pub fn find(&self, id: &str) -> Option<&TaskTemplate> {
        Category::ALL
            .iter()
            .flat_map(|c| self.category(*c))
            .find(|t| t.id == id)
    }
}

/// Normalize a label into an id-safe slug: lowercase, non-alphanumeric runs
/// collapsed to `-`, capped at 40 chars, `"task"` when nothing survives.
pub fn slug(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let replaced = NON_SLUG_RE.replace_all(&lowered, "-");
    let trimmed: String = replaced.trim_matches('-').chars().take(40).collect();
    if trimmed.is_empty() {
        "task".to_string()
    } else {
        trimmed
    }
}

/// Deterministic id for entries persisted before id-tracking existed.
/// Same category, label and position always yield the same id, so repair
/// passes never churn ids across loads.
pub fn fallback_id(category: Category, label: &str, index: usize) -> String {
    format!("{}-{}-{}", category.key(), slug(label), index)
}

fn new_id(category: Category) -> String {
    format!("{}-{}", category.key(), Uuid::new_v4())
}
