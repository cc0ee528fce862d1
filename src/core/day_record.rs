use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::template::{Category, TemplateSet, fallback_id};

/// The three per-day task lists. `Important` and `Moderate` are projected
/// from templates; `Daily` holds ad-hoc entries for that date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Important,
    Moderate,
    Daily,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Important, Section::Moderate, Section::Daily];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Important => "important",
            Self::Moderate => "moderate",
            Self::Daily => "daily",
        }
    }
}

impl From<Category> for Section {
    fn from(category: Category) -> Self {
        match category {
            Category::Important => Self::Important,
            Category::Moderate => Self::Moderate,
        }
    }
}

/// One task line for one specific day. Templated instances carry the owning
/// template's id; ad-hoc daily tasks carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "t")]
    pub label: String,
    #[serde(rename = "d", default)]
    pub done: bool,
}

impl TaskInstance {
    pub fn adhoc(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            done: false,
        }
    }
}

/// Everything recorded for one calendar date. The date itself is the key in
/// the owning store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub important: Vec<TaskInstance>,
    pub moderate: Vec<TaskInstance>,
    #[serde(default)]
    pub daily: Vec<TaskInstance>,
    #[serde(default)]
    pub journal: String,
}

impl DayRecord {
    /// Fresh record projected from the current templates: every templated
    /// task undone, no daily tasks, empty journal.
    pub fn from_templates(templates: &TemplateSet) -> Self {
        let project = |category: Category| {
            templates
                .category(category)
                .iter()
                .map(|t| TaskInstance {
                    id: Some(t.id.clone()),
                    label: t.label.clone(),
                    done: false,
                })
                .collect()
        };
        Self {
            important: project(Category::Important),
            moderate: project(Category::Moderate),
            daily: Vec::new(),
            journal: String::new(),
        }
    }

    pub fn section(&self, section: Section) -> &[TaskInstance] {
        match section {
            Section::Important => &self.important,
            Section::Moderate => &self.moderate,
            Section::Daily => &self.daily,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<TaskInstance> {
        match section {
            Section::Important => &mut self.important,
            Section::Moderate => &mut self.moderate,
            Section::Daily => &mut self.daily,
        }
    }

    /// All tasks across the three sections, in display order.
    pub fn all_tasks(&self) -> impl Iterator<Item = &TaskInstance> {
        self.important
            .iter()
            .chain(self.moderate.iter())
            .chain(self.daily.iter())
    }

    /// Reconcile the templated sections against the current templates.
    ///
    /// Each category independently: one instance per current template, in
    /// template order, with `done` carried over by id when the template was
    /// already present. New template ids start undone; removed ids drop out.
    /// Idempotent under unchanged templates. Daily tasks and journal are
    /// untouched.
    pub fn sync_with(&mut self, templates: &TemplateSet) {
        for category in Category::ALL {
            let existing: HashMap<String, bool> = self
                .section(category.into())
                .iter()
                .filter_map(|i| i.id.as_ref().map(|id| (id.clone(), i.done)))
                .collect();
            *self.section_mut(category.into()) = templates
                .category(category)
                .iter()
                .map(|t| TaskInstance {
                    id: Some(t.id.clone()),
                    label: t.label.clone(),
                    done: existing.get(&t.id).copied().unwrap_or(false),
                })
                .collect();
        }
    }

    /// Assign deterministic ids to templated instances recorded before
    /// id-tracking existed. Returns whether anything changed.
    pub fn assign_missing_ids(&mut self) -> bool {
        let mut changed = false;
        for category in Category::ALL {
            let section = self.section_mut(category.into());
            for (index, instance) in section.iter_mut().enumerate() {
                if instance.id.is_none() {
                    instance.id = Some(fallback_id(category, &instance.label, index));
                    changed = true;
                }
            }
        }
        changed
    }
}
