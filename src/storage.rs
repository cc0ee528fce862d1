use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::warn;
use serde_json::Value;

use crate::config::DaylogConfig;
use crate::core::day_record::{DayRecord, TaskInstance};
use crate::core::template::{Category, TaskTemplate, TemplateSet, fallback_id};

/// Reads and writes the two durable structures: the template set and the
/// date → day-record mapping, both as compact JSON files.
///
/// Loads never fail: absent files, unreadable files, and malformed data all
/// fall back to safe defaults (seed templates, empty mapping) with a warning.
/// Saves return the underlying `io::Error` so the caller can report it as a
/// non-fatal warning; in-memory state stays authoritative either way.
pub struct Storage {
    templates_path: PathBuf,
    days_path: PathBuf,
}

impl Storage {
    pub fn new(config: &DaylogConfig) -> Self {
        Self {
            templates_path: config.templates_path(),
            days_path: config.days_path(),
        }
    }

    pub fn load_templates(&self) -> TemplateSet {
        match read_json(&self.templates_path) {
            Some(value) => templates_from_value(value).unwrap_or_else(|| {
                warn!(
                    "templates file {:?} has an unexpected shape, using defaults",
                    self.templates_path
                );
                TemplateSet::default()
            }),
            None => TemplateSet::default(),
        }
    }

    pub fn save_templates(&self, templates: &TemplateSet) -> io::Result<()> {
        write_json(&self.templates_path, serde_json::to_string(templates)?)
    }

    pub fn load_days(&self) -> BTreeMap<NaiveDate, DayRecord> {
        match read_json(&self.days_path) {
            Some(value) => days_from_value(value),
            None => BTreeMap::new(),
        }
    }

    pub fn save_days(&self, days: &BTreeMap<NaiveDate, DayRecord>) -> io::Result<()> {
        write_json(&self.days_path, serde_json::to_string(days)?)
    }
}

fn read_json(path: &Path) -> Option<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("failed to read {path:?}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("corrupt JSON in {path:?}: {e}");
            None
        }
    }
}

fn write_json(path: &Path, json: String) -> io::Result<()> {
    std::fs::write(path, json)
}

/// Validate and normalize the persisted template shape. `None` when the top
/// level is not an object with both category arrays; within an array,
/// entries that are not objects with a non-empty string `t` are dropped, and
/// a missing id gets the deterministic fallback for its position.
fn templates_from_value(value: Value) -> Option<TemplateSet> {
    let object = value.as_object()?;
    let mut set = TemplateSet {
        important: Vec::new(),
        moderate: Vec::new(),
    };
    for category in Category::ALL {
        let entries = object.get(category.key())?.as_array()?;
        *set.category_mut(category) = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| template_from_value(category, i, entry))
            .collect();
    }
    Some(set)
}

fn template_from_value(category: Category, index: usize, entry: &Value) -> Option<TaskTemplate> {
    let label = entry.get("t")?.as_str()?.trim();
    if label.is_empty() {
        return None;
    }
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_id(category, label, index));
    Some(TaskTemplate {
        id,
        label: label.to_string(),
    })
}

/// Per-entry tolerant read of the day mapping. Keys that are not calendar
/// dates and values that are not objects are dropped with a warning rather
/// than poisoning the whole load.
fn days_from_value(value: Value) -> BTreeMap<NaiveDate, DayRecord> {
    let Some(object) = value.as_object() else {
        warn!("day records are not a JSON object, starting empty");
        return BTreeMap::new();
    };
    let mut days = BTreeMap::new();
    for (key, entry) in object {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
            warn!("skipping day record with invalid date key {key:?}");
            continue;
        };
        match day_from_value(entry) {
            Some(record) => {
                days.insert(date, record);
            }
            None => warn!("skipping malformed day record for {key}"),
        }
    }
    days
}

fn day_from_value(entry: &Value) -> Option<DayRecord> {
    let object = entry.as_object()?;
    let tasks = |key: &str| -> Vec<TaskInstance> {
        object
            .get(key)
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(task_from_value).collect())
            .unwrap_or_default()
    };
    Some(DayRecord {
        important: tasks("important"),
        moderate: tasks("moderate"),
        daily: tasks("daily"),
        journal: object
            .get("journal")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn task_from_value(entry: &Value) -> Option<TaskInstance> {
    Some(TaskInstance {
        id: entry.get("id").and_then(Value::as_str).map(str::to_string),
        label: entry.get("t")?.as_str()?.to_string(),
        done: entry.get("d").and_then(Value::as_bool).unwrap_or(false),
    })
}
