use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::core::day_record::{DayRecord, Section, TaskInstance};
use crate::core::template::TemplateSet;

/// A rejected mutation, carrying the user-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{date} is read-only. Only today's data can be edited.")]
    ReadOnly { date: NaiveDate },
}

/// Owns the date → record mapping and enforces the read-only-history rule:
/// only today's record may be created or mutated. Mutators take the
/// clock-resolved `today` so the gate always reflects the caller's clock.
///
/// Mutators return `Ok(true)` when something changed, `Ok(false)` for the
/// silent no-ops (missing record, out-of-range index, empty label), and
/// `Err(ReadOnly)` when the date is not today.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayStore {
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl DayStore {
    pub fn new(days: BTreeMap<NaiveDate, DayRecord>) -> Self {
        Self { days }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    /// Recorded dates in chronological order (keys for the calendar heat map).
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn as_map(&self) -> &BTreeMap<NaiveDate, DayRecord> {
        &self.days
    }

    pub fn is_editable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date == today
    }

    /// Materialize today's record from the current templates if absent.
    /// Never creates a record for any other date. Returns whether a record
    /// was created.
    pub fn ensure_today(&mut self, today: NaiveDate, templates: &TemplateSet) -> bool {
        if self.days.contains_key(&today) {
            return false;
        }
        debug!("materializing day record for {today}");
        self.days.insert(today, DayRecord::from_templates(templates));
        true
    }

    /// Flip the done flag at `index` of `section`.
    pub fn toggle(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
        section: Section,
        index: usize,
    ) -> Result<bool, EditError> {
        self.require_editable(date, today)?;
        let Some(record) = self.days.get_mut(&date) else {
            return Ok(false);
        };
        match record.section_mut(section).get_mut(index) {
            Some(task) => {
                task.done = !task.done;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Append an ad-hoc task to today's daily list.
    pub fn add_daily(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
        templates: &TemplateSet,
        label: &str,
    ) -> Result<bool, EditError> {
        self.require_editable(date, today)?;
        let label = label.trim();
        if label.is_empty() {
            return Ok(false);
        }
        self.ensure_today(today, templates);
        if let Some(record) = self.days.get_mut(&date) {
            record.daily.push(TaskInstance::adhoc(label));
        }
        Ok(true)
    }

    /// Remove a daily task. The confirmation step already happened at the
    /// caller boundary; this applies the removal unconditionally.
    pub fn remove_daily(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
        index: usize,
    ) -> Result<bool, EditError> {
        self.require_editable(date, today)?;
        let Some(record) = self.days.get_mut(&date) else {
            return Ok(false);
        };
        if index >= record.daily.len() {
            return Ok(false);
        }
        record.daily.remove(index);
        Ok(true)
    }

    /// Replace the journal text verbatim. User whitespace and newlines are
    /// preserved, so no trimming here.
    pub fn set_journal(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
        templates: &TemplateSet,
        text: &str,
    ) -> Result<(), EditError> {
        self.require_editable(date, today)?;
        self.ensure_today(today, templates);
        if let Some(record) = self.days.get_mut(&date) {
            record.journal = text.to_string();
        }
        Ok(())
    }

    /// Reconcile today's record against the current templates. History is
    /// never synced; past days keep the shape they had when they were
    /// current.
    pub fn sync_today(&mut self, today: NaiveDate, templates: &TemplateSet) {
        self.ensure_today(today, templates);
        if let Some(record) = self.days.get_mut(&today) {
            record.sync_with(templates);
        }
    }

    /// One-time repair pass for data recorded before id-tracking existed.
    /// Returns whether anything changed (the caller persists if so).
    pub fn assign_missing_ids(&mut self) -> bool {
        let mut changed = false;
        for record in self.days.values_mut() {
            changed |= record.assign_missing_ids();
        }
        changed
    }

    fn require_editable(&self, date: NaiveDate, today: NaiveDate) -> Result<(), EditError> {
        if self.is_editable(date, today) {
            Ok(())
        } else {
            Err(EditError::ReadOnly { date })
        }
    }
}
