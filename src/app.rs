use std::io;

use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, warn};

use crate::config::DaylogConfig;
use crate::core::clock::{DayWatch, Rollover, today_local};
use crate::core::day_record::{DayRecord, Section};
use crate::core::stats::{SectionStats, completion, section_stats};
use crate::core::template::{Category, TemplateSet};
use crate::storage::Storage;
use crate::store::{DayStore, EditError};

/// Days shown in the rolling date strip, ending today.
const STRIP_DAYS: i64 = 31;

/// Cells in the month grid: six full weeks starting on a Sunday.
const CALENDAR_CELLS: i64 = 42;

/// A state-changed notification for rendering collaborators. Emitted after
/// the mutation has been applied and persisted, never in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TemplatesChanged,
    DayChanged(NaiveDate),
    SelectionChanged(NaiveDate),
    Rollover { previous: NaiveDate, current: NaiveDate },
}

/// How the selected date relates to today, for the checklist heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Headline {
    Today,
    TimeGone,
    TimeLeft,
}

impl Headline {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::TimeGone => "Time gone",
            Self::TimeLeft => "Time left",
        }
    }
}

/// One bar of the rolling date strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleDay {
    pub date: NaiveDate,
    pub completion: u8,
    pub selected: bool,
}

/// One cell of the month calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub selected: bool,
    pub today: bool,
    pub has_data: bool,
    pub completion: u8,
}

/// The application state: templates, day records, the cached "today", the
/// selected date, and the visible calendar month, with all mutation funneled
/// through its operations. Rendering collaborators read the view methods and
/// subscribe for change events; they never mutate state directly.
pub struct Daylog {
    storage: Storage,
    templates: TemplateSet,
    days: DayStore,
    watch: DayWatch,
    selected: NaiveDate,
    visible_month: NaiveDate,
    subscribers: Vec<Box<dyn FnMut(&Event)>>,
}

impl Daylog {
    pub fn open(config: &DaylogConfig) -> io::Result<Self> {
        Self::open_at(config, today_local())
    }

    fn open_at(config: &DaylogConfig, today: NaiveDate) -> io::Result<Self> {
        config.ensure_files()?;
        let storage = Storage::new(config);
        let templates = storage.load_templates();
        let mut days = DayStore::new(storage.load_days());

        // Repair pass for pre-id data, before any sync can run.
        let mut dirty = days.assign_missing_ids();
        if dirty {
            debug!("assigned missing instance ids to stored day records");
        }
        dirty |= days.ensure_today(today, &templates);
        if dirty {
            if let Err(e) = storage.save_days(days.as_map()) {
                warn!("failed to persist day records: {e}");
            }
        }

        Ok(Self {
            storage,
            templates,
            days,
            watch: DayWatch::new(today),
            selected: today,
            visible_month: first_of_month(today),
            subscribers: Vec::new(),
        })
    }

    pub fn subscribe<F: FnMut(&Event) + 'static>(&mut self, subscriber: F) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, event: Event) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.watch.today()
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn visible_month(&self) -> NaiveDate {
        self.visible_month
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn is_editable(&self, date: NaiveDate) -> bool {
        self.days.is_editable(date, self.today())
    }

    pub fn record(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(date)
    }

    /// Select a date for viewing. Selecting today materializes its record
    /// (the lazy first touch); any other date is shown as-is, recorded or
    /// not. The visible month follows the selection.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected = date;
        self.visible_month = first_of_month(date);
        if date == self.today() && self.days.ensure_today(date, &self.templates) {
            self.persist_days();
        }
        self.emit(Event::SelectionChanged(date));
    }

    /// Rollover check, run on a timer by the embedding layer. On a day
    /// change all dependent state is updated before the event goes out, so
    /// subscribers never observe the new day with stale selection or
    /// editability.
    pub fn tick(&mut self) -> Option<Rollover> {
        self.tick_at(today_local())
    }

    fn tick_at(&mut self, now: NaiveDate) -> Option<Rollover> {
        let rollover = self.watch.check(now)?;
        if self.selected == rollover.previous {
            self.selected = rollover.current;
        }
        self.visible_month = first_of_month(self.selected);
        self.emit(Event::Rollover {
            previous: rollover.previous,
            current: rollover.current,
        });
        Some(rollover)
    }

    /// Flip a task's done flag on the selected date.
    pub fn toggle(&mut self, section: Section, index: usize) -> Result<bool, EditError> {
        let today = self.today();
        if self.selected == today {
            self.days.ensure_today(today, &self.templates);
        }
        let changed = self.days.toggle(self.selected, today, section, index)?;
        if changed {
            self.persist_days();
            self.emit(Event::DayChanged(self.selected));
        }
        Ok(changed)
    }

    /// Append an ad-hoc task to the selected date's daily list.
    pub fn add_daily(&mut self, label: &str) -> Result<bool, EditError> {
        let today = self.today();
        let changed = self.days.add_daily(self.selected, today, &self.templates, label)?;
        if changed {
            self.persist_days();
            self.emit(Event::DayChanged(self.selected));
        }
        Ok(changed)
    }

    /// Remove a daily task. The yes/no confirmation already happened at the
    /// caller boundary.
    pub fn remove_daily(&mut self, index: usize) -> Result<bool, EditError> {
        let today = self.today();
        let changed = self.days.remove_daily(self.selected, today, index)?;
        if changed {
            self.persist_days();
            self.emit(Event::DayChanged(self.selected));
        }
        Ok(changed)
    }

    /// Replace the selected date's journal text verbatim.
    pub fn set_journal(&mut self, text: &str) -> Result<(), EditError> {
        let today = self.today();
        self.days.set_journal(self.selected, today, &self.templates, text)?;
        self.persist_days();
        self.emit(Event::DayChanged(self.selected));
        Ok(())
    }

    /// Add a permanent template. Today's record picks it up immediately;
    /// history is untouched.
    pub fn add_template(&mut self, category: Category, label: &str) -> Option<String> {
        let id = self.templates.add(category, label)?;
        self.after_template_change();
        Some(id)
    }

    /// Rename a template. Only today's instance follows the new label.
    pub fn edit_template(&mut self, id: &str, new_label: &str) -> bool {
        if !self.templates.edit(id, new_label) {
            return false;
        }
        self.after_template_change();
        true
    }

    /// Remove a template (confirmation happened at the caller boundary).
    /// Today's instance disappears on the sync; past days keep theirs.
    pub fn remove_template(&mut self, id: &str) -> bool {
        if !self.templates.remove(id) {
            return false;
        }
        self.after_template_change();
        true
    }

    fn after_template_change(&mut self) {
        if let Err(e) = self.storage.save_templates(&self.templates) {
            warn!("failed to persist templates: {e}");
        }
        let today = self.today();
        self.days.sync_today(today, &self.templates);
        self.persist_days();
        self.emit(Event::TemplatesChanged);
        self.emit(Event::DayChanged(today));
    }

    fn persist_days(&mut self) {
        if let Err(e) = self.storage.save_days(self.days.as_map()) {
            warn!("failed to persist day records: {e}");
        }
    }

    // --- derived views ---

    pub fn headline(&self) -> Headline {
        if self.selected == self.today() {
            Headline::Today
        } else if self.selected < self.today() {
            Headline::TimeGone
        } else {
            Headline::TimeLeft
        }
    }

    /// Whole-day completion for any date; unrecorded dates count as 0.
    pub fn completion_for(&self, date: NaiveDate) -> u8 {
        self.days.get(date).map(completion).unwrap_or(0)
    }

    /// Donut stats for one section of the selected date.
    pub fn donut(&self, section: Section) -> SectionStats {
        match self.days.get(self.selected) {
            Some(record) => section_stats(record, section),
            None => SectionStats { done: 0, total: 0 },
        }
    }

    /// The rolling 31-day strip ending today, including days with no data.
    pub fn candle_strip(&self) -> Vec<CandleDay> {
        let today = self.today();
        (0..STRIP_DAYS)
            .map(|i| {
                let date = today - Duration::days(STRIP_DAYS - 1 - i);
                CandleDay {
                    date,
                    completion: self.completion_for(date),
                    selected: date == self.selected,
                }
            })
            .collect()
    }

    /// Six-week month grid starting the Sunday on or before the 1st of the
    /// visible month.
    pub fn calendar_cells(&self) -> Vec<CalendarCell> {
        let first = self.visible_month;
        let start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
        (0..CALENDAR_CELLS)
            .map(|i| {
                let date = start + Duration::days(i);
                CalendarCell {
                    date,
                    in_month: date.month() == first.month() && date.year() == first.year(),
                    selected: date == self.selected,
                    today: date == self.today(),
                    has_data: self.days.contains(date),
                    completion: self.completion_for(date),
                }
            })
            .collect()
    }

    pub fn calendar_title(&self) -> String {
        self.visible_month.format("%B %Y").to_string()
    }

    pub fn prev_month(&mut self) {
        self.visible_month = shift_month(self.visible_month, -1);
    }

    pub fn next_month(&mut self) {
        self.visible_month = shift_month(self.visible_month, 1);
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Move a first-of-month date by whole months.
fn shift_month(first: NaiveDate, delta: i32) -> NaiveDate {
    let total = first.year() * 12 + first.month0() as i32 + delta;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::{TempDir, tempdir};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_in(dir: &TempDir, today: NaiveDate) -> Daylog {
        let config = DaylogConfig {
            data_directory: dir.path().to_path_buf(),
        };
        Daylog::open_at(&config, today).unwrap()
    }

    const D1: (i32, u32, u32) = (2026, 8, 24);
    const D2: (i32, u32, u32) = (2026, 8, 25);

    #[test]
    fn fresh_install_has_seed_templates_and_todays_record() {
        let dir = tempdir().unwrap();
        let app = open_in(&dir, date(2026, 8, 25));

        assert_eq!(app.templates(), &TemplateSet::default());
        let record = app.record(date(2026, 8, 25)).unwrap();
        assert_eq!(record.important.len(), 2);
        assert_eq!(record.moderate.len(), 2);
        assert!(record.all_tasks().all(|t| !t.done));
        assert!(record.daily.is_empty());
        assert_eq!(record.journal, "");
        assert_eq!(app.headline(), Headline::Today);
    }

    #[test]
    fn mutations_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let today = date(2026, 8, 25);
        {
            let mut app = open_in(&dir, today);
            app.toggle(Section::Important, 0).unwrap();
            app.add_daily("Call dentist").unwrap();
            app.set_journal("a fine day\n").unwrap();
        }

        let app = open_in(&dir, today);
        let record = app.record(today).unwrap();
        assert!(record.important[0].done);
        assert_eq!(record.daily[0].label, "Call dentist");
        assert_eq!(record.journal, "a fine day\n");
    }

    #[test]
    fn past_days_are_rejected_with_a_message() {
        let dir = tempdir().unwrap();
        let d1 = date(D1.0, D1.1, D1.2);
        let d2 = date(D2.0, D2.1, D2.2);
        {
            let mut app = open_in(&dir, d1);
            app.toggle(Section::Important, 0).unwrap();
        }

        let mut app = open_in(&dir, d2);
        app.select_date(d1);
        assert!(!app.is_editable(d1));
        assert_eq!(app.headline(), Headline::TimeGone);

        let frozen = app.record(d1).unwrap().clone();
        assert_eq!(
            app.toggle(Section::Important, 0),
            Err(EditError::ReadOnly { date: d1 })
        );
        assert_eq!(app.add_daily("x"), Err(EditError::ReadOnly { date: d1 }));
        assert_eq!(app.set_journal("y"), Err(EditError::ReadOnly { date: d1 }));
        assert_eq!(app.record(d1), Some(&frozen));
    }

    #[test]
    fn template_rename_updates_today_but_not_history() {
        let dir = tempdir().unwrap();
        let d1 = date(D1.0, D1.1, D1.2);
        let d2 = date(D2.0, D2.1, D2.2);
        {
            let mut app = open_in(&dir, d1);
            app.toggle(Section::Important, 0).unwrap();
        }

        let mut app = open_in(&dir, d2);
        app.toggle(Section::Important, 0).unwrap();
        let id = app.templates().important[0].id.clone();
        assert!(app.edit_template(&id, "Workout"));

        let today_record = app.record(d2).unwrap();
        assert_eq!(today_record.important[0].label, "Workout");
        assert!(today_record.important[0].done, "flag survives the sync");

        let yesterday = app.record(d1).unwrap();
        assert_eq!(yesterday.important[0].label, "Exercise");
        assert!(yesterday.important[0].done);
    }

    #[test]
    fn template_add_and_remove_touch_only_today() {
        let dir = tempdir().unwrap();
        let d1 = date(D1.0, D1.1, D1.2);
        let d2 = date(D2.0, D2.1, D2.2);
        {
            open_in(&dir, d1);
        }

        let mut app = open_in(&dir, d2);
        app.add_template(Category::Moderate, "Stretch").unwrap();
        assert_eq!(app.record(d2).unwrap().moderate.len(), 3);
        assert_eq!(app.record(d1).unwrap().moderate.len(), 2);

        let removed = app.templates().important[0].id.clone();
        assert!(app.remove_template(&removed));
        assert_eq!(app.record(d2).unwrap().important.len(), 1);
        assert_eq!(app.record(d1).unwrap().important.len(), 2);
    }

    #[test]
    fn rollover_re_points_selection_and_freezes_the_old_day() {
        let dir = tempdir().unwrap();
        let d1 = date(D1.0, D1.1, D1.2);
        let d2 = date(D2.0, D2.1, D2.2);
        let mut app = open_in(&dir, d1);
        app.toggle(Section::Important, 0).unwrap();

        // Unchanged day: idempotent no-op.
        assert!(app.tick_at(d1).is_none());

        let rollover = app.tick_at(d2).unwrap();
        assert_eq!(rollover.previous, d1);
        assert_eq!(rollover.current, d2);
        assert_eq!(app.today(), d2);
        assert_eq!(app.selected(), d2, "selection follows the new day");
        assert!(app.tick_at(d2).is_none());

        // The old day is now history.
        assert!(!app.is_editable(d1));
        // The new day's record appears only on first touch.
        assert!(app.record(d2).is_none());
        app.toggle(Section::Important, 0).unwrap();
        let record = app.record(d2).unwrap();
        assert!(record.important[0].done);
        assert!(record.daily.is_empty());
    }

    #[test]
    fn events_fire_after_each_accepted_mutation() {
        let dir = tempdir().unwrap();
        let today = date(2026, 8, 25);
        let mut app = open_in(&dir, today);

        let seen: Rc<RefCell<Vec<Event>>> = Rc::default();
        let sink = Rc::clone(&seen);
        app.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        app.toggle(Section::Important, 0).unwrap();
        app.add_template(Category::Important, "Meditate").unwrap();
        app.select_date(today - Duration::days(1));
        let _ = app.toggle(Section::Important, 0); // rejected, no event

        let seen = seen.borrow();
        assert_eq!(
            *seen,
            vec![
                Event::DayChanged(today),
                Event::TemplatesChanged,
                Event::DayChanged(today),
                Event::SelectionChanged(today - Duration::days(1)),
            ]
        );
    }

    #[test]
    fn candle_strip_is_a_31_day_window_ending_today() {
        let dir = tempdir().unwrap();
        let today = date(2026, 8, 25);
        let mut app = open_in(&dir, today);
        app.toggle(Section::Important, 0).unwrap();

        let strip = app.candle_strip();
        assert_eq!(strip.len(), 31);
        assert_eq!(strip[0].date, today - Duration::days(30));
        assert_eq!(strip[30].date, today);
        assert!(strip[30].selected);
        assert_eq!(strip[30].completion, 25);
        assert_eq!(strip[0].completion, 0, "days without data read as 0");
    }

    #[test]
    fn calendar_grid_is_42_cells_aligned_to_sunday() {
        let dir = tempdir().unwrap();
        // 2026-08-01 is a Saturday, so the grid starts Sunday 2026-07-26.
        let today = date(2026, 8, 25);
        let app = open_in(&dir, today);

        assert_eq!(app.calendar_title(), "August 2026");
        let cells = app.calendar_cells();
        assert_eq!(cells.len(), 42);
        assert_eq!(cells[0].date, date(2026, 7, 26));
        assert_eq!(cells[0].date.weekday(), chrono::Weekday::Sun);
        assert!(!cells[0].in_month);
        let today_cell = cells.iter().find(|c| c.today).unwrap();
        assert_eq!(today_cell.date, today);
        assert!(today_cell.has_data);
    }

    #[test]
    fn month_navigation_wraps_across_years() {
        let dir = tempdir().unwrap();
        let mut app = open_in(&dir, date(2026, 1, 15));
        assert_eq!(app.visible_month(), date(2026, 1, 1));
        app.prev_month();
        assert_eq!(app.visible_month(), date(2025, 12, 1));
        app.next_month();
        app.next_month();
        assert_eq!(app.visible_month(), date(2026, 2, 1));
    }

    #[test]
    fn selecting_a_date_follows_with_the_visible_month() {
        let dir = tempdir().unwrap();
        let mut app = open_in(&dir, date(2026, 8, 25));
        app.select_date(date(2026, 6, 3));
        assert_eq!(app.visible_month(), date(2026, 6, 1));
        assert_eq!(app.headline(), Headline::TimeGone);
        app.select_date(date(2026, 9, 1));
        assert_eq!(app.headline(), Headline::TimeLeft);
        assert!(app.record(date(2026, 9, 1)).is_none(), "future days are never materialized");
    }
}
