use super::day_record::{DayRecord, Section};

/// Done/total counts for one section, for the donut display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStats {
    pub done: usize,
    pub total: usize,
}

impl SectionStats {
    pub fn percent(&self) -> u8 {
        percent(self.done, self.total)
    }
}

/// Whole-day completion over all three sections combined. An empty record
/// counts as 0, not as fully done.
pub fn completion(record: &DayRecord) -> u8 {
    let total = record.all_tasks().count();
    let done = record.all_tasks().filter(|t| t.done).count();
    percent(done, total)
}

pub fn section_stats(record: &DayRecord, section: Section) -> SectionStats {
    let tasks = record.section(section);
    SectionStats {
        done: tasks.iter().filter(|t| t.done).count(),
        total: tasks.len(),
    }
}

/// Integer percentage, rounded half away from zero. Every displayed
/// percentage goes through here so the same data never shows two values.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u8
}
