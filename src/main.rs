#![allow(dead_code)]

use chrono::NaiveDate;

use daylog::app::Daylog;
use daylog::config::DaylogConfig;
use daylog::core::day_record::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Day,
    Strip,
    Calendar,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging to the systemd user journal (`journalctl --user -t daylog -f`).
    // Wrapper filters: daylog crate at info/debug (per the --debug flag), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("daylog") {
                    let max = if daylog::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        if let Ok(journal) = systemd_journal_logger::JournalLog::new() {
            let journal = journal.with_syslog_identifier("daylog".to_string());
            if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
                // Global max must be Debug so debug logs can pass through when toggled.
                log::set_max_level(log::LevelFilter::Debug);
            }
        }
    }

    let args: Vec<String> = std::env::args().collect();
    daylog::set_debug_logging(args.iter().any(|a| a == "--debug"));

    let mode = if args.iter().any(|a| a == "--strip") {
        ViewMode::Strip
    } else if args.iter().any(|a| a == "--calendar") {
        ViewMode::Calendar
    } else {
        ViewMode::Day
    };

    let config = DaylogConfig::default();
    let mut app = Daylog::open(&config)?;

    if let Some(date) = flag_value(&args, "--date") {
        match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(date) => app.select_date(date),
            Err(_) => {
                eprintln!("--date expects YYYY-MM-DD, got {date:?}");
                std::process::exit(2);
            }
        }
    }

    match mode {
        ViewMode::Day => print_day(&app),
        ViewMode::Strip => print_strip(&app),
        ViewMode::Calendar => print_calendar(&app),
    }

    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let position = args.iter().position(|a| a == flag)?;
    args.get(position + 1).cloned()
}

fn print_day(app: &Daylog) {
    let date = app.selected();
    println!("{} — {}", app.headline().label(), date);
    if !app.is_editable(date) {
        println!("(read-only: only today's data can be edited)");
    }
    println!();

    let record = app.record(date);
    for section in Section::ALL {
        let stats = app.donut(section);
        println!("{} — {}%", section.key(), stats.percent());
        if let Some(record) = record {
            for task in record.section(section) {
                println!("  [{}] {}", if task.done { "x" } else { " " }, task.label);
            }
        }
        println!();
    }

    if let Some(record) = record {
        if !record.journal.is_empty() {
            println!("journal:");
            for line in record.journal.lines() {
                println!("  {line}");
            }
        }
    }
}

fn print_strip(app: &Daylog) {
    for day in app.candle_strip() {
        let bars = (day.completion as usize) / 10;
        let marker = if day.selected { ">" } else { " " };
        println!(
            "{}{} {:>3}% {}",
            marker,
            day.date,
            day.completion,
            "#".repeat(bars)
        );
    }
}

fn print_calendar(app: &Daylog) {
    println!("{}", app.calendar_title());
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for (i, cell) in app.calendar_cells().iter().enumerate() {
        let day = cell.date.format("%e").to_string();
        let mark = if cell.today {
            '*'
        } else if cell.has_data {
            '.'
        } else {
            ' '
        };
        if cell.in_month {
            print!("{day:>3}{mark}");
        } else {
            print!("    ");
        }
        if (i + 1) % 7 == 0 {
            println!();
        }
    }
}
