pub mod clock;
pub mod day_record;
pub mod stats;
pub mod template;
