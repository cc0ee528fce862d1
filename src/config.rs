use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("daylog")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DaylogConfig {
    pub data_directory: PathBuf,
}

impl Default for DaylogConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
        }
    }
}

impl DaylogConfig {
    pub fn templates_path(&self) -> PathBuf {
        self.data_directory.join("templates.json")
    }

    pub fn days_path(&self) -> PathBuf {
        self.data_directory.join("days.json")
    }

    /// Ensure the data directory exists. The files themselves appear on
    /// first save; their absence means a fresh install.
    pub fn ensure_files(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)
    }
}
