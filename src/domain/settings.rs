use crate::domain::encoder::LabelLayout;
use crate::infrastructure::bluetooth::platform::DeviceFilter;
use crate::infrastructure::bluetooth::protocol::{self, ServiceCandidate};
use crate::infrastructure::bluetooth::writer::WriterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::rolling::Rotation;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl LogSettings {
    pub fn rotation(&self) -> Rotation {
        match self.rotation.to_lowercase().as_str() {
            "hourly" => Rotation::HOURLY,
            "minutely" => Rotation::MINUTELY,
            "never" => Rotation::NEVER,
            _ => Rotation::DAILY,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "label_printer".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Transport and discovery tuning for the label printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSettings {
    /// Known firmware dialects, probed in this order.
    #[serde(default = "protocol::default_service_candidates")]
    pub service_candidates: Vec<ServiceCandidate>,
    /// Services requested at pairing time in addition to the candidates' own.
    #[serde(default = "protocol::default_extra_services")]
    pub extra_optional_services: Vec<Uuid>,
    /// Case-sensitive name fragments identifying a printer among authorized devices.
    #[serde(default = "protocol::default_printer_name_patterns")]
    pub printer_name_patterns: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    #[serde(default = "default_auto_reconnect_delay_ms")]
    pub auto_reconnect_delay_ms: u64,
    /// How long the advertisement scan runs before the device chooser is shown.
    #[serde(default = "default_scan_duration_ms")]
    pub scan_duration_ms: u64,
}

impl PrinterSettings {
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            chunk_size: self.chunk_size,
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
        }
    }

    pub fn device_filter(&self) -> DeviceFilter {
        let mut optional_services: Vec<Uuid> = Vec::new();
        let candidate_services = self.service_candidates.iter().map(|c| c.service_uuid);
        for uuid in candidate_services.chain(self.extra_optional_services.iter().copied()) {
            if !optional_services.contains(&uuid) {
                optional_services.push(uuid);
            }
        }
        // Some firmware advertises no service UUID at all.
        DeviceFilter {
            optional_services,
            accept_all: true,
        }
    }

    pub fn auto_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.auto_reconnect_delay_ms)
    }

    pub fn scan_duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            service_candidates: protocol::default_service_candidates(),
            extra_optional_services: protocol::default_extra_services(),
            printer_name_patterns: protocol::default_printer_name_patterns(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            auto_reconnect_delay_ms: default_auto_reconnect_delay_ms(),
            scan_duration_ms: default_scan_duration_ms(),
        }
    }
}

fn default_chunk_size() -> usize {
    20
}
fn default_chunk_delay_ms() -> u64 {
    50
}
fn default_auto_reconnect_delay_ms() -> u64 {
    500
}
fn default_scan_duration_ms() -> u64 {
    4000
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub printer: PrinterSettings,

    #[serde(default)]
    pub layout: LabelLayout,

    #[serde(default)]
    pub log_settings: LogSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
    load_error: Option<String>,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::load(settings_path))
    }

    /// Load from an explicit path, falling back to defaults when the file is missing or invalid.
    ///
    /// A file that exists but does not parse is reported by [`load_error`](Self::load_error),
    /// since this typically runs before logging is configured.
    pub fn load(settings_path: PathBuf) -> Self {
        let (settings, load_error) = if settings_path.exists() {
            match Self::load_from_file(&settings_path) {
                Ok(settings) => (settings, None),
                Err(e) => (Settings::default(), Some(e.to_string())),
            }
        } else {
            (Settings::default(), None)
        };

        Self {
            settings,
            settings_path,
            load_error,
        }
    }

    /// Why an existing settings file was ignored, if it was.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("BleLabelPrinter");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
