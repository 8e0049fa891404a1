#[cfg_attr(not(windows), allow(dead_code))]
mod presentation;

use anyhow::Context;
use clap::Parser;
use ble_label_printer::domain::encoder;
use ble_label_printer::domain::label::LabelDescriptor;
use ble_label_printer::domain::settings::{Settings, SettingsService};
use ble_label_printer::infrastructure::logging::init_logger;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "label-printer")]
#[command(about = "Print a bundle label on an MHT-series BLE label printer")]
struct Cli {
    /// Write the encoded TSPL job to stdout instead of printing
    #[arg(long)]
    dump: bool,

    /// Label descriptor JSON file; `-` or nothing reads stdin
    label: Option<PathBuf>,
}

impl Cli {
    fn label_path(&self) -> Option<&PathBuf> {
        self.label.as_ref().filter(|path| path.as_os_str() != "-")
    }
}

fn read_label(path: Option<&PathBuf>) -> anyhow::Result<LabelDescriptor> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read label file {}", path.display()))?,
        None => {
            let mut json = String::new();
            std::io::stdin()
                .read_to_string(&mut json)
                .context("Could not read label from stdin")?;
            json
        }
    };
    Ok(LabelDescriptor::from_json(&json)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_service = SettingsService::new()?;
    let settings = settings_service.get().clone();

    // Keep the guard alive for the whole run
    let _guard = init_logger(&settings.log_settings)?;

    info!("Starting BLE Label Printer");
    info!("Settings loaded from {}", settings_service.path().display());
    if let Some(problem) = settings_service.load_error() {
        warn!(
            "Ignoring {} and using defaults: {}",
            settings_service.path().display(),
            problem
        );
    }

    let label = read_label(cli.label_path())?;

    if cli.dump {
        let job = encoder::encode(&label, &settings.layout);
        std::io::stdout().write_all(job.as_bytes())?;
        return Ok(());
    }

    run(settings, label).await
}

#[cfg(windows)]
async fn run(settings: Settings, label: LabelDescriptor) -> anyhow::Result<()> {
    use ble_label_printer::infrastructure::bluetooth::winrt::WinRtPlatform;
    use ble_label_printer::{ConnectOutcome, PrinterSession};
    use presentation::console::{self, ConsoleChooser};
    use tokio::sync::mpsc;

    let (event_sender, event_receiver) = mpsc::unbounded_channel();
    let events = tokio::spawn(console::print_events(event_receiver));

    let chooser = ConsoleChooser::new(settings.printer.printer_name_patterns.clone());
    let platform = WinRtPlatform::new(chooser, settings.printer.scan_duration());

    let result = async {
        let mut session = PrinterSession::new(platform, settings.printer)
            .with_layout(settings.layout)
            .with_events(event_sender);

        if session.auto_reconnect_with_delay().await.is_none() {
            if let ConnectOutcome::Cancelled = session.manual_connect().await? {
                info!("No printer selected");
                return Ok(());
            }
        }

        let report = session.print_label(&label).await?;
        info!("Label {} printed ({} bytes)", label.fardo_no, report.bytes);
        session.disconnect();
        anyhow::Ok(())
    }
    .await;

    // Session dropped above, which closes the event channel
    events.await?;
    result
}

#[cfg(not(windows))]
async fn run(_settings: Settings, _label: LabelDescriptor) -> anyhow::Result<()> {
    anyhow::bail!("No Bluetooth LE backend is available on this platform; use --dump")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_dump_with_label_file() {
        let cli = Cli::try_parse_from(["label-printer", "--dump", "bundle.json"]).unwrap();
        assert!(cli.dump);
        assert_eq!(cli.label_path(), Some(&PathBuf::from("bundle.json")));
    }

    #[test]
    fn test_cli_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["label-printer"]).unwrap();
        assert!(!cli.dump);
        assert_eq!(cli.label_path(), None);

        let cli = Cli::try_parse_from(["label-printer", "-"]).unwrap();
        assert_eq!(cli.label_path(), None);
    }

    #[test]
    fn test_cli_rejects_unknown_option() {
        assert!(Cli::try_parse_from(["label-printer", "--copies", "2"]).is_err());
    }
}
