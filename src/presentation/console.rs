//! Terminal front end: device picker and status line output.

use ble_label_printer::domain::models::{AppEvent, ConnectionStatus, MessageSeverity, ScannedDevice};
use ble_label_printer::infrastructure::bluetooth::platform::DeviceChooser;
use ble_label_printer::infrastructure::bluetooth::protocol;
use std::io::{self, BufRead, IsTerminal, Write};
use tokio::sync::mpsc;

/// Lists scanned devices on stderr and reads the choice from stdin.
///
/// Without an interactive stdin the first device that looks like a printer
/// is taken.
pub struct ConsoleChooser {
    printer_name_patterns: Vec<String>,
}

impl ConsoleChooser {
    pub fn new(printer_name_patterns: Vec<String>) -> Self {
        Self {
            printer_name_patterns,
        }
    }

    fn best_match(&self, devices: &[ScannedDevice]) -> Option<usize> {
        devices.iter().position(|d| {
            d.advertises_print_service
                || protocol::matches_printer_name(&d.name, &self.printer_name_patterns)
        })
    }
}

impl DeviceChooser for ConsoleChooser {
    fn choose(&self, devices: &[ScannedDevice]) -> Option<usize> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return self.best_match(devices);
        }

        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "Bluetooth LE devices:");
        for (i, device) in devices.iter().enumerate() {
            let marker = if device.advertises_print_service { "*" } else { " " };
            let _ = writeln!(
                stderr,
                "  {}{:>2}) {:<24} {:012x} {:>4} dBm",
                marker,
                i + 1,
                device.name,
                device.address,
                device.signal_strength
            );
        }
        let _ = write!(stderr, "Select printer [1-{}], empty to cancel: ", devices.len());
        let _ = stderr.flush();

        let mut line = String::new();
        stdin.lock().read_line(&mut line).ok()?;
        parse_choice(&line, devices.len())
    }
}

/// One-based selection to index. Anything else backs out.
fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

fn severity_tag(severity: MessageSeverity) -> &'static str {
    match severity {
        MessageSeverity::Info => "info",
        MessageSeverity::Success => " ok ",
        MessageSeverity::Warning => "warn",
        MessageSeverity::Error => "fail",
    }
}

/// Echo session events until every sender is dropped.
pub async fn print_events(mut receiver: mpsc::UnboundedReceiver<AppEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            AppEvent::LogMessage(message) => {
                eprintln!("[{}] {}", severity_tag(message.severity), message.message);
            }
            AppEvent::ConnectionStatus(ConnectionStatus::Connecting) => {
                eprintln!("[info] Searching for printers...");
            }
            AppEvent::ConnectionStatus(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen(name: &str, print: bool) -> ScannedDevice {
        ScannedDevice {
            name: name.to_string(),
            address: 0,
            signal_strength: -60,
            advertises_print_service: print,
        }
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2\n", 3), Some(1));
        assert_eq!(parse_choice(" 1 ", 1), Some(0));
        assert_eq!(parse_choice("\n", 3), None);
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("q", 3), None);
    }

    #[test]
    fn test_best_match_prefers_printers() {
        let chooser = ConsoleChooser::new(protocol::default_printer_name_patterns());
        let devices = [seen("Headphones", false), seen("BT Printer", false), seen("X", true)];
        assert_eq!(chooser.best_match(&devices), Some(1));
        assert_eq!(chooser.best_match(&devices[..1]), None);
        assert_eq!(chooser.best_match(&devices[2..]), Some(0));
    }
}
