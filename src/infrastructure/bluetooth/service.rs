//! Printer Session
//!
//! Owns the single active printer connection and coordinates connecting,
//! silent reconnection and label jobs.

use crate::domain::encoder::{self, CommandBuffer, LabelLayout};
use crate::domain::label::LabelDescriptor;
use crate::domain::models::{AppEvent, ConnectionStatus, MessageSeverity, StatusMessage};
use crate::domain::settings::PrinterSettings;
use crate::error::PrinterError;
use crate::infrastructure::bluetooth::connection::ActiveConnection;
use crate::infrastructure::bluetooth::platform::{BleLink, BlePlatform, DeviceHandle};
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::resolver::WriteEndpoint;
use crate::infrastructure::bluetooth::writer::{self, SendReport};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Result of a manual connect that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(DeviceHandle),
    /// The user dismissed the chooser. Nothing changed.
    Cancelled,
}

/// Characteristic type exposed by a platform's links.
pub type PlatformCharacteristic<P> = <<P as BlePlatform>::Link as BleLink>::Characteristic;

/// A session with at most one active printer connection.
///
/// The connection is replaced on every successful connect and is never
/// invalidated on link loss; a stale endpoint surfaces as a failed write.
/// Jobs take `&mut self`, so one session never interleaves two jobs.
pub struct PrinterSession<P: BlePlatform> {
    platform: P,
    settings: PrinterSettings,
    layout: LabelLayout,
    active: Option<ActiveConnection<P::Link>>,
    event_sender: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl<P: BlePlatform> PrinterSession<P> {
    pub fn new(platform: P, settings: PrinterSettings) -> Self {
        Self {
            platform,
            settings,
            layout: LabelLayout::default(),
            active: None,
            event_sender: None,
        }
    }

    pub fn with_layout(mut self, layout: LabelLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Report status messages and connection changes on `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn settings(&self) -> &PrinterSettings {
        &self.settings
    }

    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    pub fn device(&self) -> Option<&DeviceHandle> {
        self.active.as_ref().map(|c| c.device())
    }

    pub fn endpoint(&self) -> Option<&WriteEndpoint<PlatformCharacteristic<P>>> {
        self.active.as_ref().map(|c| c.endpoint())
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Let the user pick a printer, connect and resolve its print characteristic.
    ///
    /// A dismissed chooser yields `Ok(ConnectOutcome::Cancelled)` and reports
    /// nothing. Other failures are reported as error messages and returned.
    pub async fn manual_connect(&mut self) -> Result<ConnectOutcome, PrinterError> {
        let filter = self.settings.device_filter();
        self.send_status(ConnectionStatus::Connecting);

        let result = match self.platform.request_device(&filter).await {
            Ok(device) => {
                ActiveConnection::open(&self.platform, device, &self.settings.service_candidates)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(connection) => {
                let device = connection.device().clone();
                self.active = Some(connection);
                self.send_log(
                    &format!("Connected to {}", device.display_name()),
                    MessageSeverity::Success,
                );
                self.send_status(ConnectionStatus::Connected);
                Ok(ConnectOutcome::Connected(device))
            }
            Err(PrinterError::UserCancelled) => {
                info!("Device selection cancelled");
                self.send_status(self.current_status());
                Ok(ConnectOutcome::Cancelled)
            }
            Err(e) => {
                error!("Connection failed: {}", e);
                self.send_log(
                    &format!("Connection failed: {}", e),
                    MessageSeverity::Error,
                );
                self.send_status(ConnectionStatus::Error);
                Err(e)
            }
        }
    }

    /// Reconnect to the first already-authorized printer, without prompting.
    ///
    /// Best effort: every failure is logged and swallowed.
    pub async fn auto_reconnect(&mut self) -> Option<DeviceHandle> {
        let devices = match self.platform.authorized_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Could not list authorized devices: {}", e);
                return None;
            }
        };

        let patterns = &self.settings.printer_name_patterns;
        let Some(device) = devices.into_iter().find(|d| {
            d.name()
                .is_some_and(|name| protocol::matches_printer_name(name, patterns))
        }) else {
            debug!("No authorized printer found for automatic reconnect");
            return None;
        };

        info!("Attempting automatic reconnect to {}", device.display_name());
        match ActiveConnection::open(&self.platform, device, &self.settings.service_candidates)
            .await
        {
            Ok(connection) => {
                let device = connection.device().clone();
                self.active = Some(connection);
                info!("Printer reconnected automatically");
                self.send_status(ConnectionStatus::Connected);
                Some(device)
            }
            Err(e) => {
                warn!("Automatic reconnect failed: {}", e);
                None
            }
        }
    }

    /// [`auto_reconnect`](Self::auto_reconnect) after the configured start-up delay.
    pub async fn auto_reconnect_with_delay(&mut self) -> Option<DeviceHandle> {
        tokio::time::sleep(self.settings.auto_reconnect_delay()).await;
        self.auto_reconnect().await
    }

    /// Drop the active connection.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.active.take() {
            info!("Disconnected from {}", connection.device().display_name());
            self.send_log("Disconnected from printer", MessageSeverity::Info);
            self.send_status(ConnectionStatus::Disconnected);
        }
    }

    /// Send an encoded job on the current endpoint.
    pub async fn print(&mut self, job: CommandBuffer) -> Result<SendReport, PrinterError> {
        let endpoint = self.endpoint().ok_or(PrinterError::NotConnected)?;
        let config = self.settings.writer_config();

        match writer::send(endpoint, job.as_bytes(), &config).await {
            Ok(report) => {
                info!("Sent {} bytes in {} chunks", report.bytes, report.chunks);
                Ok(report)
            }
            Err(e) => {
                error!("Print job failed: {}", e);
                self.send_log(&format!("Print failed: {}", e), MessageSeverity::Error);
                Err(e)
            }
        }
    }

    /// Encode `label` with the session layout and send it.
    pub async fn print_label(&mut self, label: &LabelDescriptor) -> Result<SendReport, PrinterError> {
        if !self.is_connected() {
            return Err(PrinterError::NotConnected);
        }
        let job = encoder::encode(label, &self.layout);
        let report = self.print(job).await?;
        self.send_log(
            &format!("Label sent for {}", label.fardo_no),
            MessageSeverity::Success,
        );
        Ok(report)
    }

    fn current_status(&self) -> ConnectionStatus {
        if self.is_connected() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    fn send_status(&self, status: ConnectionStatus) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(AppEvent::ConnectionStatus(status));
        }
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(AppEvent::LogMessage(StatusMessage {
                message: message.to_string(),
                severity,
            }));
        }
    }
}
