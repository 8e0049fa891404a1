//! In-memory BLE platform for tests.

use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::{
    BleCharacteristic, BleLink, BlePlatform, DeviceFilter, DeviceHandle,
};
use crate::infrastructure::bluetooth::writer::WriteMode;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProbeStep {
    Service(Uuid),
    Characteristic(Uuid, Uuid),
}

#[derive(Debug, Clone)]
pub(crate) struct WriteRecord {
    pub mode: WriteMode,
    pub bytes: Vec<u8>,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct WriteState {
    writes: Vec<WriteRecord>,
    without_response_attempts: usize,
    with_response_attempts: usize,
    without_response_error: Option<PrinterError>,
    /// Accepted writes before the link drops.
    link_budget: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeCharacteristic {
    uuid: Uuid,
    without_response: bool,
    state: Rc<RefCell<WriteState>>,
}

impl FakeCharacteristic {
    pub fn new(uuid: Uuid, without_response: bool) -> Self {
        Self {
            uuid,
            without_response,
            state: Rc::default(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.borrow().writes.clone()
    }

    pub fn attempts(&self, mode: WriteMode) -> usize {
        let state = self.state.borrow();
        match mode {
            WriteMode::WithoutResponse => state.without_response_attempts,
            WriteMode::WithResponse => state.with_response_attempts,
        }
    }

    /// Make every fire-and-forget write fail with `error`.
    pub fn fail_without_response(&self, error: PrinterError) {
        self.state.borrow_mut().without_response_error = Some(error);
    }

    /// Drop the link once `accepted` writes went through.
    pub fn drop_link_after(&self, accepted: usize) {
        self.state.borrow_mut().link_budget = Some(accepted);
    }

    fn record(&self, mode: WriteMode, data: &[u8]) -> Result<(), PrinterError> {
        let mut state = self.state.borrow_mut();
        match mode {
            WriteMode::WithoutResponse => state.without_response_attempts += 1,
            WriteMode::WithResponse => state.with_response_attempts += 1,
        }

        let budget = state.link_budget;
        if budget.is_some_and(|budget| state.writes.len() >= budget) {
            return Err(PrinterError::LinkLost);
        }
        if mode == WriteMode::WithoutResponse {
            if let Some(error) = &state.without_response_error {
                return Err(error.clone());
            }
        }

        state.writes.push(WriteRecord {
            mode,
            bytes: data.to_vec(),
            at: Instant::now(),
        });
        Ok(())
    }
}

#[async_trait(?Send)]
impl BleCharacteristic for FakeCharacteristic {
    fn supports_write_without_response(&self) -> bool {
        self.without_response
    }

    async fn write_without_response(&self, data: &[u8]) -> Result<(), PrinterError> {
        self.record(WriteMode::WithoutResponse, data)
    }

    async fn write_with_response(&self, data: &[u8]) -> Result<(), PrinterError> {
        self.record(WriteMode::WithResponse, data)
    }
}

/// GATT table of a simulated printer. Every characteristic shares one write log.
#[derive(Debug, Clone)]
pub(crate) struct FakePrinter {
    services: Vec<(Uuid, Vec<Uuid>)>,
    without_response: bool,
    state: Rc<RefCell<WriteState>>,
}

impl FakePrinter {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            without_response: true,
            state: Rc::default(),
        }
    }

    pub fn with_service(mut self, service: Uuid, characteristics: &[Uuid]) -> Self {
        self.services.push((service, characteristics.to_vec()));
        self
    }

    pub fn without_response(mut self, supported: bool) -> Self {
        self.without_response = supported;
        self
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.borrow().writes.clone()
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes().into_iter().flat_map(|w| w.bytes).collect()
    }

    pub fn drop_link_after(&self, accepted: usize) {
        self.state.borrow_mut().link_budget = Some(accepted);
    }
}

pub(crate) struct FakeService(Uuid);

pub(crate) struct FakeLink {
    printer: FakePrinter,
    probes: RefCell<Vec<ProbeStep>>,
}

impl FakeLink {
    pub fn new(printer: FakePrinter) -> Self {
        Self {
            printer,
            probes: RefCell::default(),
        }
    }

    pub fn probes(&self) -> Vec<ProbeStep> {
        self.probes.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BleLink for FakeLink {
    type Service = FakeService;
    type Characteristic = FakeCharacteristic;

    async fn service(&self, uuid: Uuid) -> Result<FakeService, PrinterError> {
        self.probes.borrow_mut().push(ProbeStep::Service(uuid));
        self.printer
            .services
            .iter()
            .find(|(service, _)| *service == uuid)
            .map(|_| FakeService(uuid))
            .ok_or_else(|| PrinterError::Connection(format!("service {} not found", uuid)))
    }

    async fn characteristic(
        &self,
        service: &FakeService,
        uuid: Uuid,
    ) -> Result<FakeCharacteristic, PrinterError> {
        self.probes
            .borrow_mut()
            .push(ProbeStep::Characteristic(service.0, uuid));
        let exposed = self
            .printer
            .services
            .iter()
            .any(|(s, chars)| *s == service.0 && chars.contains(&uuid));
        if !exposed {
            return Err(PrinterError::Connection(format!(
                "characteristic {} not found",
                uuid
            )));
        }
        Ok(FakeCharacteristic {
            uuid,
            without_response: self.printer.without_response,
            state: self.printer.state.clone(),
        })
    }
}

pub(crate) struct FakePlatform {
    chosen: Result<DeviceHandle, PrinterError>,
    authorized: Result<Vec<DeviceHandle>, PrinterError>,
    printers: HashMap<String, FakePrinter>,
    filters: RefCell<Vec<DeviceFilter>>,
    connects: RefCell<Vec<String>>,
}

impl FakePlatform {
    /// A platform whose chooser is dismissed and which has no authorized devices.
    pub fn new() -> Self {
        Self {
            chosen: Err(PrinterError::UserCancelled),
            authorized: Ok(Vec::new()),
            printers: HashMap::new(),
            filters: RefCell::default(),
            connects: RefCell::default(),
        }
    }

    pub fn choosing(mut self, device: DeviceHandle) -> Self {
        self.chosen = Ok(device);
        self
    }

    pub fn chooser_error(mut self, error: PrinterError) -> Self {
        self.chosen = Err(error);
        self
    }

    pub fn authorized(mut self, devices: Vec<DeviceHandle>) -> Self {
        self.authorized = Ok(devices);
        self
    }

    pub fn authorized_error(mut self, error: PrinterError) -> Self {
        self.authorized = Err(error);
        self
    }

    pub fn with_printer(mut self, id: &str, printer: FakePrinter) -> Self {
        self.printers.insert(id.to_string(), printer);
        self
    }

    pub fn requested_filters(&self) -> Vec<DeviceFilter> {
        self.filters.borrow().clone()
    }

    pub fn connect_attempts(&self) -> Vec<String> {
        self.connects.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BlePlatform for FakePlatform {
    type Link = FakeLink;

    async fn request_device(&self, filter: &DeviceFilter) -> Result<DeviceHandle, PrinterError> {
        self.filters.borrow_mut().push(filter.clone());
        self.chosen.clone()
    }

    async fn authorized_devices(&self) -> Result<Vec<DeviceHandle>, PrinterError> {
        self.authorized.clone()
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<FakeLink, PrinterError> {
        self.connects.borrow_mut().push(device.id().to_string());
        self.printers
            .get(device.id())
            .cloned()
            .map(FakeLink::new)
            .ok_or_else(|| PrinterError::Connection(format!("{} unreachable", device.id())))
    }
}
