//! btleplug GATT transport and session driver.
//!
//! Implements [`GattTransport`] and [`SettleTimer`] on top of a connected
//! `btleplug` peripheral, and runs one client session as a single task:
//!
//! ```text
//!           ┌──────────────── loop ────────────────┐
//!           │ 1. perform the pending operation      │
//!           │    └─▶ completion ─▶ BpsService       │
//!           │ 2. otherwise wait for the first of:   │
//!           │    notification · settle · link · ^C  │
//!           └──────────────────────────────────────┘
//! ```
//!
//! Operations are queued by the service and executed one at a time, so
//! completions are always observed in issue order.
//!
//! ## Handles
//!
//! A [`CharHandle`] is the index of the characteristic in the sorted list
//! btleplug reports for service 0x1810.
//!
//! ## CCCD writes
//!
//! The host stack owns the CCCD. A write of a non-zero value maps to
//! `subscribe()`, which enables indications or notifications according to
//! the characteristic's properties; `00 00` maps to `unsubscribe()`.

use anyhow::{Context as _, Result, anyhow, bail};
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures_lite::StreamExt;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::time::SettleDeadline;
use crate::app::ports::{GattTransport, SettleTimer};
use crate::app::service::BpsService;
use crate::codec::HexDump;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::events::{GattEvent, GattStatus};
use crate::gatt::{self, CharHandle, CharProperties, CharacteristicRef};

// ── Pending operation ────────────────────────────────────────

#[derive(Debug, Clone)]
enum PendingOp {
    Read(CharHandle),
    WriteCccd(CharHandle, [u8; 2]),
    Write(CharHandle, Vec<u8>),
}

// ── Transport ────────────────────────────────────────────────

pub struct BleTransport {
    peripheral: Peripheral,
    characteristics: Vec<Characteristic>,
    pending: Option<PendingOp>,
    settle: SettleDeadline,
}

impl BleTransport {
    /// Wrap a peripheral whose services have been discovered.
    pub fn new(peripheral: Peripheral) -> Self {
        let characteristics: Vec<_> = peripheral
            .characteristics()
            .into_iter()
            .filter(|c| c.service_uuid == gatt::BLOOD_PRESSURE_SERVICE_UUID)
            .collect();
        debug!("{} characteristics in service 0x1810", characteristics.len());
        Self {
            peripheral,
            characteristics,
            pending: None,
            settle: SettleDeadline::new(),
        }
    }

    /// The discovery result in core terms.
    pub fn discovered(&self) -> Vec<CharacteristicRef> {
        self.characteristics
            .iter()
            .enumerate()
            .map(|(i, c)| {
                CharacteristicRef::new(CharHandle(i as u16), c.uuid, properties(c.properties))
            })
            .collect()
    }

    pub fn handle_for(&self, uuid: &Uuid) -> Option<CharHandle> {
        self.characteristics
            .iter()
            .position(|c| c.uuid == *uuid)
            .map(|i| CharHandle(i as u16))
    }

    fn characteristic(&self, handle: CharHandle) -> Result<&Characteristic, TransportError> {
        self.characteristics
            .get(usize::from(handle.0))
            .ok_or(TransportError::UnknownCharacteristic)
    }

    fn start(&mut self, op: PendingOp) -> Result<(), TransportError> {
        if self.pending.is_some() {
            return Err(TransportError::Busy);
        }
        debug!("queued {op:?}");
        self.pending = Some(op);
        Ok(())
    }

    /// Execute the queued operation, if any, and return its completion.
    pub async fn complete_pending(&mut self) -> Option<GattEvent> {
        let op = self.pending.take()?;
        Some(self.execute(op).await)
    }

    async fn execute(&self, op: PendingOp) -> GattEvent {
        match op {
            PendingOp::Read(handle) => {
                let result = match self.characteristic(handle) {
                    Ok(c) => self.peripheral.read(c).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                let (status, value) = match result {
                    Ok(value) => (GattStatus::SUCCESS, value),
                    Err(e) => (failure("read", handle, &e), Vec::new()),
                };
                GattEvent::CharacteristicReadComplete {
                    characteristic: handle,
                    status,
                    value,
                }
            }
            PendingOp::WriteCccd(handle, value) => {
                let result = match self.characteristic(handle) {
                    Ok(c) if value == [0x00, 0x00] => {
                        self.peripheral.unsubscribe(c).await.map_err(|e| e.to_string())
                    }
                    Ok(c) => self.peripheral.subscribe(c).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                debug!("CCCD {handle} <- {}", HexDump(&value));
                GattEvent::DescriptorWriteComplete {
                    characteristic: handle,
                    status: status_of(result, "CCCD write", handle),
                }
            }
            PendingOp::Write(handle, value) => {
                let result = match self.characteristic(handle) {
                    Ok(c) => self
                        .peripheral
                        .write(c, &value, WriteType::WithResponse)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                GattEvent::CharacteristicWriteComplete {
                    characteristic: handle,
                    status: status_of(result, "write", handle),
                }
            }
        }
    }
}

impl GattTransport for BleTransport {
    fn read_characteristic(&mut self, characteristic: CharHandle) -> Result<(), TransportError> {
        self.characteristic(characteristic)?;
        self.start(PendingOp::Read(characteristic))
    }

    fn write_descriptor(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError> {
        let c = self.characteristic(characteristic)?;
        if !c
            .properties
            .intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE)
        {
            return Err(TransportError::DescriptorMissing);
        }
        let value: [u8; 2] = value.try_into().map_err(|_| TransportError::Io)?;
        self.start(PendingOp::WriteCccd(characteristic, value))
    }

    fn write_characteristic(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError> {
        self.characteristic(characteristic)?;
        self.start(PendingOp::Write(characteristic, value.to_vec()))
    }
}

impl SettleTimer for BleTransport {
    fn start_settle_timer(&mut self, delay: std::time::Duration, epoch: u32) {
        self.settle.arm(delay, epoch);
    }
}

fn properties(flags: CharPropFlags) -> CharProperties {
    [
        (CharPropFlags::READ, CharProperties::READ),
        (CharPropFlags::WRITE, CharProperties::WRITE),
        (CharPropFlags::NOTIFY, CharProperties::NOTIFY),
        (CharPropFlags::INDICATE, CharProperties::INDICATE),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .fold(CharProperties::empty(), |acc, (_, p)| acc | p)
}

/// btleplug does not surface ATT error codes; every failure is reported as
/// "Unlikely Error".
fn failure(what: &str, handle: CharHandle, error: &str) -> GattStatus {
    warn!("{what} on {handle} FAILED: {error}");
    GattStatus::UNLIKELY_ERROR
}

fn status_of(result: Result<(), String>, what: &str, handle: CharHandle) -> GattStatus {
    match result {
        Ok(()) => GattStatus::SUCCESS,
        Err(e) => failure(what, handle, &e),
    }
}

// ── Session driver ───────────────────────────────────────────

enum Wake {
    Value(Option<btleplug::api::ValueNotification>),
    Settle(u32),
    Central(Option<CentralEvent>),
    Interrupt,
}

/// Scan, connect and run one session until the link drops or Ctrl-C.
pub async fn run(config: &ClientConfig) -> Result<()> {
    let manager = Manager::new().await.context("Bluetooth manager")?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no Bluetooth adapter found"))?;

    let peripheral = find_device(&adapter, config).await?;
    peripheral.connect().await.context("connect")?;
    peripheral
        .discover_services()
        .await
        .context("service discovery")?;
    info!("connected, services discovered");

    let mut transport = BleTransport::new(peripheral.clone());
    let mut service = BpsService::new(config.session.clone());
    let mut sink = LogEventSink::new();
    let mut notifications = peripheral.notifications().await?;
    let mut central_events = adapter.events().await?;

    service.handle(
        GattEvent::Discovered(transport.discovered()),
        &mut transport,
        &mut sink,
    );
    service.subscribe(&mut transport, &mut sink);

    loop {
        if let Some(done) = transport.complete_pending().await {
            service.handle(done, &mut transport, &mut sink);
            continue;
        }

        let wake = tokio::select! {
            n = notifications.next() => Wake::Value(n),
            epoch = transport.settle.wait() => Wake::Settle(epoch),
            e = central_events.next() => Wake::Central(e),
            _ = tokio::signal::ctrl_c() => Wake::Interrupt,
        };

        match wake {
            Wake::Value(Some(n)) => match transport.handle_for(&n.uuid) {
                Some(characteristic) => service.handle(
                    GattEvent::ValueChanged {
                        characteristic,
                        value: n.value,
                    },
                    &mut transport,
                    &mut sink,
                ),
                None => debug!("value from unknown {}: {}", n.uuid, HexDump(&n.value)),
            },
            Wake::Settle(epoch) => {
                service.handle(GattEvent::SettleElapsed { epoch }, &mut transport, &mut sink);
            }
            Wake::Central(Some(CentralEvent::DeviceDisconnected(id))) if id == peripheral.id() => {
                service.handle(GattEvent::Disconnected, &mut transport, &mut sink);
                break;
            }
            Wake::Central(Some(_)) => {}
            Wake::Value(None) | Wake::Central(None) => {
                info!("event stream closed");
                service.handle(GattEvent::Disconnected, &mut transport, &mut sink);
                break;
            }
            Wake::Interrupt => {
                info!("interrupted, disconnecting");
                peripheral.disconnect().await.context("disconnect")?;
                break;
            }
        }
    }

    info!(
        "session ended in {}: {} measurements, {} record frames",
        service.state(),
        sink.measurements(),
        sink.records()
    );
    Ok(())
}

async fn find_device(adapter: &Adapter, config: &ClientConfig) -> Result<Peripheral> {
    let filter = ScanFilter {
        services: vec![gatt::BLOOD_PRESSURE_SERVICE_UUID],
    };
    adapter.start_scan(filter).await.context("start scan")?;
    info!("scanning for {}s", config.scan_duration_secs);
    tokio::time::sleep(config.scan_duration()).await;
    adapter.stop_scan().await.context("stop scan")?;

    let wanted = config.device_filter.as_deref().map(str::to_lowercase);
    for peripheral in adapter.peripherals().await? {
        let Some(props) = peripheral.properties().await? else {
            continue;
        };
        let name = props.local_name.unwrap_or_default();
        let address = props.address.to_string();
        let matches = match &wanted {
            Some(f) => name.to_lowercase().contains(f) || address.to_lowercase().contains(f),
            None => props.services.contains(&gatt::BLOOD_PRESSURE_SERVICE_UUID),
        };
        debug!("seen {name:?} [{address}] match={matches}");
        if matches {
            info!("found {name:?} [{address}]");
            return Ok(peripheral);
        }
    }
    bail!("no Blood Pressure peripheral found")
}
