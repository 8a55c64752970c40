use std::{sync::Arc, time::Duration};

use bmd_ccu::{
    command::BuildError,
    frame::{Command, decode, encode},
    payload::{ParsePayloadError, parse_payload},
    primitives::timecode_from_notification,
    types::CameraStatusFlags,
    validate::{ValidationError, validate},
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    camera::Camera,
    packet_writer::PacketWriter,
    transport::{CameraAddress, Characteristic, Transport, TransportError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Scanning,
    ScanningFound,
    ScanningNoneFound,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Whether the control loop should start a new attempt from here.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Disconnected | Self::ScanningNoneFound)
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Camera is not connected")]
    NotConnected,
    #[error("Refusing to send malformed frame: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid command: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

struct Link {
    status: ConnectionStatus,
    addresses: Vec<CameraAddress>,
    initial_payload_received: bool,
}

/// Lock order is `link` then `camera`.
struct Shared {
    link: Mutex<Link>,
    camera: Camera,
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        let mut link = self.link.lock();
        if link.status != status {
            info!("{:?} -> {status:?}", link.status);
            link.status = status;
        }
    }

    fn start_scan(&self) {
        let mut link = self.link.lock();
        link.addresses.clear();
        if link.status != ConnectionStatus::Scanning {
            info!("{:?} -> Scanning", link.status);
            link.status = ConnectionStatus::Scanning;
        }
    }

    fn on_disconnect(&self) {
        let mut link = self.link.lock();
        if link.status != ConnectionStatus::Disconnected {
            info!("{:?} -> Disconnected", link.status);
        }
        link.status = ConnectionStatus::Disconnected;
        link.initial_payload_received = false;
        // under the link guard so a notification cannot land between the
        // status change and the reset
        self.camera.reset();
    }
}

/// Callback handle given to the transport.
///
/// Safe to call from any task; every method only takes short locks.
#[derive(Clone)]
pub struct ConnectionEvents {
    shared: Arc<Shared>,
}

impl ConnectionEvents {
    pub fn scan_complete(&self, found: impl IntoIterator<Item = CameraAddress>) {
        let mut link = self.shared.link.lock();
        if link.status != ConnectionStatus::Scanning {
            debug!("Scan finished while {:?}", link.status);
            return;
        }
        for address in found {
            if !link.addresses.contains(&address) {
                debug!("Found camera {address}");
                link.addresses.push(address);
            }
        }
        link.status = if link.addresses.is_empty() {
            ConnectionStatus::ScanningNoneFound
        } else {
            ConnectionStatus::ScanningFound
        };
        info!("Scanning -> {:?}", link.status);
    }

    pub fn connected(&self) {
        self.shared.set_status(ConnectionStatus::Connected);
    }

    pub fn disconnected(&self) {
        self.shared.on_disconnect();
    }

    pub fn notification(&self, characteristic: Characteristic, data: &[u8]) {
        // held until the update lands, see `Shared::on_disconnect`
        let mut link = self.shared.link.lock();
        if !matches!(
            link.status,
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            debug!(
                "Ignoring {characteristic:?} notification while {:?}",
                link.status
            );
            return;
        }
        match characteristic {
            Characteristic::IncomingCameraControl => self.camera_control(data),
            Characteristic::Timecode => match timecode_from_notification(data) {
                Some(timecode) => self
                    .shared
                    .camera
                    .update(|state| state.on_timecode(timecode)),
                None => warn!("Bad timecode notification: {data:02x?}"),
            },
            Characteristic::CameraStatus => {
                let flags = CameraStatusFlags::from_notification(data);
                self.shared
                    .camera
                    .update(|state| state.on_camera_status(flags));
                if flags.ready && !link.initial_payload_received {
                    info!("Camera is ready");
                    link.initial_payload_received = true;
                }
            }
            other => debug!("Unexpected notification on {other:?}"),
        }
    }

    fn camera_control(&self, data: &[u8]) {
        if let Err(e) = validate(data) {
            debug!("Dropping frame {data:02x?}: {e}");
            return;
        }
        let command = match decode(data) {
            Ok(command) => command,
            Err(e) => {
                debug!("Dropping frame {data:02x?}: {e}");
                return;
            }
        };
        match parse_payload(&command) {
            Ok(payload) => {
                debug!("Received {payload:?}");
                self.shared.camera.apply(payload);
            }
            Err(e @ ParsePayloadError::Unsupported { .. }) => debug!("{e}"),
            Err(e) => warn!("Dropping frame {data:02x?}: {e}"),
        }
    }
}

/// Connection lifecycle of one camera.
///
/// Retrying is left to the caller: poll [`CameraConnection::status`] and
/// scan or connect again while it is idle.
pub struct CameraConnection<T> {
    transport: T,
    shared: Arc<Shared>,
}

impl<T: Transport> CameraConnection<T> {
    pub fn new(transport: T, camera: Camera) -> Self {
        Self {
            transport,
            shared: Arc::new(Shared {
                link: Mutex::new(Link {
                    status: ConnectionStatus::Disconnected,
                    addresses: Vec::new(),
                    initial_payload_received: false,
                }),
                camera,
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.link.lock().status
    }

    pub fn camera(&self) -> &Camera {
        &self.shared.camera
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Addresses found by the last scan, in the order they were found.
    pub fn addresses(&self) -> Vec<CameraAddress> {
        self.shared.link.lock().addresses.clone()
    }

    pub fn initial_payload_received(&self) -> bool {
        self.shared.link.lock().initial_payload_received
    }

    pub fn events(&self) -> ConnectionEvents {
        ConnectionEvents {
            shared: self.shared.clone(),
        }
    }

    /// Starts a scan. The outcome shows up later as
    /// [`ConnectionStatus::ScanningFound`] or [`ConnectionStatus::ScanningNoneFound`].
    /// Cameras found by earlier scans are forgotten.
    pub async fn scan(&self, window: Duration) -> std::result::Result<(), TransportError> {
        self.shared.start_scan();
        let result = self.transport.scan(window, self.events()).await;
        if let Err(e) = &result {
            warn!("Scan failed: {e}");
            self.shared.on_disconnect();
        }
        result
    }

    pub async fn connect(&self, address: CameraAddress) -> std::result::Result<(), TransportError> {
        self.shared.set_status(ConnectionStatus::Connecting);
        info!("Connecting to {address}");
        let result = self.transport.connect(address, self.events()).await;
        if let Err(e) = &result {
            warn!("Connecting to {address} failed: {e}");
            self.shared.on_disconnect();
        }
        result
    }

    /// Connects to the first camera a scan found.
    pub async fn connect_discovered(&self) -> std::result::Result<(), TransportError> {
        let address = self
            .shared
            .link
            .lock()
            .addresses
            .first()
            .copied()
            .ok_or(TransportError::NoCameraDiscovered)?;
        self.connect(address).await
    }

    pub async fn disconnect(&self) -> std::result::Result<(), TransportError> {
        let result = self.transport.disconnect().await;
        self.shared.on_disconnect();
        result
    }

    /// Encodes, validates and writes one command to the camera.
    pub async fn send(&self, command: &Command) -> std::result::Result<(), WriteError> {
        let bytes = encode(command);
        if let Err(e) = validate(&bytes) {
            warn!("Not sending {bytes:02x?}: {e}");
            return Err(e.into());
        }
        if self.status() != ConnectionStatus::Connected {
            return Err(WriteError::NotConnected);
        }
        debug!("Sending {bytes:02x?}");
        if let Err(e) = self
            .transport
            .write(Characteristic::OutgoingCameraControl, &bytes, true)
            .await
        {
            warn!("Write failed: {e}");
            self.shared.on_disconnect();
            return Err(e.into());
        }
        Ok(())
    }

    pub fn writer(&self) -> PacketWriter<'_, T> {
        PacketWriter::new(self)
    }
}
