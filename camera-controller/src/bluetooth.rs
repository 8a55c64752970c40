use std::{collections::HashMap, future::Future, pin::Pin, time::Duration};

use bluer::{
    Adapter, AdapterEvent, Address, Device, DeviceEvent, DeviceProperty, Session, Uuid,
    agent::{Agent, AgentHandle, ReqError, ReqResult, RequestPasskey},
    gatt::{
        CharacteristicWriteRequest, WriteOp, remote::Characteristic as GattCharacteristic,
    },
};
use futures::{StreamExt, pin_mut};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    connection::ConnectionEvents,
    transport::{CAMERA_SERVICE_UUID, CameraAddress, Characteristic, Transport, TransportError},
};

const SERVICES_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
const NOTIFYING: [Characteristic; 3] = [
    Characteristic::IncomingCameraControl,
    Characteristic::Timecode,
    Characteristic::CameraStatus,
];

type PasskeyReply = Pin<Box<dyn Future<Output = ReqResult<u32>> + Send>>;

/// The camera asked for the pass key it shows on its screen.
pub struct PasskeyRequest {
    pub camera: CameraAddress,
    pub reply: oneshot::Sender<u32>,
}

/// Background tasks of one link, aborted when dropped.
#[derive(Default)]
struct Tasks(Vec<JoinHandle<()>>);

impl Tasks {
    fn spawn(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.0.push(tokio::spawn(task));
    }
}

impl Drop for Tasks {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

struct Link {
    device: Device,
    characteristics: HashMap<Characteristic, GattCharacteristic>,
    tasks: Tasks,
}

impl Link {
    fn characteristic(
        &self,
        characteristic: Characteristic,
    ) -> Result<GattCharacteristic, TransportError> {
        self.characteristics
            .get(&characteristic)
            .cloned()
            .ok_or(TransportError::MissingCharacteristic(characteristic))
    }

    /// Names the controller, subscribes to the notifying characteristics and
    /// watches for link loss.
    async fn attach(
        &mut self,
        device_name: &str,
        events: &ConnectionEvents,
    ) -> Result<(), TransportError> {
        self.characteristic(Characteristic::DeviceName)?
            .write(device_name.as_bytes())
            .await?;
        self.characteristic(Characteristic::OutgoingCameraControl)?;

        for characteristic in NOTIFYING {
            let notifications = self.characteristic(characteristic)?.notify().await?;
            let events = events.clone();
            self.tasks.spawn(async move {
                pin_mut!(notifications);
                while let Some(data) = notifications.next().await {
                    events.notification(characteristic, &data);
                }
                debug!("{characteristic:?} notifications ended");
            });
        }

        let device_events = self.device.events().await?;
        let events = events.clone();
        self.tasks.spawn(async move {
            pin_mut!(device_events);
            while let Some(event) = device_events.next().await {
                if let DeviceEvent::PropertyChanged(DeviceProperty::Connected(false)) = event {
                    info!("Camera dropped the link");
                    events.disconnected();
                    break;
                }
            }
        });
        Ok(())
    }
}

/// [`Transport`] over BlueZ.
pub struct BluerTransport {
    _session: Session,
    _agent: AgentHandle,
    adapter: Adapter,
    device_name: String,
    link: Mutex<Option<Link>>,
}

impl BluerTransport {
    /// Powers the default adapter and registers a pairing agent that forwards
    /// pass key prompts to `passkeys`.
    pub async fn new(
        device_name: &str,
        passkeys: mpsc::UnboundedSender<PasskeyRequest>,
    ) -> anyhow::Result<Self> {
        let session = Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        debug!("Using adapter {}", adapter.name());

        let agent = Agent {
            request_default: true,
            request_passkey: Some(Box::new(move |request: RequestPasskey| -> PasskeyReply {
                let passkeys = passkeys.clone();
                Box::pin(async move {
                    let (reply, answer) = oneshot::channel();
                    passkeys
                        .send(PasskeyRequest {
                            camera: CameraAddress(request.device.0),
                            reply,
                        })
                        .map_err(|_| ReqError::Rejected)?;
                    answer.await.map_err(|_| ReqError::Canceled)
                })
            })),
            ..Default::default()
        };
        let agent = session.register_agent(agent).await?;

        Ok(Self {
            _session: session,
            _agent: agent,
            adapter,
            device_name: device_name.to_string(),
            link: Mutex::new(None),
        })
    }

    async fn open(
        &self,
        device: &Device,
    ) -> Result<HashMap<Characteristic, GattCharacteristic>, TransportError> {
        if !device.is_paired().await? {
            info!("Pairing with {}", device.address());
            device.pair().await?;
        }
        if !device.is_connected().await? {
            device.connect().await?;
        }

        let resolved = tokio::time::timeout(SERVICES_RESOLVE_TIMEOUT, async {
            while !device.is_services_resolved().await? {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            bluer::Result::Ok(())
        })
        .await;
        match resolved {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Link("services never resolved".to_string())),
        }

        let mut characteristics = HashMap::new();
        for service in device.services().await? {
            if service.uuid().await? != Uuid::from_u128(CAMERA_SERVICE_UUID) {
                continue;
            }
            for characteristic in service.characteristics().await? {
                let uuid = characteristic.uuid().await?.as_u128();
                if let Some(known) = Characteristic::from_uuid(uuid) {
                    characteristics.insert(known, characteristic);
                }
            }
        }
        Ok(characteristics)
    }
}

async fn discover(adapter: &Adapter, window: Duration) -> bluer::Result<Vec<CameraAddress>> {
    let service = Uuid::from_u128(CAMERA_SERVICE_UUID);
    let stream = adapter.discover_devices().await?;
    pin_mut!(stream);
    let mut found = Vec::new();
    let result = tokio::time::timeout(window, async {
        while let Some(event) = stream.next().await {
            if let AdapterEvent::DeviceAdded(address) = event {
                let device = adapter.device(address)?;
                let uuids = device.uuids().await?.unwrap_or_default();
                if uuids.contains(&service) {
                    debug!("{address} offers the camera service");
                    found.push(CameraAddress(address.0));
                }
            }
        }
        bluer::Result::Ok(())
    })
    .await;
    match result {
        // the window elapsed
        Err(_) => Ok(found),
        Ok(result) => result.map(|_| found),
    }
}

impl Transport for BluerTransport {
    async fn scan(&self, window: Duration, events: ConnectionEvents) -> Result<(), TransportError> {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            match discover(&adapter, window).await {
                Ok(found) => events.scan_complete(found),
                Err(e) => {
                    warn!("Discovery failed: {e}");
                    events.scan_complete(Vec::new());
                }
            }
        });
        Ok(())
    }

    async fn connect(
        &self,
        address: CameraAddress,
        events: ConnectionEvents,
    ) -> Result<(), TransportError> {
        let device = self.adapter.device(Address::new(address.0))?;
        let characteristics = match self.open(&device).await {
            Ok(characteristics) => characteristics,
            Err(e) => {
                let _ = device.disconnect().await;
                return Err(e);
            }
        };
        let mut link = Link {
            device: device.clone(),
            characteristics,
            tasks: Tasks::default(),
        };
        if let Err(e) = link.attach(&self.device_name, &events).await {
            // aborts whatever was already spawned
            drop(link);
            let _ = device.disconnect().await;
            return Err(e);
        }

        *self.link.lock() = Some(link);
        events.connected();
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(link) = self.link.lock().take() else {
            return Ok(());
        };
        let device = link.device.clone();
        drop(link);
        device.disconnect().await?;
        Ok(())
    }

    async fn write(
        &self,
        characteristic: Characteristic,
        bytes: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let target = {
            let link = self.link.lock();
            link.as_ref()
                .ok_or(TransportError::NotConnected)?
                .characteristic(characteristic)?
        };
        let request = CharacteristicWriteRequest {
            op_type: if with_response {
                WriteOp::Request
            } else {
                WriteOp::Command
            },
            ..Default::default()
        };
        target.write_ext(bytes, &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn dropped_tasks_are_aborted() {
        let (mut tx, rx) = oneshot::channel::<()>();
        let mut tasks = Tasks::default();
        tasks.spawn(async move {
            let _ = rx.await;
        });
        tokio::task::yield_now().await;
        drop(tasks);
        // the receiver is dropped with the aborted task
        tokio::time::timeout(Duration::from_secs(1), tx.closed())
            .await
            .unwrap();
    }
}
