use std::{fmt, future::Future, str::FromStr, time::Duration};

use thiserror::Error;

use crate::connection::ConnectionEvents;

/// Primary GATT service of a Blackmagic camera.
pub const CAMERA_SERVICE_UUID: u128 = 0x291d567a_6d75_11e6_8b77_86f30ca893d3;

/// The camera's GATT characteristics this controller talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Characteristic {
    OutgoingCameraControl,
    IncomingCameraControl,
    Timecode,
    CameraStatus,
    DeviceName,
    ProtocolVersion,
}

impl Characteristic {
    pub const fn uuid(&self) -> u128 {
        match self {
            Self::OutgoingCameraControl => 0x5dd3465f_1aee_4299_8493_d2eca2f8e1bb,
            Self::IncomingCameraControl => 0xb864e140_76a0_416a_bf30_5876504537d9,
            Self::Timecode => 0x6d8f2110_86f1_41bf_9afb_451d87e976c8,
            Self::CameraStatus => 0x7fe8691d_95dc_4fc5_8abd_ca74339b51b9,
            Self::DeviceName => 0xffac0c52_c9fb_41a0_b063_cc76282eb89c,
            Self::ProtocolVersion => 0x8f1fd018_b508_456f_8f82_3d392bee2706,
        }
    }

    pub fn from_uuid(uuid: u128) -> Option<Self> {
        [
            Self::OutgoingCameraControl,
            Self::IncomingCameraControl,
            Self::Timecode,
            Self::CameraStatus,
            Self::DeviceName,
            Self::ProtocolVersion,
        ]
        .into_iter()
        .find(|characteristic| characteristic.uuid() == uuid)
    }
}

/// Bluetooth device address of a camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraAddress(pub [u8; 6]);

impl fmt::Display for CameraAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid Bluetooth address: {0}")]
pub struct AddressParseError(String);

impl FromStr for CameraAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut address = [0u8; 6];
        let mut parts = s.split(':');
        for byte in address.iter_mut() {
            *byte = parts
                .next()
                .filter(|part| part.len() == 2)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .ok_or_else(|| AddressParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError(s.to_string()));
        }
        Ok(Self(address))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No link to the camera")]
    NotConnected,
    #[error("No camera has been discovered")]
    NoCameraDiscovered,
    #[error("Camera does not expose characteristic {0:?}")]
    MissingCharacteristic(Characteristic),
    #[error("Link failure: {0}")]
    Link(String),
    #[cfg(feature = "bluetooth")]
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),
}

/// The radio link to a camera.
///
/// Scan results, link changes and notifications are reported back through
/// [`ConnectionEvents`], possibly from another task.
pub trait Transport: Send + Sync {
    /// Starts discovery and reports the found cameras once `window` has elapsed.
    fn scan(
        &self,
        window: Duration,
        events: ConnectionEvents,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;

    /// Connects, subscribes to the notifying characteristics and reports
    /// [`ConnectionEvents::connected`] once the camera can take commands.
    fn connect(
        &self,
        address: CameraAddress,
        events: ConnectionEvents,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;

    fn disconnect(&self) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;

    fn write(
        &self,
        characteristic: Characteristic,
        bytes: &[u8],
        with_response: bool,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_round_trip() {
        let address: CameraAddress = "A0:B1:C2:03:04:FF".parse().unwrap();
        assert_eq!(address, CameraAddress([0xa0, 0xb1, 0xc2, 0x03, 0x04, 0xff]));
        assert_eq!(address.to_string(), "A0:B1:C2:03:04:FF");
    }

    #[test]
    fn address_rejects_garbage() {
        assert!("A0:B1:C2:03:04".parse::<CameraAddress>().is_err());
        assert!("A0:B1:C2:03:04:FF:00".parse::<CameraAddress>().is_err());
        assert!("A0:B1:C2:03:04:GG".parse::<CameraAddress>().is_err());
        assert!("A0B1:C2:03:04:FF".parse::<CameraAddress>().is_err());
    }

    #[test]
    fn characteristic_lookup() {
        assert_eq!(
            Characteristic::from_uuid(0xb864e140_76a0_416a_bf30_5876504537d9),
            Some(Characteristic::IncomingCameraControl)
        );
        assert_eq!(Characteristic::from_uuid(CAMERA_SERVICE_UUID), None);
    }
}
