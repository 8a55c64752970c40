use std::time::Duration;

use clap::Parser;

use crate::transport::CameraAddress;

/// Name the camera lists this controller under in its Bluetooth menu.
pub const DEFAULT_DEVICE_NAME: &str = "Magic Pocket Control";

#[derive(Debug, Parser)]
#[command(
    name = "camera-controller",
    version,
    about = "Remote control for Blackmagic cameras over Bluetooth LE"
)]
pub struct Args {
    /// Connect to this camera instead of the first one a scan finds
    #[arg(short, long, env = "CAMERA_ADDRESS")]
    pub address: Option<CameraAddress>,

    #[arg(short = 'n', long, default_value = DEFAULT_DEVICE_NAME)]
    pub device_name: String,

    /// How long each scan listens for cameras, in seconds
    #[arg(long, default_value_t = 5)]
    pub scan_secs: u64,

    /// Pause between connection attempts, in seconds
    #[arg(long, default_value_t = 5)]
    pub reconnect_secs: u64,

    /// Control loop tick, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    pub address: Option<CameraAddress>,
    pub device_name: String,
    pub scan_window: Duration,
    pub reconnect_interval: Duration,
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: None,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            scan_window: Duration::from_secs(5),
            reconnect_interval: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl From<Args> for ControllerConfig {
    fn from(args: Args) -> Self {
        Self {
            address: args.address,
            device_name: args.device_name,
            scan_window: Duration::from_secs(args.scan_secs),
            reconnect_interval: Duration::from_secs(args.reconnect_secs),
            poll_interval: Duration::from_millis(args.poll_ms),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_flags() {
        let args = Args::try_parse_from(["camera-controller"]).unwrap();
        assert_eq!(ControllerConfig::from(args), ControllerConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "camera-controller",
            "--address",
            "7C:2E:0D:01:02:03",
            "--device-name",
            "Rig B",
            "--poll-ms",
            "250",
        ])
        .unwrap();
        let config = ControllerConfig::from(args);
        assert_eq!(
            config.address,
            Some(CameraAddress([0x7c, 0x2e, 0x0d, 0x01, 0x02, 0x03]))
        );
        assert_eq!(config.device_name, "Rig B");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.scan_window, Duration::from_secs(5));
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(Args::try_parse_from(["camera-controller", "-a", "nope"]).is_err());
    }
}
