use crate::primitives::{read_i16s, write_i16s};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WhiteBalance {
    pub kelvin: i16,
    pub tint: i16,
}

impl WhiteBalance {
    pub const KELVIN_MIN: i16 = 2500;
    pub const KELVIN_MAX: i16 = 10000;
    pub const KELVIN_STEP: i16 = 50;
    pub const TINT_MIN: i16 = -50;
    pub const TINT_MAX: i16 = 50;

    /// Daylight, tungsten, fluorescent, shade and cloudy.
    pub const PRESETS: [WhiteBalance; 5] = [
        WhiteBalance { kelvin: 5600, tint: 10 },
        WhiteBalance { kelvin: 3200, tint: 0 },
        WhiteBalance { kelvin: 4000, tint: 15 },
        WhiteBalance { kelvin: 4500, tint: 15 },
        WhiteBalance { kelvin: 6500, tint: 10 },
    ];

    pub fn is_in_range(&self) -> bool {
        (Self::KELVIN_MIN..=Self::KELVIN_MAX).contains(&self.kelvin)
            && (Self::TINT_MIN..=Self::TINT_MAX).contains(&self.tint)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        write_i16s(&[self.kelvin, self.tint])
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let values = read_i16s(bytes);
        Some(Self {
            kelvin: *values.first()?,
            tint: *values.get(1)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordingFormat {
    pub frame_rate: i16,
    pub off_speed_frame_rate: i16,
    pub width: i16,
    pub height: i16,
    pub file_m_rate: bool,
    pub sensor_m_rate: bool,
    pub sensor_off_speed: bool,
    pub interlaced: bool,
    pub windowed_mode: bool,
}

impl RecordingFormat {
    const FILE_M_RATE: i16 = 0x01;
    const SENSOR_M_RATE: i16 = 0x02;
    const SENSOR_OFF_SPEED: i16 = 0x04;
    const INTERLACED: i16 = 0x08;
    const WINDOWED_MODE: i16 = 0x10;

    pub const OFF_SPEED_FRAME_RATE_MIN: i16 = 5;
    pub const OFF_SPEED_FRAME_RATE_MAX: i16 = 60;

    fn flags(&self) -> i16 {
        [
            (self.file_m_rate, Self::FILE_M_RATE),
            (self.sensor_m_rate, Self::SENSOR_M_RATE),
            (self.sensor_off_speed, Self::SENSOR_OFF_SPEED),
            (self.interlaced, Self::INTERLACED),
            (self.windowed_mode, Self::WINDOWED_MODE),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, flag)| acc | flag)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        write_i16s(&[
            self.frame_rate,
            self.off_speed_frame_rate,
            self.width,
            self.height,
            self.flags(),
        ])
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let values = read_i16s(bytes);
        if values.len() < 5 {
            return None;
        }
        let flags = values[4];
        Some(Self {
            frame_rate: values[0],
            off_speed_frame_rate: values[1],
            width: values[2],
            height: values[3],
            file_m_rate: flags & Self::FILE_M_RATE != 0,
            sensor_m_rate: flags & Self::SENSOR_M_RATE != 0,
            sensor_off_speed: flags & Self::SENSOR_OFF_SPEED != 0,
            interlaced: flags & Self::INTERLACED != 0,
            windowed_mode: flags & Self::WINDOWED_MODE != 0,
        })
    }

    /// Frame rate as the camera displays it, 23.98 for 24 with m-rate.
    pub fn frame_rate_label(&self) -> String {
        if self.file_m_rate {
            format!("{:.2}", self.frame_rate as f64 * 1000.0 / 1001.0)
        } else {
            self.frame_rate.to_string()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    Preview = 0,
    Play = 1,
    Record = 2,
}

impl TransportMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Preview,
            1 => Self::Play,
            2 => Self::Record,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveStorageMedium {
    #[default]
    CFastCard = 0,
    SdCard = 1,
    Ssd = 2,
    Usb = 3,
}

impl ActiveStorageMedium {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::CFastCard,
            1 => Self::SdCard,
            2 => Self::Ssd,
            3 => Self::Usb,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CFastCard => "CFast",
            Self::SdCard => "SD",
            Self::Ssd => "SSD",
            Self::Usb => "USB",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportSlot {
    pub active: bool,
    pub medium: ActiveStorageMedium,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportInfo {
    pub mode: TransportMode,
    pub speed: i8,
    pub loop_playback: bool,
    pub play_all: bool,
    pub timelapse_recording: bool,
    pub slots: Vec<TransportSlot>,
}

impl TransportInfo {
    const LOOP: u8 = 0x01;
    const PLAY_ALL: u8 = 0x02;
    const TIMELAPSE_RECORDING: u8 = 0x80;
    /// Per-slot "active" bits in the flags byte. Slots past the third have no bit.
    const SLOT_ACTIVE_MASKS: [u8; 4] = [0x20, 0x40, 0x10, 0x00];

    fn slot_mask(index: usize) -> u8 {
        Self::SLOT_ACTIVE_MASKS.get(index).copied().unwrap_or(0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut flags = 0;
        if self.loop_playback {
            flags |= Self::LOOP;
        }
        if self.play_all {
            flags |= Self::PLAY_ALL;
        }
        if self.timelapse_recording {
            flags |= Self::TIMELAPSE_RECORDING;
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.active {
                flags |= Self::slot_mask(i);
            }
        }
        let mut out = vec![self.mode as u8, self.speed as u8, flags];
        out.extend(self.slots.iter().map(|slot| slot.medium as u8));
        out
    }

    /// Returns `None` when the payload is too short or carries an unknown mode/medium.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 3 {
            return None;
        }
        let flags = bytes[2];
        let slots = bytes[3..]
            .iter()
            .enumerate()
            .map(|(i, medium)| {
                Some(TransportSlot {
                    active: flags & Self::slot_mask(i) != 0,
                    medium: ActiveStorageMedium::from_byte(*medium)?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            mode: TransportMode::from_byte(bytes[0])?,
            speed: bytes[1] as i8,
            loop_playback: flags & Self::LOOP != 0,
            play_all: flags & Self::PLAY_ALL != 0,
            timelapse_recording: flags & Self::TIMELAPSE_RECORDING != 0,
            slots,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasicCodec {
    Raw = 0,
    DnxHd = 1,
    ProRes = 2,
    Braw = 3,
}

impl BasicCodec {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Raw,
            1 => Self::DnxHd,
            2 => Self::ProRes,
            3 => Self::Braw,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::DnxHd => "DNxHD",
            Self::ProRes => "ProRes",
            Self::Braw => "BRAW",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecInfo {
    pub basic_codec: BasicCodec,
    pub variant: u8,
}

impl CodecInfo {
    pub const PRORES_HQ: u8 = 0;
    pub const PRORES_422: u8 = 1;
    pub const PRORES_LT: u8 = 2;
    pub const PRORES_PROXY: u8 = 3;
    pub const PRORES_444: u8 = 4;
    pub const PRORES_444XQ: u8 = 5;

    pub const BRAW_Q0: u8 = 0;
    pub const BRAW_Q5: u8 = 1;
    pub const BRAW_3_1: u8 = 2;
    pub const BRAW_5_1: u8 = 3;
    pub const BRAW_8_1: u8 = 4;
    pub const BRAW_12_1: u8 = 5;
    pub const BRAW_18_1: u8 = 6;
    pub const BRAW_Q1: u8 = 7;
    pub const BRAW_Q3: u8 = 8;

    pub fn new(basic_codec: BasicCodec, variant: u8) -> Self {
        Self {
            basic_codec,
            variant,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        vec![self.basic_codec as u8, self.variant]
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 2 {
            return None;
        }
        Some(Self::new(BasicCodec::from_byte(bytes[0])?, bytes[1]))
    }

    /// Constant bitrate BRAW (3:1 .. 18:1), as opposed to constant quality (Q0 .. Q5).
    pub fn is_braw_bitrate(&self) -> bool {
        self.basic_codec == BasicCodec::Braw
            && matches!(
                self.variant,
                Self::BRAW_3_1 | Self::BRAW_5_1 | Self::BRAW_8_1 | Self::BRAW_12_1 | Self::BRAW_18_1
            )
    }

    pub fn variant_name(&self) -> Option<&'static str> {
        Some(match (self.basic_codec, self.variant) {
            (BasicCodec::ProRes, Self::PRORES_HQ) => "HQ",
            (BasicCodec::ProRes, Self::PRORES_422) => "422",
            (BasicCodec::ProRes, Self::PRORES_LT) => "LT",
            (BasicCodec::ProRes, Self::PRORES_PROXY) => "PXY",
            (BasicCodec::ProRes, Self::PRORES_444) => "444",
            (BasicCodec::ProRes, Self::PRORES_444XQ) => "444XQ",
            (BasicCodec::Braw, Self::BRAW_Q0) => "Q0",
            (BasicCodec::Braw, Self::BRAW_Q5) => "Q5",
            (BasicCodec::Braw, Self::BRAW_3_1) => "3:1",
            (BasicCodec::Braw, Self::BRAW_5_1) => "5:1",
            (BasicCodec::Braw, Self::BRAW_8_1) => "8:1",
            (BasicCodec::Braw, Self::BRAW_12_1) => "12:1",
            (BasicCodec::Braw, Self::BRAW_18_1) => "18:1",
            (BasicCodec::Braw, Self::BRAW_Q1) => "Q1",
            (BasicCodec::Braw, Self::BRAW_Q3) => "Q3",
            _ => return None,
        })
    }
}

impl std::fmt::Display for CodecInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.variant_name() {
            Some(variant) => write!(f, "{} {}", self.basic_codec.as_str(), variant),
            None => write!(f, "{}", self.basic_codec.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaStatus {
    #[default]
    None = 0,
    Ready = 1,
    MountError = -1,
    RecordError = -2,
}

impl MediaStatus {
    pub fn from_i8(value: i8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Ready,
            -1 => Self::MountError,
            -2 => Self::RecordError,
            _ => return None,
        })
    }
}

/// Remaining record time of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemainingTime {
    pub seconds: u32,
    /// More time remains than the camera can express.
    pub over: bool,
}

impl RemainingTime {
    /// Positive values are seconds, negative values are minutes and
    /// `i16::MIN` means the remaining time overflows the field.
    pub fn from_wire(value: i16) -> Self {
        if value >= 0 {
            return Self {
                seconds: value as u32,
                over: false,
            };
        }
        let (minutes, over) = if value == i16::MIN {
            (u16::MAX as u32, true)
        } else {
            (-(value as i32) as u32, false)
        };
        Self {
            seconds: minutes * 60,
            over,
        }
    }

    pub fn minutes(&self) -> f32 {
        self.seconds as f32 / 60.0
    }

    pub fn label(&self) -> String {
        if self.seconds == 0 {
            return "Transport Full".to_string();
        }
        let hours = self.seconds / 3600;
        let minutes = self.seconds / 60 % 60;
        let seconds = self.seconds % 60;
        let mut label = String::new();
        if hours > 0 {
            label.push_str(&format!("{hours:02}:"));
        }
        label.push_str(&format!("{minutes:02}:{seconds:02}"));
        if self.over {
            label.push('+');
        }
        label
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoExposureMode {
    Manual = 0,
    Iris = 1,
    Shutter = 2,
    IrisAndShutter = 3,
    ShutterAndIris = 4,
}

impl AutoExposureMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Manual,
            1 => Self::Iris,
            2 => Self::Shutter,
            3 => Self::IrisAndShutter,
            4 => Self::ShutterAndIris,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectedLut {
    None = 0,
    Custom = 1,
    FilmToVideo = 2,
    FilmToExtendedVideo = 3,
}

impl SelectedLut {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::None,
            1 => Self::Custom,
            2 => Self::FilmToVideo,
            3 => Self::FilmToExtendedVideo,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApertureUnits {
    Fstops = 0,
    Tstops = 1,
}

impl ApertureUnits {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Fstops,
            1 => Self::Tstops,
            _ => return None,
        })
    }

    /// Label such as `f2.8` or `T4.0`.
    pub fn fstop_label(&self, fstop: f64) -> String {
        let prefix = match self {
            Self::Fstops => "f",
            Self::Tstops => "T",
        };
        format!("{prefix}{fstop:.1}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatteryStatus {
    pub voltage_mv: i16,
    pub percent: i16,
    pub battery_present: bool,
    pub ac_present: bool,
    pub charging: bool,
    pub percent_is_estimated: bool,
    pub prefer_voltage_display: bool,
}

impl BatteryStatus {
    const PRESENT: i16 = 0x01;
    const AC_PRESENT: i16 = 0x02;
    const CHARGING: i16 = 0x04;
    const ESTIMATED: i16 = 0x08;
    const PREFER_VOLTAGE: i16 = 0x10;

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let values = read_i16s(bytes);
        if values.len() < 3 {
            return None;
        }
        let flags = values[2];
        Some(Self {
            voltage_mv: values[0],
            percent: values[1],
            battery_present: flags & Self::PRESENT != 0,
            ac_present: flags & Self::AC_PRESENT != 0,
            charging: flags & Self::CHARGING != 0,
            percent_is_estimated: flags & Self::ESTIMATED != 0,
            prefer_voltage_display: flags & Self::PREFER_VOLTAGE != 0,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneTag {
    None = -1,
    WideShot = 0,
    CloseUp = 1,
    MediumShot = 2,
    BigCloseUp = 3,
    MediumCloseUp = 4,
    ExtremeCloseUp = 5,
}

impl SceneTag {
    pub fn from_i8(value: i8) -> Option<Self> {
        Some(match value {
            -1 => Self::None,
            0 => Self::WideShot,
            1 => Self::CloseUp,
            2 => Self::MediumShot,
            3 => Self::BigCloseUp,
            4 => Self::MediumCloseUp,
            5 => Self::ExtremeCloseUp,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationType {
    Exterior = 0,
    Interior = 1,
}

impl LocationType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Exterior,
            1 => Self::Interior,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayNight {
    Night = 0,
    Day = 1,
}

impl DayNight {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Night,
            1 => Self::Day,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TakeTag {
    None = -1,
    PickUp = 0,
    Vfx = 1,
    Series = 2,
}

impl TakeTag {
    pub fn from_i8(value: i8) -> Option<Self> {
        Some(match value {
            -1 => Self::None,
            0 => Self::PickUp,
            1 => Self::Vfx,
            2 => Self::Series,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlateForType {
    NextClip = 0,
    PlaybackFile = 1,
}

impl SlateForType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::NextClip,
            1 => Self::PlaybackFile,
            _ => return None,
        })
    }
}

/// Flags of the camera status characteristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CameraStatusFlags {
    pub powered_on: bool,
    pub ready: bool,
}

impl CameraStatusFlags {
    const POWER: u8 = 0x01;
    const READY: u8 = 0x02;

    pub fn from_notification(data: &[u8]) -> Self {
        let flags = data.first().copied().unwrap_or(0);
        Self {
            powered_on: flags & Self::POWER != 0,
            ready: flags & Self::READY != 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transport_info_slots_from_flags() {
        // record, speed 0, loop + slot 1 and slot 2 active, SD and SSD
        let bytes = [0x02, 0x00, 0x61, 0x01, 0x02];
        let info = TransportInfo::from_bytes(&bytes).unwrap();
        assert_eq!(info.mode, TransportMode::Record);
        assert!(info.loop_playback);
        assert!(!info.play_all);
        assert_eq!(
            info.slots,
            vec![
                TransportSlot {
                    active: true,
                    medium: ActiveStorageMedium::SdCard
                },
                TransportSlot {
                    active: true,
                    medium: ActiveStorageMedium::Ssd
                },
            ]
        );
        assert_eq!(info.to_bytes(), bytes);
    }

    #[test]
    fn transport_info_rejects_unknown_medium() {
        assert_eq!(TransportInfo::from_bytes(&[0, 0, 0, 9]), None);
        assert_eq!(TransportInfo::from_bytes(&[0, 0]), None);
    }

    #[test]
    fn recording_format_flags() {
        let format = RecordingFormat {
            frame_rate: 24,
            off_speed_frame_rate: 60,
            width: 3840,
            height: 2160,
            file_m_rate: true,
            sensor_off_speed: true,
            ..Default::default()
        };
        let bytes = format.to_bytes();
        assert_eq!(&bytes[8..], &[0x05, 0x00]);
        assert_eq!(RecordingFormat::from_bytes(&bytes), Some(format));
        assert_eq!(format.frame_rate_label(), "23.98");
    }

    #[test]
    fn remaining_time_units() {
        let seconds = RemainingTime::from_wire(750);
        assert_eq!(seconds.minutes(), 12.5);
        assert_eq!(seconds.label(), "12:30");

        let minutes = RemainingTime::from_wire(-90);
        assert_eq!(minutes.seconds, 5400);
        assert_eq!(minutes.label(), "01:30:00");

        let over = RemainingTime::from_wire(i16::MIN);
        assert!(over.over);
        assert_eq!(over.seconds, 65535 * 60);
        assert!(over.label().ends_with('+'));

        assert_eq!(RemainingTime::from_wire(0).label(), "Transport Full");
    }

    #[test]
    fn codec_variants() {
        let braw = CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_12_1);
        assert!(braw.is_braw_bitrate());
        assert_eq!(braw.to_string(), "BRAW 12:1");
        let quality = CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_Q5);
        assert!(!quality.is_braw_bitrate());
        let prores = CodecInfo::new(BasicCodec::ProRes, CodecInfo::PRORES_PROXY);
        assert_eq!(prores.to_string(), "ProRes PXY");
        assert_eq!(CodecInfo::from_bytes(&[2, 3]), Some(prores));
    }

    #[test]
    fn battery_flags() {
        // 7400 mV, 100 %, present + charging
        let battery = BatteryStatus::from_bytes(&[0xe8, 0x1c, 0x64, 0x00, 0x05, 0x00]).unwrap();
        assert_eq!(battery.voltage_mv, 7400);
        assert_eq!(battery.percent, 100);
        assert!(battery.battery_present);
        assert!(battery.charging);
        assert!(!battery.ac_present);
    }

    #[test]
    fn fstop_labels() {
        assert_eq!(ApertureUnits::Fstops.fstop_label(2.8), "f2.8");
        assert_eq!(ApertureUnits::Tstops.fstop_label(4.0), "T4.0");
    }
}
