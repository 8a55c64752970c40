pub mod command;
pub mod frame;
pub mod model;
pub mod payload;
pub mod primitives;
pub mod types;
pub mod validate;

/// Smallest frame on the wire: packet header + command header.
pub const PACKET_SIZE_MIN: usize = 8;
/// Largest frame the camera accepts.
pub const PACKET_SIZE_MAX: usize = 64;
pub const PACKET_HEADER_SIZE: usize = 4;
pub const COMMAND_HEADER_SIZE: usize = 4;
pub const PAYLOAD_SIZE_MAX: usize = PACKET_SIZE_MAX - PACKET_HEADER_SIZE - COMMAND_HEADER_SIZE;
pub const BROADCAST_DESTINATION: u8 = 255;

/// Rounds a length up to the 32-bit boundary every frame is padded to.
const fn align4(len: usize) -> usize {
    (len + 3) & !3
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandId {
    ChangeConfiguration = 0,
}

impl CommandId {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::ChangeConfiguration,
            _ => return None,
        })
    }
}

/// The payload-type tag of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Also used for booleans (one byte, 0 or 1).
    Void = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    String = 5,
    Fixed16 = 128,
}

impl DataType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Void,
            1 => Self::Int8,
            2 => Self::Int16,
            3 => Self::Int32,
            4 => Self::Int64,
            5 => Self::String,
            128 => Self::Fixed16,
            _ => return None,
        })
    }

    /// Width of one payload element in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            Self::Void | Self::Int8 | Self::String => 1,
            Self::Int16 | Self::Fixed16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Assign = 0,
    /// Offset for numbers, toggle for booleans.
    Offset = 1,
    StatusUpdate = 2,
}

impl OperationType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Assign,
            1 => Self::Offset,
            2 => Self::StatusUpdate,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Lens = 0,
    Video = 1,
    Audio = 2,
    Output = 3,
    Display = 4,
    Tally = 5,
    Reference = 6,
    Configuration = 7,
    ColorCorrection = 8,
    Status = 9,
    Media = 10,
    ExternalDeviceControl = 11,
    Metadata = 12,
}

impl Category {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Lens,
            1 => Self::Video,
            2 => Self::Audio,
            3 => Self::Output,
            4 => Self::Display,
            5 => Self::Tally,
            6 => Self::Reference,
            7 => Self::Configuration,
            8 => Self::ColorCorrection,
            9 => Self::Status,
            10 => Self::Media,
            11 => Self::ExternalDeviceControl,
            12 => Self::Metadata,
            _ => return None,
        })
    }

    /// Number of parameter ids the category defines; valid ids are `0..count`.
    pub fn parameter_count(&self) -> u8 {
        match self {
            Self::Lens => 10,
            Self::Video => 16,
            Self::Audio => 7,
            Self::Output => 4,
            Self::Display => 6,
            Self::Tally => 3,
            Self::Reference => 2,
            Self::Configuration => 4,
            Self::ColorCorrection => 8,
            Self::Status => 9,
            Self::Media => 2,
            Self::ExternalDeviceControl => 1,
            Self::Metadata => 16,
        }
    }

    pub fn is_valid_parameter(&self, parameter: u8) -> bool {
        parameter < self.parameter_count()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LensParameter {
    Focus = 0,
    AutoFocus = 1,
    ApertureFstop = 2,
    ApertureNormalised = 3,
    ApertureOrdinal = 4,
    AutoAperture = 5,
    ImageStabilisation = 6,
    Zoom = 7,
    ZoomNormalised = 8,
    ContinuousZoom = 9,
}

impl LensParameter {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Focus,
            1 => Self::AutoFocus,
            2 => Self::ApertureFstop,
            3 => Self::ApertureNormalised,
            4 => Self::ApertureOrdinal,
            5 => Self::AutoAperture,
            6 => Self::ImageStabilisation,
            7 => Self::Zoom,
            8 => Self::ZoomNormalised,
            9 => Self::ContinuousZoom,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoParameter {
    Mode = 0,
    SensorGain = 1,
    ManualWhiteBalance = 2,
    SetAutoWhiteBalance = 3,
    RestoreAutoWhiteBalance = 4,
    Exposure = 5,
    ExposureOrdinal = 6,
    DynamicRange = 7,
    SharpeningLevel = 8,
    RecordingFormat = 9,
    AutoExposureMode = 10,
    ShutterAngle = 11,
    ShutterSpeed = 12,
    Gain = 13,
    Iso = 14,
    DisplayLut = 15,
}

impl VideoParameter {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Mode,
            1 => Self::SensorGain,
            2 => Self::ManualWhiteBalance,
            3 => Self::SetAutoWhiteBalance,
            4 => Self::RestoreAutoWhiteBalance,
            5 => Self::Exposure,
            6 => Self::ExposureOrdinal,
            7 => Self::DynamicRange,
            8 => Self::SharpeningLevel,
            9 => Self::RecordingFormat,
            10 => Self::AutoExposureMode,
            11 => Self::ShutterAngle,
            12 => Self::ShutterSpeed,
            13 => Self::Gain,
            14 => Self::Iso,
            15 => Self::DisplayLut,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusParameter {
    Battery = 0,
    MediaStatus = 1,
    RemainingRecordTime = 2,
    DisplayThresholds = 3,
    DisplayTimecode = 4,
    CameraSpec = 5,
    SwitcherStatus = 6,
    DisplayParameters = 7,
}

impl StatusParameter {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Battery,
            1 => Self::MediaStatus,
            2 => Self::RemainingRecordTime,
            3 => Self::DisplayThresholds,
            4 => Self::DisplayTimecode,
            5 => Self::CameraSpec,
            6 => Self::SwitcherStatus,
            7 => Self::DisplayParameters,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaParameter {
    Codec = 0,
    TransportMode = 1,
}

impl MediaParameter {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Codec,
            1 => Self::TransportMode,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataParameter {
    Reel = 0,
    SceneTags = 1,
    Scene = 2,
    Take = 3,
    GoodTake = 4,
    CameraId = 5,
    CameraOperator = 6,
    Director = 7,
    ProjectName = 8,
    LensType = 9,
    LensIris = 10,
    LensFocalLength = 11,
    LensDistance = 12,
    LensFilter = 13,
    SlateForType = 14,
    SlateForName = 15,
}

impl MetadataParameter {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Reel,
            1 => Self::SceneTags,
            2 => Self::Scene,
            3 => Self::Take,
            4 => Self::GoodTake,
            5 => Self::CameraId,
            6 => Self::CameraOperator,
            7 => Self::Director,
            8 => Self::ProjectName,
            9 => Self::LensType,
            10 => Self::LensIris,
            11 => Self::LensFocalLength,
            12 => Self::LensDistance,
            13 => Self::LensFilter,
            14 => Self::SlateForType,
            15 => Self::SlateForName,
            _ => return None,
        })
    }

    /// Longest string the camera stores for a string-valued parameter.
    pub fn max_string_length(&self) -> Option<usize> {
        Some(match self {
            Self::Scene => 5,
            Self::CameraId => 1,
            Self::CameraOperator | Self::Director | Self::ProjectName => 29,
            Self::LensType => 56,
            Self::LensIris => 20,
            Self::LensFocalLength | Self::LensFilter | Self::SlateForName => 30,
            Self::LensDistance => 50,
            _ => return None,
        })
    }
}
