use log::{debug, warn};
use thiserror::Error;

use crate::{
    Category, LensParameter, MediaParameter, MetadataParameter, StatusParameter, VideoParameter,
    frame::Command,
    model::CameraModel,
    primitives::{
        NO_LENS_APERTURE, aperture_to_fstop, fixed_to_percent, read_i8s, read_i16s, read_i32s,
        read_string,
    },
    types::{
        ApertureUnits, AutoExposureMode, BatteryStatus, CodecInfo, DayNight, LocationType,
        MediaStatus, RecordingFormat, RemainingTime, SceneTag, SelectedLut, SlateForType, TakeTag,
        TransportInfo, WhiteBalance,
    },
};

/// Received sensor gain values are in units of this many ISO.
pub const RECEIVED_SENSOR_GAIN_BASE: i32 = 200;

/// A notification from the camera, decoded into typed values.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Aperture {
        /// `None` when no lens is attached.
        fstop: Option<f64>,
        units: Option<ApertureUnits>,
    },
    ApertureNormalised {
        percent: i32,
    },
    FocalLength {
        mm: i16,
    },
    ImageStabilisation(bool),
    SensorGain {
        iso: i32,
    },
    WhiteBalance(WhiteBalance),
    Exposure {
        microseconds: i32,
    },
    RecordingFormat(RecordingFormat),
    AutoExposureMode(AutoExposureMode),
    ShutterAngle {
        angle_x100: i32,
    },
    ShutterSpeed {
        denominator: i32,
    },
    Gain {
        db: i8,
    },
    Iso(i32),
    DisplayLut {
        lut: SelectedLut,
        enabled: bool,
    },
    Battery(BatteryStatus),
    CameraModel(CameraModel),
    MediaStatus(Vec<MediaStatus>),
    RemainingRecordTime(Vec<RemainingTime>),
    Codec(CodecInfo),
    Transport(TransportInfo),
    Reel(i16),
    SceneTags {
        scene: SceneTag,
        location: LocationType,
        time: DayNight,
    },
    Take {
        number: i8,
        tag: TakeTag,
    },
    GoodTake(bool),
    SlateFor(SlateForType),
    /// Any of the free-text metadata fields.
    MetadataText {
        parameter: MetadataParameter,
        text: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePayloadError {
    #[error("No decoder for {category} parameter {parameter}")]
    Unsupported { category: Category, parameter: u8 },
    #[error("Payload is too small for {category} parameter {parameter}")]
    PayloadTooSmall { category: Category, parameter: u8 },
    #[error("Unknown {field} value: {value}")]
    UnknownValue { field: &'static str, value: i64 },
}

fn unsupported(command: &Command) -> ParsePayloadError {
    ParsePayloadError::Unsupported {
        category: command.category,
        parameter: command.parameter,
    }
}

fn too_small(command: &Command) -> ParsePayloadError {
    ParsePayloadError::PayloadTooSmall {
        category: command.category,
        parameter: command.parameter,
    }
}

fn unknown(field: &'static str, value: impl Into<i64>) -> ParsePayloadError {
    ParsePayloadError::UnknownValue {
        field,
        value: value.into(),
    }
}

/// Decodes the payload of an incoming command into a [`Payload`].
pub fn parse_payload(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    match command.category {
        Category::Lens => parse_lens(command),
        Category::Video => parse_video(command),
        Category::Status => parse_status(command),
        Category::Media => parse_media(command),
        Category::Metadata => parse_metadata(command),
        _ => Err(unsupported(command)),
    }
}

fn parse_lens(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    let parameter =
        LensParameter::from_byte(command.parameter).ok_or_else(|| unsupported(command))?;
    let data = command.payload.as_slice();
    let values = read_i16s(data);
    let first = values.first().copied().ok_or_else(|| too_small(command));

    Ok(match parameter {
        LensParameter::ApertureFstop => {
            let aperture = first?;
            let units = values
                .get(1)
                .map(|units| {
                    ApertureUnits::from_byte(*units as u8)
                        .ok_or_else(|| unknown("aperture units", *units))
                })
                .transpose()?;
            Payload::Aperture {
                fstop: (aperture != NO_LENS_APERTURE).then(|| aperture_to_fstop(aperture)),
                units,
            }
        }
        LensParameter::ApertureNormalised => Payload::ApertureNormalised {
            percent: fixed_to_percent(first?),
        },
        LensParameter::Zoom => Payload::FocalLength { mm: first? },
        LensParameter::ImageStabilisation => {
            Payload::ImageStabilisation(*data.first().ok_or_else(|| too_small(command))? != 0)
        }
        _ => return Err(unsupported(command)),
    })
}

fn parse_video(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    let parameter =
        VideoParameter::from_byte(command.parameter).ok_or_else(|| unsupported(command))?;
    let data = command.payload.as_slice();
    let byte = data.first().copied().ok_or_else(|| too_small(command));
    let int32 = read_i32s(data)
        .first()
        .copied()
        .ok_or_else(|| too_small(command));

    Ok(match parameter {
        VideoParameter::SensorGain => Payload::SensorGain {
            iso: byte? as i8 as i32 * RECEIVED_SENSOR_GAIN_BASE,
        },
        VideoParameter::ManualWhiteBalance => Payload::WhiteBalance(
            WhiteBalance::from_bytes(data).ok_or_else(|| too_small(command))?,
        ),
        VideoParameter::Exposure => Payload::Exposure {
            microseconds: int32?,
        },
        VideoParameter::RecordingFormat => Payload::RecordingFormat(
            RecordingFormat::from_bytes(data).ok_or_else(|| too_small(command))?,
        ),
        VideoParameter::AutoExposureMode => {
            let mode = byte?;
            Payload::AutoExposureMode(
                AutoExposureMode::from_byte(mode)
                    .ok_or_else(|| unknown("auto exposure mode", mode))?,
            )
        }
        VideoParameter::ShutterAngle => Payload::ShutterAngle { angle_x100: int32? },
        VideoParameter::ShutterSpeed => Payload::ShutterSpeed {
            denominator: int32?,
        },
        VideoParameter::Gain => Payload::Gain { db: byte? as i8 },
        VideoParameter::Iso => Payload::Iso(int32?),
        VideoParameter::DisplayLut => {
            if data.len() < 2 {
                return Err(too_small(command));
            }
            Payload::DisplayLut {
                lut: SelectedLut::from_byte(data[0]).ok_or_else(|| unknown("LUT", data[0]))?,
                enabled: data[1] == 1,
            }
        }
        _ => return Err(unsupported(command)),
    })
}

fn parse_status(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    let parameter =
        StatusParameter::from_byte(command.parameter).ok_or_else(|| unsupported(command))?;
    let data = command.payload.as_slice();

    Ok(match parameter {
        StatusParameter::Battery => {
            Payload::Battery(BatteryStatus::from_bytes(data).ok_or_else(|| too_small(command))?)
        }
        StatusParameter::CameraSpec => {
            // byte 1 carries the model, the others are undocumented
            if data.len() < 4 {
                return Err(too_small(command));
            }
            let model = data[1];
            Payload::CameraModel(CameraModel::from_byte(model).unwrap_or_else(|| {
                warn!("unknown camera model {model}");
                CameraModel::Unknown
            }))
        }
        StatusParameter::MediaStatus => Payload::MediaStatus(
            read_i8s(data)
                .into_iter()
                .map(|status| {
                    MediaStatus::from_i8(status).ok_or_else(|| unknown("media status", status))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ),
        StatusParameter::RemainingRecordTime => Payload::RemainingRecordTime(
            read_i16s(data)
                .into_iter()
                .map(RemainingTime::from_wire)
                .collect(),
        ),
        _ => return Err(unsupported(command)),
    })
}

fn parse_media(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    let parameter =
        MediaParameter::from_byte(command.parameter).ok_or_else(|| unsupported(command))?;
    let data = command.payload.as_slice();

    Ok(match parameter {
        MediaParameter::Codec => {
            if data.len() < 2 {
                return Err(too_small(command));
            }
            Payload::Codec(CodecInfo::from_bytes(data).ok_or_else(|| unknown("codec", data[0]))?)
        }
        MediaParameter::TransportMode => {
            if data.len() < 3 {
                return Err(too_small(command));
            }
            Payload::Transport(
                TransportInfo::from_bytes(data).ok_or_else(|| unknown("transport mode", data[0]))?,
            )
        }
    })
}

fn parse_metadata(command: &Command) -> std::result::Result<Payload, ParsePayloadError> {
    let parameter =
        MetadataParameter::from_byte(command.parameter).ok_or_else(|| unsupported(command))?;
    let data = command.payload.as_slice();
    let byte = data.first().copied().ok_or_else(|| too_small(command));

    Ok(match parameter {
        MetadataParameter::Reel => Payload::Reel(
            read_i16s(data)
                .first()
                .copied()
                .ok_or_else(|| too_small(command))?,
        ),
        MetadataParameter::SceneTags => {
            if data.len() < 3 {
                return Err(too_small(command));
            }
            Payload::SceneTags {
                scene: SceneTag::from_i8(data[0] as i8)
                    .ok_or_else(|| unknown("scene tag", data[0] as i8))?,
                location: LocationType::from_byte(data[1])
                    .ok_or_else(|| unknown("location", data[1]))?,
                time: DayNight::from_byte(data[2]).ok_or_else(|| unknown("day/night", data[2]))?,
            }
        }
        MetadataParameter::Take => {
            if data.len() < 2 {
                return Err(too_small(command));
            }
            Payload::Take {
                number: data[0] as i8,
                tag: TakeTag::from_i8(data[1] as i8)
                    .ok_or_else(|| unknown("take tag", data[1] as i8))?,
            }
        }
        MetadataParameter::GoodTake => Payload::GoodTake(byte? != 0),
        MetadataParameter::SlateForType => {
            let slate = byte?;
            Payload::SlateFor(
                SlateForType::from_byte(slate).ok_or_else(|| unknown("slate type", slate))?,
            )
        }
        parameter => {
            let text = read_string(data);
            debug!("{parameter:?}: {text}");
            Payload::MetadataText { parameter, text }
        }
    })
}
