use log::debug;
use thiserror::Error;

use crate::{
    Category, DataType, LensParameter, MediaParameter, MetadataParameter, OperationType,
    PAYLOAD_SIZE_MAX, VideoParameter,
    frame::Command,
    primitives::{fixed_from_float, fixed_from_lens_position, fstop_to_aperture},
    types::{
        AutoExposureMode, CodecInfo, DayNight, LocationType, RecordingFormat, SceneTag,
        SelectedLut, SlateForType, TakeTag, TransportInfo, TransportMode, WhiteBalance,
    },
};

/// Sensor gain values are sent in units of this many ISO.
pub const SENT_SENSOR_GAIN_BASE: i32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("{parameter:?} accepts at most {max} bytes, got {len}")]
    StringTooLong {
        parameter: MetadataParameter,
        max: usize,
        len: usize,
    },
    #[error("{parameter:?} is not a string parameter")]
    NotAString { parameter: MetadataParameter },
    #[error("White balance {kelvin}K tint {tint} is out of range")]
    WhiteBalanceOutOfRange { kelvin: i16, tint: i16 },
    #[error("Lens position {position} is outside 0..=65435")]
    LensPositionOutOfRange { position: i32 },
    #[error("Sensor gain ISO {iso} is outside 0..=12799")]
    SensorGainOutOfRange { iso: i32 },
}

/// A command without payload, e.g. a trigger such as autofocus.
pub fn void(category: Category, parameter: u8) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Void,
        OperationType::Assign,
        vec![],
    )
}

pub fn boolean(category: Category, parameter: u8, value: bool) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Void,
        OperationType::Assign,
        vec![value as u8],
    )
}

pub fn int8(category: Category, parameter: u8, values: &[i8]) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Int8,
        OperationType::Assign,
        values.iter().map(|v| *v as u8).collect(),
    )
}

pub fn int16(category: Category, parameter: u8, values: &[i16]) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Int16,
        OperationType::Assign,
        values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    )
}

pub fn int32(category: Category, parameter: u8, value: i32) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Int32,
        OperationType::Assign,
        value.to_le_bytes().to_vec(),
    )
}

pub fn int64(category: Category, parameter: u8, value: i64) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Int64,
        OperationType::Assign,
        value.to_le_bytes().to_vec(),
    )
}

pub fn fixed16(
    category: Category,
    parameter: u8,
    value: i16,
    operation: OperationType,
) -> Command {
    Command::new(
        category,
        parameter,
        DataType::Fixed16,
        operation,
        value.to_le_bytes().to_vec(),
    )
}

/// Values longer than [`PAYLOAD_SIZE_MAX`] bytes are cut after the last
/// whole character that fits.
pub fn string(category: Category, parameter: u8, value: &str) -> Command {
    let mut end = value.len().min(PAYLOAD_SIZE_MAX);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    if end < value.len() {
        debug!("Truncating {category:?} string to {end} bytes");
    }
    let payload = value[..end].as_bytes().to_vec();
    Command::new(
        category,
        parameter,
        DataType::String,
        OperationType::Assign,
        payload,
    )
}

pub fn white_balance(white_balance: WhiteBalance) -> std::result::Result<Command, BuildError> {
    if !white_balance.is_in_range() {
        return Err(BuildError::WhiteBalanceOutOfRange {
            kelvin: white_balance.kelvin,
            tint: white_balance.tint,
        });
    }
    Ok(Command::new(
        Category::Video,
        VideoParameter::ManualWhiteBalance as u8,
        DataType::Int16,
        OperationType::Assign,
        white_balance.to_bytes(),
    ))
}

pub fn auto_white_balance() -> Command {
    void(Category::Video, VideoParameter::SetAutoWhiteBalance as u8)
}

pub fn restore_auto_white_balance() -> Command {
    void(Category::Video, VideoParameter::RestoreAutoWhiteBalance as u8)
}

pub fn recording_format(format: &RecordingFormat) -> Command {
    Command::new(
        Category::Video,
        VideoParameter::RecordingFormat as u8,
        DataType::Int16,
        OperationType::Assign,
        format.to_bytes(),
    )
}

/// `iso_gain` is the gain expressed as ISO (e.g. 400). It is divided by
/// [`SENT_SENSOR_GAIN_BASE`] with truncation, so 450 is sent as 4. The
/// result must fit the signed byte on the wire.
pub fn sensor_gain(iso_gain: i32) -> std::result::Result<Command, BuildError> {
    let units = i8::try_from(iso_gain / SENT_SENSOR_GAIN_BASE)
        .ok()
        .filter(|units| *units >= 0)
        .ok_or(BuildError::SensorGainOutOfRange { iso: iso_gain })?;
    Ok(int8(
        Category::Video,
        VideoParameter::SensorGain as u8,
        &[units],
    ))
}

pub fn iso(iso: i32) -> Command {
    int32(Category::Video, VideoParameter::Iso as u8, iso)
}

pub fn gain_db(db: i8) -> Command {
    int8(Category::Video, VideoParameter::Gain as u8, &[db])
}

/// Shutter angle in hundredths of a degree, 180° = 18000.
pub fn shutter_angle(angle_x100: i32) -> Command {
    int32(Category::Video, VideoParameter::ShutterAngle as u8, angle_x100)
}

/// Shutter speed as the denominator of 1/x seconds.
pub fn shutter_speed(denominator: i32) -> Command {
    int32(Category::Video, VideoParameter::ShutterSpeed as u8, denominator)
}

pub fn auto_exposure_mode(mode: AutoExposureMode) -> Command {
    int8(
        Category::Video,
        VideoParameter::AutoExposureMode as u8,
        &[mode as i8],
    )
}

pub fn display_lut(lut: SelectedLut, enabled: bool) -> Command {
    int8(
        Category::Video,
        VideoParameter::DisplayLut as u8,
        &[lut as i8, enabled as i8],
    )
}

fn lens_position(position: i32) -> std::result::Result<i16, BuildError> {
    if !(0..=65435).contains(&position) {
        return Err(BuildError::LensPositionOutOfRange { position });
    }
    Ok(fixed_from_lens_position(position))
}

/// Iris as an integer lens position in `0..=65435`, sent normalised as fixed16.
pub fn iris(position: i32) -> std::result::Result<Command, BuildError> {
    Ok(fixed16(
        Category::Lens,
        LensParameter::ApertureFstop as u8,
        lens_position(position)?,
        OperationType::Assign,
    ))
}

/// Iris as an f-stop, sent as the camera's aperture number.
pub fn iris_fstop(fstop: f64) -> Command {
    fixed16(
        Category::Lens,
        LensParameter::ApertureFstop as u8,
        fstop_to_aperture(fstop),
        OperationType::Assign,
    )
}

/// Aperture in `0.0..=1.0`, fully closed to fully open.
pub fn aperture_normalised(value: f64) -> Command {
    fixed16(
        Category::Lens,
        LensParameter::ApertureNormalised as u8,
        fixed_from_float(value),
        OperationType::Assign,
    )
}

/// Focus in `0.0..=1.0`, near to far.
pub fn focus_normalised(value: f64) -> Command {
    fixed16(
        Category::Lens,
        LensParameter::Focus as u8,
        fixed_from_float(value),
        OperationType::Assign,
    )
}

/// Focus as an integer lens position. With [`OperationType::Offset`] the
/// camera adds the value to its current focus.
pub fn focus_position(
    position: i32,
    operation: OperationType,
) -> std::result::Result<Command, BuildError> {
    Ok(fixed16(
        Category::Lens,
        LensParameter::Focus as u8,
        lens_position(position)?,
        operation,
    ))
}

pub fn autofocus() -> Command {
    void(Category::Lens, LensParameter::AutoFocus as u8)
}

pub fn zoom_mm(focal_length_mm: i16) -> Command {
    int16(Category::Lens, LensParameter::Zoom as u8, &[focal_length_mm])
}

pub fn zoom_normalised(value: f64) -> Command {
    fixed16(
        Category::Lens,
        LensParameter::ZoomNormalised as u8,
        fixed_from_float(value),
        OperationType::Assign,
    )
}

pub fn image_stabilisation(enabled: bool) -> Command {
    boolean(
        Category::Lens,
        LensParameter::ImageStabilisation as u8,
        enabled,
    )
}

pub fn transport(info: &TransportInfo) -> Command {
    Command::new(
        Category::Media,
        MediaParameter::TransportMode as u8,
        DataType::Int8,
        OperationType::Assign,
        info.to_bytes(),
    )
}

/// Switches the transport into `mode`, keeping speed, flags and slots of `current`.
pub fn transport_mode(current: &TransportInfo, mode: TransportMode) -> Command {
    transport(&TransportInfo {
        mode,
        ..current.clone()
    })
}

pub fn codec(codec: CodecInfo) -> Command {
    Command::new(
        Category::Media,
        MediaParameter::Codec as u8,
        DataType::Int8,
        OperationType::Assign,
        codec.to_bytes(),
    )
}

/// A string-valued metadata field, checked against the camera's length limit.
pub fn metadata_string(
    parameter: MetadataParameter,
    value: &str,
) -> std::result::Result<Command, BuildError> {
    let max = parameter
        .max_string_length()
        .ok_or(BuildError::NotAString { parameter })?;
    if value.len() > max {
        return Err(BuildError::StringTooLong {
            parameter,
            max,
            len: value.len(),
        });
    }
    Ok(string(Category::Metadata, parameter as u8, value))
}

pub fn scene_tags(scene: SceneTag, location: LocationType, time: DayNight) -> Command {
    int8(
        Category::Metadata,
        MetadataParameter::SceneTags as u8,
        &[scene as i8, location as i8, time as i8],
    )
}

pub fn take(number: i8, tag: TakeTag) -> Command {
    int8(
        Category::Metadata,
        MetadataParameter::Take as u8,
        &[number, tag as i8],
    )
}

pub fn good_take(good: bool) -> Command {
    boolean(Category::Metadata, MetadataParameter::GoodTake as u8, good)
}

pub fn reel(number: i16) -> Command {
    int16(Category::Metadata, MetadataParameter::Reel as u8, &[number])
}

pub fn slate_for(slate: SlateForType) -> Command {
    int8(
        Category::Metadata,
        MetadataParameter::SlateForType as u8,
        &[slate as i8],
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        frame::encode,
        types::{ActiveStorageMedium, BasicCodec, TransportSlot},
        validate::validate,
    };

    #[test]
    fn iris_512() {
        let command = iris(512).unwrap();
        assert_eq!(command.category, Category::Lens);
        assert_eq!(command.parameter, LensParameter::ApertureFstop as u8);
        assert_eq!(command.data_type, DataType::Fixed16);
        assert_eq!(command.payload, fixed_from_float(512.0 / 65435.0).to_le_bytes());
        let bytes = encode(&command);
        assert_eq!(
            bytes,
            [0xff, 0x06, 0x00, 0x00, 0x00, 0x02, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00]
        );
        assert_eq!(validate(&bytes), Ok(()));
    }

    #[test]
    fn iris_out_of_range() {
        assert_eq!(
            iris(70000),
            Err(BuildError::LensPositionOutOfRange { position: 70000 })
        );
    }

    #[test]
    fn sensor_gain_truncates() {
        assert_eq!(sensor_gain(400).unwrap().payload, [4]);
        assert_eq!(sensor_gain(450).unwrap().payload, [4]);
        assert_eq!(sensor_gain(1600).unwrap().payload, [16]);
        assert_eq!(sensor_gain(12799).unwrap().payload, [127]);
    }

    #[test]
    fn sensor_gain_outside_a_byte() {
        assert_eq!(
            sensor_gain(12800),
            Err(BuildError::SensorGainOutOfRange { iso: 12800 })
        );
        assert_eq!(
            sensor_gain(25600),
            Err(BuildError::SensorGainOutOfRange { iso: 25600 })
        );
        assert_eq!(
            sensor_gain(-100),
            Err(BuildError::SensorGainOutOfRange { iso: -100 })
        );
    }

    #[test]
    fn white_balance_bounds() {
        let command = white_balance(WhiteBalance {
            kelvin: 5600,
            tint: 10,
        })
        .unwrap();
        assert_eq!(command.payload, [0xe0, 0x15, 0x0a, 0x00]);
        assert!(
            white_balance(WhiteBalance {
                kelvin: 12000,
                tint: 0
            })
            .is_err()
        );
        assert!(
            white_balance(WhiteBalance {
                kelvin: 5600,
                tint: -51
            })
            .is_err()
        );
    }

    #[test]
    fn focus_offset_operation() {
        let command = focus_position(65435, OperationType::Offset).unwrap();
        assert_eq!(command.operation, OperationType::Offset);
        assert_eq!(command.payload, 2048i16.to_le_bytes());
    }

    #[test]
    fn shutter_angle_180() {
        let bytes = encode(&shutter_angle(18000));
        assert_eq!(
            bytes,
            [0xff, 0x08, 0x00, 0x00, 0x01, 0x0b, 0x03, 0x00, 0x50, 0x46, 0x00, 0x00]
        );
    }

    #[test]
    fn record_keeps_slots() {
        let preview = TransportInfo {
            mode: TransportMode::Preview,
            speed: 0,
            loop_playback: false,
            play_all: false,
            timelapse_recording: false,
            slots: vec![TransportSlot {
                active: true,
                medium: ActiveStorageMedium::SdCard,
            }],
        };
        let command = transport_mode(&preview, TransportMode::Record);
        assert_eq!(command.payload, [2, 0, 0x20, 1]);
    }

    #[test]
    fn codec_payload() {
        let command = codec(CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_Q0));
        assert_eq!(command.payload, [3, 0]);
    }

    #[test]
    fn metadata_limits() {
        let command = metadata_string(MetadataParameter::Scene, "12A").unwrap();
        assert_eq!(command.data_type, DataType::String);
        assert_eq!(command.payload, b"12A");
        assert_eq!(
            metadata_string(MetadataParameter::CameraId, "AB"),
            Err(BuildError::StringTooLong {
                parameter: MetadataParameter::CameraId,
                max: 1,
                len: 2
            })
        );
        assert_eq!(
            metadata_string(MetadataParameter::Take, "1"),
            Err(BuildError::NotAString {
                parameter: MetadataParameter::Take
            })
        );
        let lens_type = "x".repeat(56);
        let command = metadata_string(MetadataParameter::LensType, &lens_type).unwrap();
        assert!(validate(&encode(&command)).is_ok());
    }

    #[test]
    fn long_string_keeps_whole_characters() {
        let command = string(Category::Metadata, 0, &"é".repeat(30));
        assert_eq!(command.payload.len(), PAYLOAD_SIZE_MAX);
        assert_eq!(std::str::from_utf8(&command.payload), Ok("é".repeat(28).as_str()));

        let value = format!("{}é", "x".repeat(PAYLOAD_SIZE_MAX - 1));
        let command = string(Category::Metadata, 0, &value);
        assert_eq!(command.payload, "x".repeat(PAYLOAD_SIZE_MAX - 1).as_bytes());
        assert!(validate(&encode(&command)).is_ok());
    }

    #[test]
    fn scene_tags_payload() {
        let command = scene_tags(SceneTag::None, LocationType::Interior, DayNight::Day);
        assert_eq!(command.payload, [0xff, 1, 1]);
    }
}
