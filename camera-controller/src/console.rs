//! Operator commands typed on stdin, e.g. `iso 800`, `wb 5600 10` or `record`.

use std::{fmt::Write, str::FromStr};

use bmd_ccu::{
    MetadataParameter,
    types::{AutoExposureMode, BasicCodec, CodecInfo, SelectedLut, TakeTag},
};
use thiserror::Error;

use crate::{
    camera::CameraState,
    connection::{ConnectionStatus, WriteError},
    packet_writer::PacketWriter,
    reported::Reported,
    transport::Transport,
};

pub const HELP: &str = "\
status                   show what the camera reported
record | stop            start or stop recording
iso <iso>                e.g. iso 800
gain <db>                sensor gain in dB
wb <kelvin> [tint]       manual white balance
wb auto | wb restore     auto white balance, or back to the last auto value
shutter <degrees>        shutter angle, e.g. shutter 172.8
speed <1/x>              shutter speed, e.g. speed 50
ae <manual|iris|shutter|iris+shutter|shutter+iris>
iris <f-stop>            e.g. iris 2.8
aperture <0..1>          normalised aperture
focus <0..1>             normalised focus
af                       trigger autofocus
zoom <mm>                focal length
ois <on|off>             image stabilisation
lut <none|custom|film|extended> [on|off]
codec <braw|prores> <variant>   e.g. codec braw 5:1, codec prores hq
reel <n> | take <n>      slate numbers
good <on|off>            mark the take as good
scene|project|director|operator|camera-id <text>
quit";

const COMMANDS: &[&str] = &[
    "record", "stop", "iso", "gain", "wb", "shutter", "speed", "ae", "iris", "aperture", "focus",
    "af", "zoom", "ois", "lut", "codec", "reel", "take", "good", "scene", "project", "director",
    "operator", "camera-id",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Unknown command `{0}`, try `help`")]
    UnknownCommand(String),
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("`{value}` is not a valid {argument} for `{command}`")]
    InvalidArgument {
        command: &'static str,
        argument: &'static str,
        value: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Help,
    Status,
    Quit,
    Camera(Setting),
}

/// A change the operator asked the camera to make.
#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    RecordStart,
    RecordStop,
    Iso(i32),
    GainDb(i8),
    WhiteBalance { kelvin: i16, tint: i16 },
    AutoWhiteBalance,
    RestoreAutoWhiteBalance,
    ShutterAngle(i32),
    ShutterSpeed(i32),
    AutoExposure(AutoExposureMode),
    Iris(f64),
    Aperture(f64),
    Focus(f64),
    AutoFocus,
    Zoom(i16),
    ImageStabilisation(bool),
    DisplayLut { lut: SelectedLut, enabled: bool },
    Codec(CodecInfo),
    Reel(i16),
    Take(i8),
    GoodTake(bool),
    Text { parameter: MetadataParameter, text: String },
}

impl Setting {
    pub async fn send<T: Transport>(
        self,
        writer: &PacketWriter<'_, T>,
    ) -> std::result::Result<(), WriteError> {
        match self {
            Self::RecordStart => writer.write_record_start().await,
            Self::RecordStop => writer.write_record_stop().await,
            Self::Iso(iso) => writer.write_iso(iso).await,
            Self::GainDb(db) => writer.write_gain_db(db).await,
            Self::WhiteBalance { kelvin, tint } => writer.write_white_balance(kelvin, tint).await,
            Self::AutoWhiteBalance => writer.write_auto_white_balance().await,
            Self::RestoreAutoWhiteBalance => writer.write_restore_auto_white_balance().await,
            Self::ShutterAngle(angle_x100) => writer.write_shutter_angle(angle_x100).await,
            Self::ShutterSpeed(denominator) => writer.write_shutter_speed(denominator).await,
            Self::AutoExposure(mode) => writer.write_auto_exposure_mode(mode).await,
            Self::Iris(fstop) => writer.write_iris_fstop(fstop).await,
            Self::Aperture(value) => writer.write_aperture_normalised(value).await,
            Self::Focus(value) => writer.write_focus(value).await,
            Self::AutoFocus => writer.write_autofocus().await,
            Self::Zoom(mm) => writer.write_zoom_mm(mm).await,
            Self::ImageStabilisation(on) => writer.write_image_stabilisation(on).await,
            Self::DisplayLut { lut, enabled } => writer.write_display_lut(lut, enabled).await,
            Self::Codec(codec) => writer.write_codec(codec).await,
            Self::Reel(reel) => writer.write_reel(reel).await,
            Self::Take(take) => writer.write_take(take, TakeTag::None).await,
            Self::GoodTake(good) => writer.write_good_take(good).await,
            Self::Text { parameter, text } => writer.write_metadata_text(parameter, &text).await,
        }
    }
}

struct Words<'a> {
    command: &'static str,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Words<'a> {
    fn next(&mut self, argument: &'static str) -> std::result::Result<&'a str, ConsoleError> {
        self.words.next().ok_or(ConsoleError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn invalid(&self, argument: &'static str, value: &str) -> ConsoleError {
        ConsoleError::InvalidArgument {
            command: self.command,
            argument,
            value: value.to_string(),
        }
    }

    fn parse<V: FromStr>(
        &mut self,
        argument: &'static str,
    ) -> std::result::Result<V, ConsoleError> {
        let word = self.next(argument)?;
        word.parse().map_err(|_| self.invalid(argument, word))
    }

    fn unit(&mut self, argument: &'static str) -> std::result::Result<f64, ConsoleError> {
        let word = self.next(argument)?;
        word.parse()
            .ok()
            .filter(|value| (0.0..=1.0).contains(value))
            .ok_or_else(|| self.invalid(argument, word))
    }

    fn switch(&mut self, argument: &'static str) -> std::result::Result<bool, ConsoleError> {
        let word = self.next(argument)?;
        match word {
            "on" | "yes" | "1" => Ok(true),
            "off" | "no" | "0" => Ok(false),
            _ => Err(self.invalid(argument, word)),
        }
    }

    fn rest(&mut self) -> String {
        self.words.by_ref().collect::<Vec<_>>().join(" ")
    }
}

fn codec(args: &mut Words) -> std::result::Result<CodecInfo, ConsoleError> {
    let family = args.next("codec family")?;
    let (basic_codec, variants) = match family.to_ascii_lowercase().as_str() {
        "braw" => (BasicCodec::Braw, 0..=CodecInfo::BRAW_Q3),
        "prores" => (BasicCodec::ProRes, 0..=CodecInfo::PRORES_444XQ),
        _ => return Err(args.invalid("codec family", family)),
    };
    let variant = args.next("codec variant")?;
    variants
        .map(|v| CodecInfo::new(basic_codec, v))
        .find(|codec| {
            codec
                .variant_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(variant))
        })
        .ok_or_else(|| args.invalid("codec variant", variant))
}

pub fn parse(line: &str) -> std::result::Result<Intent, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(Intent::Help);
    };
    match word {
        "help" | "?" => return Ok(Intent::Help),
        "status" => return Ok(Intent::Status),
        "quit" | "exit" => return Ok(Intent::Quit),
        _ => {}
    }
    let command = COMMANDS
        .iter()
        .copied()
        .find(|command| *command == word)
        .ok_or_else(|| ConsoleError::UnknownCommand(word.to_string()))?;
    let mut args = Words { command, words };

    let setting = match command {
        "record" => Setting::RecordStart,
        "stop" => Setting::RecordStop,
        "iso" => Setting::Iso(args.parse("ISO")?),
        "gain" => Setting::GainDb(args.parse("gain")?),
        "wb" => match args.next("kelvin")? {
            "auto" => Setting::AutoWhiteBalance,
            "restore" => Setting::RestoreAutoWhiteBalance,
            kelvin => Setting::WhiteBalance {
                kelvin: kelvin.parse().map_err(|_| args.invalid("kelvin", kelvin))?,
                tint: match args.words.next() {
                    Some(tint) => tint.parse().map_err(|_| args.invalid("tint", tint))?,
                    None => 0,
                },
            },
        },
        "shutter" => {
            let degrees: f64 = args.parse("angle")?;
            Setting::ShutterAngle((degrees * 100.0).round() as i32)
        }
        "speed" => Setting::ShutterSpeed(args.parse("shutter speed")?),
        "ae" => {
            let word = args.next("mode")?;
            Setting::AutoExposure(match word {
                "manual" => AutoExposureMode::Manual,
                "iris" => AutoExposureMode::Iris,
                "shutter" => AutoExposureMode::Shutter,
                "iris+shutter" => AutoExposureMode::IrisAndShutter,
                "shutter+iris" => AutoExposureMode::ShutterAndIris,
                _ => return Err(args.invalid("mode", word)),
            })
        }
        "iris" => Setting::Iris(args.parse("f-stop")?),
        "aperture" => Setting::Aperture(args.unit("aperture")?),
        "focus" => Setting::Focus(args.unit("focus")?),
        "af" => Setting::AutoFocus,
        "zoom" => Setting::Zoom(args.parse("focal length")?),
        "ois" => Setting::ImageStabilisation(args.switch("on/off")?),
        "lut" => {
            let word = args.next("LUT")?;
            let lut = match word {
                "none" => SelectedLut::None,
                "custom" => SelectedLut::Custom,
                "film" => SelectedLut::FilmToVideo,
                "extended" => SelectedLut::FilmToExtendedVideo,
                _ => return Err(args.invalid("LUT", word)),
            };
            let enabled = match args.words.clone().next() {
                Some(_) => args.switch("on/off")?,
                None => lut != SelectedLut::None,
            };
            Setting::DisplayLut { lut, enabled }
        }
        "codec" => Setting::Codec(codec(&mut args)?),
        "reel" => Setting::Reel(args.parse("reel number")?),
        "take" => Setting::Take(args.parse("take number")?),
        "good" => Setting::GoodTake(args.switch("on/off")?),
        _ => {
            let parameter = match command {
                "scene" => MetadataParameter::Scene,
                "project" => MetadataParameter::ProjectName,
                "director" => MetadataParameter::Director,
                "operator" => MetadataParameter::CameraOperator,
                _ => MetadataParameter::CameraId,
            };
            let text = args.rest();
            if text.is_empty() {
                return Err(ConsoleError::MissingArgument {
                    command,
                    argument: "text",
                });
            }
            Setting::Text { parameter, text }
        }
    };
    Ok(Intent::Camera(setting))
}

fn show<T: std::fmt::Display>(cell: &Reported<T>) -> String {
    match cell.as_option() {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

/// Multi-line summary of the camera for the `status` command.
pub fn describe(status: ConnectionStatus, state: &CameraState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "link:       {status:?}");
    let _ = writeln!(out, "camera:     {}", show(&state.model_name));
    let _ = writeln!(
        out,
        "recording:  {}{}",
        if state.is_recording() { "yes" } else { "no" },
        if state.has_record_error() {
            " (record error)"
        } else {
            ""
        }
    );
    let _ = writeln!(out, "timecode:   {}", show(&state.timecode));
    let _ = writeln!(out, "iso:        {}", show(&state.iso));
    let shutter = match (state.shutter_angle.as_option(), state.shutter_speed.as_option()) {
        (Some(angle), _) => format!("{:.1}°", *angle as f64 / 100.0),
        (None, Some(speed)) => format!("1/{speed}"),
        (None, None) => "-".to_string(),
    };
    let _ = writeln!(out, "shutter:    {shutter}");
    let _ = writeln!(
        out,
        "wb:         {}K tint {}",
        show(&state.white_balance),
        show(&state.tint)
    );
    let iris = match state.has_lens.as_option() {
        Some(false) => "no lens".to_string(),
        _ => show(&state.aperture_fstop_label),
    };
    let _ = writeln!(out, "iris:       {iris}");
    let _ = writeln!(out, "codec:      {}", show(&state.codec));
    if let Some(format) = state.recording_format.as_option() {
        let _ = writeln!(
            out,
            "format:     {}x{} {}p",
            format.width,
            format.height,
            format.frame_rate_label()
        );
    }
    if let Some(battery) = state.battery.as_option() {
        let _ = writeln!(
            out,
            "battery:    {}% {:.2}V",
            battery.percent,
            battery.voltage_mv as f64 / 1000.0
        );
    }
    for (i, slot) in state.media_slots.iter().enumerate() {
        let _ = writeln!(
            out,
            "slot {}:     {}{} {:?} {}",
            i + 1,
            slot.medium.as_str(),
            if slot.active { "*" } else { "" },
            slot.status,
            slot.remaining_record_time_label
        );
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::connection::test::{FakeTransport, connected};
    use bmd_ccu::{payload::Payload, types::MediaStatus};

    #[test]
    fn parses_settings() {
        assert_eq!(parse("iso 800"), Ok(Intent::Camera(Setting::Iso(800))));
        assert_eq!(
            parse("wb 5600 10"),
            Ok(Intent::Camera(Setting::WhiteBalance {
                kelvin: 5600,
                tint: 10
            }))
        );
        assert_eq!(
            parse("wb 3200"),
            Ok(Intent::Camera(Setting::WhiteBalance {
                kelvin: 3200,
                tint: 0
            }))
        );
        assert_eq!(parse("wb auto"), Ok(Intent::Camera(Setting::AutoWhiteBalance)));
        assert_eq!(
            parse("shutter 172.8"),
            Ok(Intent::Camera(Setting::ShutterAngle(17280)))
        );
        assert_eq!(parse("iris 2.8"), Ok(Intent::Camera(Setting::Iris(2.8))));
        assert_eq!(parse("  record "), Ok(Intent::Camera(Setting::RecordStart)));
        assert_eq!(
            parse("codec braw 5:1"),
            Ok(Intent::Camera(Setting::Codec(CodecInfo::new(
                BasicCodec::Braw,
                CodecInfo::BRAW_5_1
            ))))
        );
        assert_eq!(
            parse("lut film"),
            Ok(Intent::Camera(Setting::DisplayLut {
                lut: SelectedLut::FilmToVideo,
                enabled: true
            }))
        );
        assert_eq!(
            parse("scene 12A"),
            Ok(Intent::Camera(Setting::Text {
                parameter: MetadataParameter::Scene,
                text: "12A".to_string()
            }))
        );
        assert_eq!(parse("status"), Ok(Intent::Status));
        assert_eq!(parse(""), Ok(Intent::Help));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(
            parse("zoomies"),
            Err(ConsoleError::UnknownCommand("zoomies".to_string()))
        );
        assert_eq!(
            parse("iso"),
            Err(ConsoleError::MissingArgument {
                command: "iso",
                argument: "ISO"
            })
        );
        assert_eq!(
            parse("focus 2"),
            Err(ConsoleError::InvalidArgument {
                command: "focus",
                argument: "focus",
                value: "2".to_string()
            })
        );
        assert!(parse("codec prores 9:1").is_err());
        assert!(parse("ois maybe").is_err());
    }

    #[tokio::test]
    async fn settings_reach_the_camera() {
        let connection = connected(FakeTransport::default()).await;
        let Ok(Intent::Camera(setting)) = parse("iso 1250") else {
            panic!("not a setting");
        };
        setting.send(&connection.writer()).await.unwrap();
        let written = connection.transport().written.lock().clone();
        assert_eq!(
            written[0].1,
            vec![0xff, 0x08, 0x00, 0x00, 0x01, 0x0e, 0x03, 0x00, 0xe2, 0x04, 0x00, 0x00]
        );
    }

    #[test]
    fn describes_reported_values() {
        let mut state = CameraState::default();
        state.apply(Payload::Iso(800));
        state.apply(Payload::ShutterAngle { angle_x100: 18000 });
        state.apply(Payload::MediaStatus(vec![MediaStatus::Ready]));
        let text = describe(ConnectionStatus::Connected, &state);
        assert!(text.contains("link:       Connected"));
        assert!(text.contains("iso:        800"));
        assert!(text.contains("shutter:    180.0°"));
        assert!(text.contains("timecode:   -"));
        assert!(text.contains("slot 1:"));
    }
}
