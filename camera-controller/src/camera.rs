use std::sync::Arc;

use bmd_ccu::{
    MetadataParameter,
    model::CameraModel,
    payload::Payload,
    types::{
        ActiveStorageMedium, ApertureUnits, AutoExposureMode, BasicCodec, BatteryStatus,
        CameraStatusFlags, CodecInfo, DayNight, LocationType, MediaStatus, RecordingFormat,
        RemainingTime, SceneTag, SelectedLut, SlateForType, TakeTag, TransportInfo,
        TransportMode, TransportSlot,
    },
};
use log::debug;
use parking_lot::Mutex;

use crate::reported::Reported;

/// One recording media bay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaSlot {
    pub active: bool,
    pub medium: ActiveStorageMedium,
    pub status: MediaStatus,
    pub remaining_record_time_minutes: f32,
    pub remaining_record_time_label: String,
}

/// The most recent codec seen per family, so a UI can switch back to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LastKnownCodecs {
    pub braw_bitrate: Option<CodecInfo>,
    pub braw_quality: Option<CodecInfo>,
    pub prores: Option<CodecInfo>,
    pub braw_is_bitrate: bool,
}

macro_rules! camera_state {
    ($($(#[$doc:meta])* $field:ident: $ty:ty,)*) => {
        /// Shadow copy of everything the camera has reported.
        #[derive(Clone, Debug, Default)]
        pub struct CameraState {
            $($(#[$doc])* pub $field: Reported<$ty>,)*
            pub media_slots: Vec<MediaSlot>,
            pub last_known_codecs: LastKnownCodecs,
            revision: u64,
        }

        impl CameraState {
            pub const ATTRIBUTE_COUNT: usize = [$(stringify!($field),)*].len();

            /// Number of attributes the camera has reported so far.
            pub fn reported_count(&self) -> usize {
                [$(self.$field.has(),)*].into_iter().filter(|has| *has).count()
            }
        }
    };
}

camera_state! {
    has_lens: bool,
    aperture_units: ApertureUnits,
    aperture_fstop: f64,
    /// e.g. `f2.8`
    aperture_fstop_label: String,
    aperture_normalised_percent: i32,
    focal_length_mm: i16,
    image_stabilisation: bool,
    sensor_gain_iso: i32,
    white_balance: i16,
    tint: i16,
    exposure_us: i32,
    recording_format: RecordingFormat,
    auto_exposure_mode: AutoExposureMode,
    /// Hundredths of a degree.
    shutter_angle: i32,
    /// Denominator of 1/x seconds.
    shutter_speed: i32,
    sensor_gain_db: i8,
    iso: i32,
    selected_lut: SelectedLut,
    selected_lut_enabled: bool,
    battery: BatteryStatus,
    model: CameraModel,
    model_name: String,
    is_pocket: bool,
    codec: CodecInfo,
    transport_mode: TransportInfo,
    reel: i16,
    scene_name: String,
    scene_tag: SceneTag,
    location_type: LocationType,
    day_or_night: DayNight,
    take_number: i8,
    take_tag: TakeTag,
    good_take: bool,
    camera_id: String,
    camera_operator: String,
    director: String,
    project_name: String,
    slate_type: SlateForType,
    slate_name: String,
    lens_type: String,
    lens_iris: String,
    lens_focal_length: String,
    lens_distance: String,
    lens_filter: String,
    timecode: String,
    camera_status: CameraStatusFlags,
}

/// Grows `slots` to cover `incoming` and applies each entry positionally.
/// Slots beyond `incoming` are left as they are.
fn merge_slots<T>(
    slots: &mut Vec<MediaSlot>,
    incoming: &[T],
    apply: impl Fn(&mut MediaSlot, &T),
) {
    for (i, item) in incoming.iter().enumerate() {
        if slots.len() <= i {
            slots.push(MediaSlot::default());
        }
        apply(&mut slots[i], item);
    }
}

impl CameraState {
    /// Bumped on every change, so pollers can tell when to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn modified(&mut self) {
        self.revision += 1;
    }

    /// Forgets everything the camera reported.
    pub fn reset(&mut self) {
        let revision = self.revision;
        *self = Self::default();
        self.revision = revision + 1;
    }

    pub fn on_media_statuses(&mut self, statuses: &[MediaStatus]) {
        merge_slots(&mut self.media_slots, statuses, |slot, status| {
            slot.status = *status;
        });
        self.modified();
    }

    pub fn on_remaining_record_times(&mut self, times: &[RemainingTime]) {
        merge_slots(&mut self.media_slots, times, |slot, time| {
            slot.remaining_record_time_minutes = time.minutes();
            slot.remaining_record_time_label = time.label();
        });
        self.modified();
    }

    pub fn on_transport(&mut self, info: TransportInfo) {
        merge_slots(&mut self.media_slots, &info.slots, |slot, incoming: &TransportSlot| {
            slot.active = incoming.active;
            slot.medium = incoming.medium;
        });
        self.transport_mode.on_receive(info);
        self.modified();
    }

    pub fn on_codec(&mut self, codec: CodecInfo) {
        match codec.basic_codec {
            BasicCodec::Braw if codec.is_braw_bitrate() => {
                self.last_known_codecs.braw_bitrate = Some(codec);
                self.last_known_codecs.braw_is_bitrate = true;
            }
            BasicCodec::Braw => {
                self.last_known_codecs.braw_quality = Some(codec);
                self.last_known_codecs.braw_is_bitrate = false;
            }
            BasicCodec::ProRes => self.last_known_codecs.prores = Some(codec),
            _ => {}
        }
        self.codec.on_receive(codec);
        self.modified();
    }

    pub fn on_timecode(&mut self, timecode: String) {
        self.timecode.on_receive(timecode);
        self.modified();
    }

    pub fn on_camera_status(&mut self, status: CameraStatusFlags) {
        self.camera_status.on_receive(status);
        self.modified();
    }

    /// Stores a decoded notification.
    pub fn apply(&mut self, payload: Payload) {
        match payload {
            Payload::Aperture { fstop, units } => match fstop {
                None => self.has_lens.on_receive(false),
                Some(fstop) => {
                    self.has_lens.on_receive(true);
                    if let Some(units) = units {
                        self.aperture_units.on_receive(units);
                    }
                    let units = self
                        .aperture_units
                        .as_option()
                        .copied()
                        .unwrap_or(ApertureUnits::Fstops);
                    self.aperture_fstop.on_receive(fstop);
                    self.aperture_fstop_label
                        .on_receive(units.fstop_label(fstop));
                }
            },
            Payload::ApertureNormalised { percent } => {
                self.aperture_normalised_percent.on_receive(percent)
            }
            Payload::FocalLength { mm } => self.focal_length_mm.on_receive(mm),
            Payload::ImageStabilisation(on) => self.image_stabilisation.on_receive(on),
            Payload::SensorGain { iso } => self.sensor_gain_iso.on_receive(iso),
            Payload::WhiteBalance(wb) => {
                self.white_balance.on_receive(wb.kelvin);
                self.tint.on_receive(wb.tint);
            }
            Payload::Exposure { microseconds } => self.exposure_us.on_receive(microseconds),
            Payload::RecordingFormat(format) => self.recording_format.on_receive(format),
            Payload::AutoExposureMode(mode) => self.auto_exposure_mode.on_receive(mode),
            Payload::ShutterAngle { angle_x100 } => self.shutter_angle.on_receive(angle_x100),
            Payload::ShutterSpeed { denominator } => self.shutter_speed.on_receive(denominator),
            Payload::Gain { db } => self.sensor_gain_db.on_receive(db),
            Payload::Iso(iso) => self.iso.on_receive(iso),
            Payload::DisplayLut { lut, enabled } => {
                self.selected_lut.on_receive(lut);
                self.selected_lut_enabled.on_receive(enabled);
            }
            Payload::Battery(battery) => self.battery.on_receive(battery),
            Payload::CameraModel(model) => {
                self.model_name.on_receive(model.as_str().to_string());
                self.is_pocket.on_receive(model.is_pocket());
                self.model.on_receive(model);
            }
            Payload::MediaStatus(statuses) => return self.on_media_statuses(&statuses),
            Payload::RemainingRecordTime(times) => return self.on_remaining_record_times(&times),
            Payload::Codec(codec) => return self.on_codec(codec),
            Payload::Transport(info) => return self.on_transport(info),
            Payload::Reel(reel) => self.reel.on_receive(reel),
            Payload::SceneTags {
                scene,
                location,
                time,
            } => {
                self.scene_tag.on_receive(scene);
                self.location_type.on_receive(location);
                self.day_or_night.on_receive(time);
            }
            Payload::Take { number, tag } => {
                self.take_number.on_receive(number);
                self.take_tag.on_receive(tag);
            }
            Payload::GoodTake(good) => self.good_take.on_receive(good),
            Payload::SlateFor(slate) => self.slate_type.on_receive(slate),
            Payload::MetadataText { parameter, text } => {
                let cell = match parameter {
                    MetadataParameter::Scene => &mut self.scene_name,
                    MetadataParameter::CameraId => &mut self.camera_id,
                    MetadataParameter::CameraOperator => &mut self.camera_operator,
                    MetadataParameter::Director => &mut self.director,
                    MetadataParameter::ProjectName => &mut self.project_name,
                    MetadataParameter::LensType => &mut self.lens_type,
                    MetadataParameter::LensIris => &mut self.lens_iris,
                    MetadataParameter::LensFocalLength => &mut self.lens_focal_length,
                    MetadataParameter::LensDistance => &mut self.lens_distance,
                    MetadataParameter::LensFilter => &mut self.lens_filter,
                    MetadataParameter::SlateForName => &mut self.slate_name,
                    other => {
                        debug!("no text field for {other:?}");
                        return;
                    }
                };
                cell.on_receive(text);
            }
        }
        self.modified();
    }

    pub fn is_recording(&self) -> bool {
        self.transport_mode
            .as_option()
            .is_some_and(|info| info.mode == TransportMode::Record)
    }

    /// Index of the first slot the camera records to.
    pub fn active_media_slot(&self) -> Option<usize> {
        self.media_slots.iter().position(|slot| slot.active)
    }

    pub fn has_record_error(&self) -> bool {
        self.media_slots
            .iter()
            .any(|slot| slot.status == MediaStatus::RecordError)
    }
}

/// Shared handle to the camera state.
///
/// Notifications arrive on the transport's tasks while the control loop
/// reads; every access goes through the lock.
#[derive(Clone, Default)]
pub struct Camera {
    state: Arc<Mutex<CameraState>>,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&CameraState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut CameraState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn apply(&self, payload: Payload) {
        self.state.lock().apply(payload);
    }

    pub fn reset(&self) {
        self.state.lock().reset();
    }

    pub fn snapshot(&self) -> CameraState {
        self.state.lock().clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().revision()
    }

    pub fn media_slots(&self) -> Vec<MediaSlot> {
        self.state.lock().media_slots.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reported::NotSet;
    use bmd_ccu::types::WhiteBalance;

    fn transport(mode: TransportMode, slots: &[(bool, ActiveStorageMedium)]) -> TransportInfo {
        TransportInfo {
            mode,
            speed: 0,
            loop_playback: false,
            play_all: false,
            timelapse_recording: false,
            slots: slots
                .iter()
                .map(|(active, medium)| TransportSlot {
                    active: *active,
                    medium: *medium,
                })
                .collect(),
        }
    }

    macro_rules! cell_contract {
        ($($field:ident = $value:expr;)*) => {
            let mut state = CameraState::default();
            let mut checked = 0;
            $(
                assert!(!state.$field.has(), stringify!($field));
                assert_eq!(state.$field.get(), Err(NotSet), stringify!($field));
                state.$field.on_receive($value);
                assert!(state.$field.has(), stringify!($field));
                assert_eq!(state.$field.get(), Ok(&$value), stringify!($field));
                checked += 1;
            )*
            assert_eq!(checked, CameraState::ATTRIBUTE_COUNT);
            assert_eq!(state.reported_count(), CameraState::ATTRIBUTE_COUNT);

            state.media_slots.push(MediaSlot::default());
            state.reset();
            assert_eq!(state.reported_count(), 0);
            assert!(state.media_slots.is_empty());
            $(assert!(!state.$field.has(), stringify!($field));)*
        };
    }

    #[test]
    fn every_attribute_follows_the_cell_contract() {
        cell_contract! {
            has_lens = true;
            aperture_units = ApertureUnits::Tstops;
            aperture_fstop = 2.8;
            aperture_fstop_label = "T2.8".to_string();
            aperture_normalised_percent = 50;
            focal_length_mm = 35;
            image_stabilisation = true;
            sensor_gain_iso = 800;
            white_balance = 5600;
            tint = 10;
            exposure_us = 20000;
            recording_format = RecordingFormat {
                frame_rate: 24,
                width: 4096,
                height: 2160,
                ..Default::default()
            };
            auto_exposure_mode = AutoExposureMode::Shutter;
            shutter_angle = 18000;
            shutter_speed = 50;
            sensor_gain_db = 6;
            iso = 1250;
            selected_lut = SelectedLut::FilmToVideo;
            selected_lut_enabled = true;
            battery = BatteryStatus {
                voltage_mv: 7400,
                percent: 80,
                battery_present: true,
                ac_present: false,
                charging: false,
                percent_is_estimated: false,
                prefer_voltage_display: false,
            };
            model = CameraModel::PocketCinemaCamera6K;
            model_name = "Pocket Cinema Camera 6K".to_string();
            is_pocket = true;
            codec = CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_Q0);
            transport_mode = transport(TransportMode::Preview, &[]);
            reel = 3;
            scene_name = "12A".to_string();
            scene_tag = SceneTag::CloseUp;
            location_type = LocationType::Interior;
            day_or_night = DayNight::Night;
            take_number = 4;
            take_tag = TakeTag::PickUp;
            good_take = true;
            camera_id = "A".to_string();
            camera_operator = "Operator".to_string();
            director = "Director".to_string();
            project_name = "Project".to_string();
            slate_type = SlateForType::NextClip;
            slate_name = "A001".to_string();
            lens_type = "Canon EF-S 55-250mm f/4-5.6 IS".to_string();
            lens_iris = "f4".to_string();
            lens_focal_length = "65mm".to_string();
            lens_distance = "Inf".to_string();
            lens_filter = "ND 0.6".to_string();
            timecode = "01:00:00:00".to_string();
            camera_status = CameraStatusFlags {
                powered_on: true,
                ready: true,
            };
        }
    }

    #[test]
    fn slot_count_only_grows() {
        let mut state = CameraState::default();
        state.on_media_statuses(&[MediaStatus::Ready, MediaStatus::Ready]);
        state.on_remaining_record_times(&[RemainingTime::from_wire(750)]);
        state.on_transport(transport(
            TransportMode::Preview,
            &[
                (true, ActiveStorageMedium::SdCard),
                (false, ActiveStorageMedium::SdCard),
                (true, ActiveStorageMedium::Usb),
            ],
        ));

        assert_eq!(state.media_slots.len(), 3);
        assert_eq!(state.media_slots[0].status, MediaStatus::Ready);
        assert_eq!(state.media_slots[1].status, MediaStatus::Ready);
        assert_eq!(state.media_slots[0].remaining_record_time_minutes, 12.5);
        assert_eq!(state.media_slots[0].remaining_record_time_label, "12:30");
        assert_eq!(state.media_slots[2].status, MediaStatus::None);
        assert_eq!(state.media_slots[2].medium, ActiveStorageMedium::Usb);

        // a shorter update leaves the other slots alone
        state.on_media_statuses(&[MediaStatus::MountError]);
        assert_eq!(state.media_slots.len(), 3);
        assert_eq!(state.media_slots[0].status, MediaStatus::MountError);
        assert_eq!(state.media_slots[1].status, MediaStatus::Ready);
        assert!(state.media_slots[2].active);
        assert_eq!(state.active_media_slot(), Some(0));
    }

    #[test]
    fn media_status_then_remaining_time() {
        let camera = Camera::new();
        camera.apply(Payload::MediaStatus(vec![MediaStatus::Ready, MediaStatus::Ready]));
        camera.apply(Payload::RemainingRecordTime(vec![
            RemainingTime::from_wire(750),
            RemainingTime::from_wire(420),
        ]));

        let slots = camera.media_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].status, MediaStatus::Ready);
        assert_eq!(slots[0].remaining_record_time_minutes, 12.5);
        assert_eq!(slots[1].status, MediaStatus::Ready);
        assert_eq!(slots[1].remaining_record_time_minutes, 7.0);
        // no transport notification yet
        assert!(slots.iter().all(|slot| !slot.active));
        assert!(
            slots
                .iter()
                .all(|slot| slot.medium == ActiveStorageMedium::default())
        );
    }

    #[test]
    fn payloads_land_in_cells() {
        let mut state = CameraState::default();
        state.apply(Payload::WhiteBalance(WhiteBalance {
            kelvin: 3200,
            tint: -5,
        }));
        state.apply(Payload::Aperture {
            fstop: Some(2.8),
            units: None,
        });
        state.apply(Payload::CameraModel(CameraModel::PocketCinemaCamera4K));
        state.apply(Payload::MetadataText {
            parameter: MetadataParameter::LensDistance,
            text: "Inf".to_string(),
        });

        assert_eq!(state.white_balance.get(), Ok(&3200));
        assert_eq!(state.tint.get(), Ok(&-5));
        assert_eq!(state.has_lens.get(), Ok(&true));
        assert_eq!(state.aperture_fstop_label.get().map(String::as_str), Ok("f2.8"));
        assert_eq!(state.is_pocket.get(), Ok(&true));
        assert_eq!(
            state.model_name.get().map(String::as_str),
            Ok("Pocket Cinema Camera 4K")
        );
        assert_eq!(state.lens_distance.get().map(String::as_str), Ok("Inf"));

        state.apply(Payload::Aperture {
            fstop: None,
            units: None,
        });
        assert_eq!(state.has_lens.get(), Ok(&false));
    }

    #[test]
    fn recording_and_errors() {
        let mut state = CameraState::default();
        assert!(!state.is_recording());
        state.on_transport(transport(
            TransportMode::Record,
            &[(false, ActiveStorageMedium::SdCard), (true, ActiveStorageMedium::SdCard)],
        ));
        assert!(state.is_recording());
        assert_eq!(state.active_media_slot(), Some(1));
        assert!(!state.has_record_error());
        state.on_media_statuses(&[MediaStatus::Ready, MediaStatus::RecordError]);
        assert!(state.has_record_error());
    }

    #[test]
    fn last_known_codecs() {
        let mut state = CameraState::default();
        let bitrate = CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_5_1);
        let quality = CodecInfo::new(BasicCodec::Braw, CodecInfo::BRAW_Q3);
        let prores = CodecInfo::new(BasicCodec::ProRes, CodecInfo::PRORES_LT);
        state.on_codec(bitrate);
        assert!(state.last_known_codecs.braw_is_bitrate);
        state.on_codec(quality);
        state.on_codec(prores);

        assert_eq!(state.codec.get(), Ok(&prores));
        assert_eq!(state.last_known_codecs.braw_bitrate, Some(bitrate));
        assert_eq!(state.last_known_codecs.braw_quality, Some(quality));
        assert_eq!(state.last_known_codecs.prores, Some(prores));
        assert!(!state.last_known_codecs.braw_is_bitrate);
    }

    #[test]
    fn revision_tracks_changes() {
        let camera = Camera::new();
        let start = camera.revision();
        camera.apply(Payload::Iso(800));
        assert!(camera.revision() > start);
        let before_reset = camera.revision();
        camera.reset();
        assert!(camera.revision() > before_reset);
        assert!(!camera.read(|state| state.iso.has()));
    }
}
