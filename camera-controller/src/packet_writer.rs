use bmd_ccu::{
    MetadataParameter, OperationType,
    command,
    frame::Command,
    types::{
        AutoExposureMode, CodecInfo, DayNight, LocationType, RecordingFormat, SceneTag,
        SelectedLut, SlateForType, TakeTag, TransportInfo, TransportMode, WhiteBalance,
    },
};
use log::debug;

use crate::{
    connection::{CameraConnection, WriteError},
    transport::Transport,
};

type Result = std::result::Result<(), WriteError>;

/// Builds, validates and sends one command per camera setting.
pub struct PacketWriter<'a, T> {
    connection: &'a CameraConnection<T>,
}

impl<'a, T: Transport> PacketWriter<'a, T> {
    pub fn new(connection: &'a CameraConnection<T>) -> Self {
        Self { connection }
    }

    async fn send(&self, command: Command) -> Result {
        self.connection.send(&command).await
    }

    pub async fn write_white_balance(&self, kelvin: i16, tint: i16) -> Result {
        self.send(command::white_balance(WhiteBalance { kelvin, tint })?)
            .await
    }

    pub async fn write_auto_white_balance(&self) -> Result {
        self.send(command::auto_white_balance()).await
    }

    pub async fn write_restore_auto_white_balance(&self) -> Result {
        self.send(command::restore_auto_white_balance()).await
    }

    pub async fn write_recording_format(&self, format: &RecordingFormat) -> Result {
        self.send(command::recording_format(format)).await
    }

    /// Gain as ISO, truncated to the camera's gain unit.
    pub async fn write_sensor_gain(&self, iso_gain: i32) -> Result {
        self.send(command::sensor_gain(iso_gain)?).await
    }

    pub async fn write_iso(&self, iso: i32) -> Result {
        self.send(command::iso(iso)).await
    }

    pub async fn write_gain_db(&self, db: i8) -> Result {
        self.send(command::gain_db(db)).await
    }

    pub async fn write_shutter_angle(&self, angle_x100: i32) -> Result {
        self.send(command::shutter_angle(angle_x100)).await
    }

    pub async fn write_shutter_speed(&self, denominator: i32) -> Result {
        self.send(command::shutter_speed(denominator)).await
    }

    pub async fn write_auto_exposure_mode(&self, mode: AutoExposureMode) -> Result {
        self.send(command::auto_exposure_mode(mode)).await
    }

    pub async fn write_display_lut(&self, lut: SelectedLut, enabled: bool) -> Result {
        self.send(command::display_lut(lut, enabled)).await
    }

    /// Iris as a lens position in `0..=65435`.
    pub async fn write_iris(&self, position: i32) -> Result {
        self.send(command::iris(position)?).await
    }

    pub async fn write_iris_fstop(&self, fstop: f64) -> Result {
        self.send(command::iris_fstop(fstop)).await
    }

    pub async fn write_aperture_normalised(&self, value: f64) -> Result {
        self.send(command::aperture_normalised(value)).await
    }

    pub async fn write_focus(&self, value: f64) -> Result {
        self.send(command::focus_normalised(value)).await
    }

    pub async fn write_focus_position(&self, position: i32) -> Result {
        self.send(command::focus_position(position, OperationType::Assign)?)
            .await
    }

    pub async fn write_focus_offset(&self, offset: i32) -> Result {
        self.send(command::focus_position(offset, OperationType::Offset)?)
            .await
    }

    pub async fn write_autofocus(&self) -> Result {
        self.send(command::autofocus()).await
    }

    pub async fn write_zoom_mm(&self, focal_length_mm: i16) -> Result {
        self.send(command::zoom_mm(focal_length_mm)).await
    }

    pub async fn write_zoom_normalised(&self, value: f64) -> Result {
        self.send(command::zoom_normalised(value)).await
    }

    pub async fn write_image_stabilisation(&self, enabled: bool) -> Result {
        self.send(command::image_stabilisation(enabled)).await
    }

    pub async fn write_transport(&self, info: &TransportInfo) -> Result {
        self.send(command::transport(info)).await
    }

    /// Switches transport mode, keeping whatever else the camera last
    /// reported about its transport.
    pub async fn write_transport_mode(&self, mode: TransportMode) -> Result {
        let current = self
            .connection
            .camera()
            .read(|state| state.transport_mode.as_option().cloned())
            .unwrap_or_else(|| {
                debug!("Transport not reported yet, sending defaults");
                TransportInfo {
                    mode: TransportMode::Preview,
                    speed: 0,
                    loop_playback: false,
                    play_all: false,
                    timelapse_recording: false,
                    slots: Vec::new(),
                }
            });
        self.send(command::transport_mode(&current, mode)).await
    }

    pub async fn write_record_start(&self) -> Result {
        self.write_transport_mode(TransportMode::Record).await
    }

    pub async fn write_record_stop(&self) -> Result {
        self.write_transport_mode(TransportMode::Preview).await
    }

    pub async fn write_codec(&self, codec: CodecInfo) -> Result {
        self.send(command::codec(codec)).await
    }

    pub async fn write_metadata_text(&self, parameter: MetadataParameter, text: &str) -> Result {
        self.send(command::metadata_string(parameter, text)?).await
    }

    pub async fn write_scene_tags(
        &self,
        scene: SceneTag,
        location: LocationType,
        time: DayNight,
    ) -> Result {
        self.send(command::scene_tags(scene, location, time)).await
    }

    pub async fn write_take(&self, number: i8, tag: TakeTag) -> Result {
        self.send(command::take(number, tag)).await
    }

    pub async fn write_good_take(&self, good: bool) -> Result {
        self.send(command::good_take(good)).await
    }

    pub async fn write_reel(&self, number: i16) -> Result {
        self.send(command::reel(number)).await
    }

    pub async fn write_slate_for(&self, slate: SlateForType) -> Result {
        self.send(command::slate_for(slate)).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        connection::test::{FakeTransport, connected},
        transport::Characteristic,
    };
    use bmd_ccu::{
        command::BuildError,
        payload::Payload,
        types::{ActiveStorageMedium, TransportSlot},
    };

    fn written(connection: &CameraConnection<FakeTransport>) -> Vec<Vec<u8>> {
        connection
            .transport()
            .written
            .lock()
            .iter()
            .map(|(characteristic, bytes, with_response)| {
                assert_eq!(*characteristic, Characteristic::OutgoingCameraControl);
                assert!(*with_response);
                bytes.clone()
            })
            .collect()
    }

    #[tokio::test]
    async fn iris_512_reaches_the_transport() {
        let connection = connected(FakeTransport::default()).await;
        connection.writer().write_iris(512).await.unwrap();
        // Lens / aperture f-stop, fixed16 512 / 65435 * 2048 = 16
        assert_eq!(
            written(&connection),
            vec![vec![
                0xff, 0x06, 0x00, 0x00, 0x00, 0x02, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00
            ]]
        );
    }

    #[tokio::test]
    async fn white_balance_range_checked() {
        let connection = connected(FakeTransport::default()).await;
        let writer = connection.writer();
        assert!(matches!(
            writer.write_white_balance(12000, 0).await,
            Err(WriteError::Build(BuildError::WhiteBalanceOutOfRange { .. }))
        ));
        assert!(matches!(
            writer.write_white_balance(5600, 60).await,
            Err(WriteError::Build(_))
        ));
        writer.write_white_balance(5600, 10).await.unwrap();
        assert_eq!(
            written(&connection),
            vec![vec![
                0xff, 0x08, 0x00, 0x00, 0x01, 0x02, 0x02, 0x00, 0xe0, 0x15, 0x0a, 0x00
            ]]
        );
    }

    #[tokio::test]
    async fn sensor_gain_truncates() {
        let connection = connected(FakeTransport::default()).await;
        connection.writer().write_sensor_gain(450).await.unwrap();
        assert_eq!(
            written(&connection),
            vec![vec![0xff, 0x05, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00]]
        );
    }

    #[tokio::test]
    async fn sensor_gain_beyond_a_byte_is_not_sent() {
        let connection = connected(FakeTransport::default()).await;
        assert!(matches!(
            connection.writer().write_sensor_gain(12800).await,
            Err(WriteError::Build(BuildError::SensorGainOutOfRange { iso: 12800 }))
        ));
        assert!(written(&connection).is_empty());
    }

    #[tokio::test]
    async fn record_keeps_reported_slots() {
        let connection = connected(FakeTransport::default()).await;
        connection.camera().apply(Payload::Transport(TransportInfo {
            mode: TransportMode::Preview,
            speed: 0,
            loop_playback: false,
            play_all: false,
            timelapse_recording: false,
            slots: vec![TransportSlot {
                active: true,
                medium: ActiveStorageMedium::SdCard,
            }],
        }));
        connection.writer().write_record_start().await.unwrap();
        // Media / transport mode: record, speed 0, slot 1 active, SD card
        assert_eq!(
            written(&connection),
            vec![vec![0xff, 0x08, 0x00, 0x00, 0x0a, 0x01, 0x01, 0x00, 0x02, 0x00, 0x20, 0x01]]
        );
    }

    #[tokio::test]
    async fn metadata_length_checked() {
        let connection = connected(FakeTransport::default()).await;
        let writer = connection.writer();
        assert!(matches!(
            writer
                .write_metadata_text(MetadataParameter::Scene, "too long")
                .await,
            Err(WriteError::Build(BuildError::StringTooLong { max: 5, .. }))
        ));
        writer
            .write_metadata_text(MetadataParameter::Scene, "12A")
            .await
            .unwrap();
        assert_eq!(
            written(&connection),
            vec![vec![0xff, 0x07, 0x00, 0x00, 0x0c, 0x02, 0x05, 0x00, b'1', b'2', b'A', 0x00]]
        );
    }

    #[tokio::test]
    async fn focus_offset_range_checked() {
        let connection = connected(FakeTransport::default()).await;
        assert!(matches!(
            connection.writer().write_focus_offset(-1).await,
            Err(WriteError::Build(BuildError::LensPositionOutOfRange { position: -1 }))
        ));
        assert!(written(&connection).is_empty());
    }
}
