/// Camera model reported in the camera-spec status notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraModel {
    Unknown = 0,
    CinemaCamera = 1,
    PocketCinemaCamera = 2,
    ProductionCamera4K = 3,
    StudioCamera = 4,
    StudioCamera4K = 5,
    Ursa = 6,
    MicroCinemaCamera = 7,
    MicroStudioCamera = 8,
    UrsaMini = 9,
    UrsaMiniPro = 10,
    UrsaBroadcast = 11,
    UrsaMiniProG2 = 12,
    PocketCinemaCamera4K = 13,
    PocketCinemaCamera6K = 14,
    PocketCinemaCamera6KPro = 15,
    UrsaMiniPro12K = 16,
    UrsaBroadcastG2 = 17,
    StudioCamera4KPlus = 18,
    StudioCamera4KPro = 19,
    PocketCinemaCamera6KG2 = 20,
    StudioCamera4KExtreme = 21,
}

impl CameraModel {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Unknown,
            1 => Self::CinemaCamera,
            2 => Self::PocketCinemaCamera,
            3 => Self::ProductionCamera4K,
            4 => Self::StudioCamera,
            5 => Self::StudioCamera4K,
            6 => Self::Ursa,
            7 => Self::MicroCinemaCamera,
            8 => Self::MicroStudioCamera,
            9 => Self::UrsaMini,
            10 => Self::UrsaMiniPro,
            11 => Self::UrsaBroadcast,
            12 => Self::UrsaMiniProG2,
            13 => Self::PocketCinemaCamera4K,
            14 => Self::PocketCinemaCamera6K,
            15 => Self::PocketCinemaCamera6KPro,
            16 => Self::UrsaMiniPro12K,
            17 => Self::UrsaBroadcastG2,
            18 => Self::StudioCamera4KPlus,
            19 => Self::StudioCamera4KPro,
            20 => Self::PocketCinemaCamera6KG2,
            21 => Self::StudioCamera4KExtreme,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::CinemaCamera => "Cinema Camera",
            Self::PocketCinemaCamera => "Pocket Cinema Camera",
            Self::ProductionCamera4K => "Production Camera 4K",
            Self::StudioCamera => "Studio Camera",
            Self::StudioCamera4K => "Studio Camera 4K",
            Self::Ursa => "URSA",
            Self::MicroCinemaCamera => "Micro Cinema Camera",
            Self::MicroStudioCamera => "Micro Studio Camera",
            Self::UrsaMini => "URSA Mini",
            Self::UrsaMiniPro => "URSA Mini Pro",
            Self::UrsaBroadcast => "URSA Broadcast",
            Self::UrsaMiniProG2 => "URSA Mini Pro G2",
            Self::PocketCinemaCamera4K => "Pocket Cinema Camera 4K",
            Self::PocketCinemaCamera6K => "Pocket Cinema Camera 6K",
            Self::PocketCinemaCamera6KPro => "Pocket Cinema Camera 6K Pro",
            Self::UrsaMiniPro12K => "URSA Mini Pro 12K",
            Self::UrsaBroadcastG2 => "URSA Broadcast G2",
            Self::StudioCamera4KPlus => "Studio Camera 4K Plus",
            Self::StudioCamera4KPro => "Studio Camera 4K Pro",
            Self::PocketCinemaCamera6KG2 => "Pocket Cinema Camera 6K G2",
            Self::StudioCamera4KExtreme => "Studio Camera 4K Extreme",
        }
    }

    pub fn is_pocket(&self) -> bool {
        matches!(
            self,
            Self::PocketCinemaCamera
                | Self::PocketCinemaCamera4K
                | Self::PocketCinemaCamera6K
                | Self::PocketCinemaCamera6KG2
                | Self::PocketCinemaCamera6KPro
        )
    }
}

impl std::fmt::Display for CameraModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
