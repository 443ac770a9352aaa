use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

/// Hardware classes that key screenshot and trailer collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Iphone35,
    Iphone4,
    Iphone6,
    Iphone6Plus,
    Ipad,
    IpadPro,
    Watch,
    AppleTv,
    Desktop,
}

impl Device {
    pub const ALL: [Device; 9] = [
        Device::Iphone35,
        Device::Iphone4,
        Device::Iphone6,
        Device::Iphone6Plus,
        Device::Ipad,
        Device::IpadPro,
        Device::Watch,
        Device::AppleTv,
        Device::Desktop,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iphone35 => "iphone35",
            Self::Iphone4 => "iphone4",
            Self::Iphone6 => "iphone6",
            Self::Iphone6Plus => "iphone6Plus",
            Self::Ipad => "ipad",
            Self::IpadPro => "ipadPro",
            Self::Watch => "watch",
            Self::AppleTv => "appleTV",
            Self::Desktop => "desktop",
        }
    }

    #[must_use]
    pub fn supports_trailer(self) -> bool {
        !matches!(self, Self::Iphone35 | Self::Watch)
    }

    /// Pixel size a trailer preview frame must have on this device.
    #[must_use]
    pub fn preview_resolution(self, portrait: bool) -> Option<Resolution> {
        let landscape = match self {
            Self::Iphone4 => Resolution::new(1136, 640),
            Self::Iphone6 => Resolution::new(1334, 750),
            Self::Iphone6Plus => Resolution::new(2208, 1242),
            Self::Ipad => Resolution::new(1024, 768),
            Self::IpadPro => Resolution::new(2732, 2048),
            Self::AppleTv | Self::Desktop => Resolution::new(1920, 1080),
            Self::Iphone35 | Self::Watch => return None,
        };
        Some(if portrait {
            landscape.rotated()
        } else {
            landscape
        })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|device| device.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|device| device.as_str()).collect();
                RecordError::invalid_argument(
                    "device",
                    s,
                    format!("must be one of {}", known.join(", ")),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_portrait(self) -> bool {
        self.height > self.width
    }

    #[must_use]
    pub fn rotated(self) -> Self {
        Self::new(self.height, self.width)
    }

    #[must_use]
    pub fn orientation(self) -> &'static str {
        if self.is_portrait() {
            "portrait"
        } else {
            "landscape"
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
