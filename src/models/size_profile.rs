/// Typography overrides applied to the text section of a card, in logical
/// pixels. Profiles without an override use the base styling defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typography {
    pub padding_v: u32,
    pub padding_h: u32,
    pub logo_height: u32,
    pub name_font_size: u32,
    pub logo_margin_bottom: u32,
}

/// A named, fixed card output format.
///
/// Geometry is static configuration, never derived from runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeProfile {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: (u32, u32),
    /// Share of the card height given to the photo, as a fraction.
    pub image_fraction: (u32, u32),
    /// Suffix appended to exported file names ("" for the default profile).
    pub file_suffix: &'static str,
    pub typography: Option<Typography>,
}

impl SizeProfile {
    /// Plain card: 400x533
    pub const NORMAL: Self = Self {
        name: "normal",
        width: 400,
        height: 533,
        aspect_ratio: (3, 4),
        image_fraction: (2, 3),
        file_suffix: "",
        typography: None,
    };

    /// Instagram feed post: 1080x1350
    pub const INSTAGRAM_POST: Self = Self {
        name: "instagram-post",
        width: 1080,
        height: 1350,
        aspect_ratio: (4, 5),
        image_fraction: (2, 3),
        file_suffix: "-post",
        typography: Some(Typography {
            padding_v: 72,
            padding_h: 72,
            logo_height: 72,
            name_font_size: 54,
            logo_margin_bottom: 24,
        }),
    };

    /// Instagram story: 1080x1920
    pub const INSTAGRAM_STORY: Self = Self {
        name: "instagram-story",
        width: 1080,
        height: 1920,
        aspect_ratio: (9, 16),
        image_fraction: (2, 3),
        file_suffix: "-story",
        typography: Some(Typography {
            padding_v: 96,
            padding_h: 96,
            logo_height: 96,
            name_font_size: 72,
            logo_margin_bottom: 32,
        }),
    };

    pub const ALL: [&'static Self; 3] =
        [&Self::NORMAL, &Self::INSTAGRAM_POST, &Self::INSTAGRAM_STORY];

    /// Look up a profile by its user-facing name.
    pub fn by_name(name: &str) -> Option<&'static Self> {
        Self::ALL.iter().copied().find(|p| p.name == name)
    }
}
