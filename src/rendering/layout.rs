//! Card geometry.
//!
//! Pure mapping from a size profile to concrete pixel geometry. Both the
//! compositor and any live preview go through this, so they always agree.

use crate::models::size_profile::{SizeProfile, Typography};

/// Base styling for the `normal` profile, which carries no typography
/// override of its own.
const BASE_TYPOGRAPHY: Typography = Typography {
    padding_v: 24,
    padding_h: 24,
    logo_height: 32,
    name_font_size: 24,
    logo_margin_bottom: 8,
};

/// Concrete card geometry in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLayout {
    pub image_section_height: u32,
    pub text_section_height: u32,
    pub padding_v: u32,
    pub padding_h: u32,
    pub logo_height: u32,
    pub name_font_size: u32,
    pub logo_margin_bottom: u32,
}

/// Compute the geometry for a profile. Same profile, same answer.
pub fn layout(profile: &SizeProfile) -> CardLayout {
    let (num, den) = profile.image_fraction;
    let image_section_height = profile.height * num / den;
    let text_section_height = profile.height - image_section_height;

    let typography = profile.typography.unwrap_or(BASE_TYPOGRAPHY);

    CardLayout {
        image_section_height,
        text_section_height,
        padding_v: typography.padding_v,
        padding_h: typography.padding_h,
        logo_height: typography.logo_height,
        name_font_size: typography.name_font_size,
        logo_margin_bottom: typography.logo_margin_bottom,
    }
}
