pub mod card_state;
pub mod size_profile;
pub mod source_image;

pub use card_state::CardState;
pub use size_profile::{SizeProfile, Typography};
pub use source_image::SourceImage;
