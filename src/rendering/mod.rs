pub mod compositor;
pub mod layout;

pub use compositor::{CardRenderer, PIXEL_RATIO};
pub use layout::{layout, CardLayout};
