//! colorcard
//!
//! Turns a photograph into a personal Pantone-style color card: extracts the
//! dominant color via bucketed histogram voting and composites a fixed-layout
//! card (photo + logo + name) into an exportable PNG at one of three size
//! profiles.

pub mod assets;
pub mod error;
pub mod extract;
pub mod models;
pub mod rendering;
pub mod services;
