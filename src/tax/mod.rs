//! GST on gateway fees and paise arithmetic

pub mod gst;
pub mod rounding;

pub use gst::*;
pub use rounding::*;
