pub mod color;
pub mod tritone;

pub use color::{indicator_color, Rgb, Rgba, FALLBACK};
pub use tritone::{tritone, Tritone};
