pub mod scale;

pub use scale::{scale_tones, Root, Tonality};
