pub mod buffer;
pub mod degrade;
pub mod file;
pub mod tone;

pub use buffer::{SampleBuffer, SampleLayout};
pub use degrade::{degrade, degrade_in_place, dropout_fraction};
pub use file::RegionFile;
pub use tone::{write_tone, ToneSpec};
