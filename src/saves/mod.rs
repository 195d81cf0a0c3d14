//! Save-file location and decoding.

mod extractor;
mod hoi4;
mod locate;
mod stellaris;

pub use extractor::{Extractor, SaveReader};
pub use hoi4::Hoi4Reader;
pub use locate::find_latest;
pub use stellaris::StellarisReader;
