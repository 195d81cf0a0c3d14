mod settings;

pub use settings::{Command, Config, SaveSettings, Settings};
