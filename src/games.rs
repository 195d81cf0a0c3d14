//! Static catalog of supported games.
//!
//! Each entry carries the data needed to recognize a game process and to
//! describe it to the presence sink. The registry is fixed at compile time;
//! its order doubles as match priority when scanning the process list.

/// Which save-file layout a game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// Magic-header file, plaintext body unless Ironman (`HOI4txt`/`HOI4bin`).
    Hoi4,
    /// Zip container with `meta` and `gamestate` entries.
    Stellaris,
}

/// Identity record for a supported game.
#[derive(Debug)]
pub struct GameSignature {
    /// Case-insensitive substring to look for in the process listing.
    pub process_key: &'static str,
    /// Human-readable game name.
    pub display_name: &'static str,
    /// Discord application id registered for this game.
    pub app_id: i64,
    /// Large image asset key on the Discord application.
    pub image_key: &'static str,
    /// Tooltip text for the large image.
    pub image_text: &'static str,
    /// Save-file layout, selects the extractor kind.
    pub format: SaveFormat,
}

impl PartialEq for GameSignature {
    fn eq(&self, other: &Self) -> bool {
        // Signatures are registry-owned statics, identity by process key.
        self.process_key == other.process_key
    }
}

impl Eq for GameSignature {}

/// All supported games, in match-priority order.
static REGISTRY: &[GameSignature] = &[
    GameSignature {
        process_key: "stellaris.exe",
        display_name: "Stellaris",
        app_id: 1_426_478_074_278_580_318,
        image_key: "stellaris",
        image_text: "Stellaris",
        format: SaveFormat::Stellaris,
    },
    GameSignature {
        process_key: "hoi4.exe",
        display_name: "Hearts of Iron IV",
        app_id: 1_426_482_535_223_005_217,
        image_key: "hoi4",
        image_text: "Hearts of Iron IV",
        format: SaveFormat::Hoi4,
    },
];

/// Enumerate every registered signature, in priority order.
pub fn all() -> &'static [GameSignature] {
    REGISTRY
}
