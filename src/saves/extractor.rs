//! Save telemetry extraction with change detection and throttling.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::config::SaveSettings;
use crate::games::SaveFormat;

use super::hoi4::Hoi4Reader;
use super::stellaris::StellarisReader;

/// Capability set a per-game save reader must provide.
///
/// Readers own the cached telemetry fields; a decode that finds nothing for a
/// field must leave that field's previous value in place (stale-but-valid).
pub trait SaveReader: Send {
    /// Find the newest candidate save file, if any.
    fn locate(&self) -> Option<PathBuf>;

    /// Update cached telemetry from a save file. Never fails outward; decode
    /// problems are logged and the cache keeps its previous values.
    fn decode(&mut self, path: &Path);

    /// First presence line, always non-empty.
    fn details_text(&self) -> String;

    /// Optional second presence line.
    fn state_text(&self) -> Option<String>;
}

/// Drives a [`SaveReader`]: throttles checks, skips decodes when the newest
/// save is the one already seen, and exposes the reader's display strings.
pub struct Extractor {
    reader: Box<dyn SaveReader>,
    check_interval: Duration,
    last_check: Option<Instant>,
    last_path: Option<PathBuf>,
    last_mtime: Option<SystemTime>,
}

impl Extractor {
    /// Build the extractor for a game's save format.
    ///
    /// Save directories come from the settings when overridden, otherwise
    /// each reader falls back to the game's standard location.
    pub fn for_format(format: SaveFormat, saves: &SaveSettings) -> Self {
        let reader: Box<dyn SaveReader> = match format {
            SaveFormat::Hoi4 => match &saves.hoi4_dir {
                Some(dir) => Box::new(Hoi4Reader::with_save_dir(Some(dir.clone()))),
                None => Box::new(Hoi4Reader::new()),
            },
            SaveFormat::Stellaris => match &saves.stellaris_dir {
                Some(dir) => Box::new(StellarisReader::with_save_dir(Some(dir.clone()))),
                None => Box::new(StellarisReader::new()),
            },
        };
        Self::with_reader(reader, Duration::from_millis(saves.check_interval_ms))
    }

    pub fn with_reader(reader: Box<dyn SaveReader>, check_interval: Duration) -> Self {
        Self {
            reader,
            check_interval,
            last_check: None,
            last_path: None,
            last_mtime: None,
        }
    }

    /// Re-check the save directory and decode when something changed.
    ///
    /// Returns `true` only when a new or updated save file was decoded. The
    /// check is throttled by its own clock, independent of how often the
    /// caller ticks. `now` is injected so tests need no real sleeps.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_check {
            if now.duration_since(last) < self.check_interval {
                return false;
            }
        }
        self.last_check = Some(now);

        let path = match self.reader.locate() {
            Some(path) => path,
            None => return false,
        };

        let mtime = match path.metadata().and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                tracing::warn!("cannot stat save file {}: {e}", path.display());
                return false;
            }
        };

        if self.last_path.as_deref() == Some(path.as_path()) && self.last_mtime == Some(mtime) {
            return false;
        }

        tracing::info!("new or updated save file: {}", path.display());
        self.reader.decode(&path);

        // Record the pair even when the decode extracted nothing, so an
        // unchanged file is not re-decoded every tick.
        self.last_path = Some(path);
        self.last_mtime = Some(mtime);
        true
    }

    pub fn details_text(&self) -> String {
        self.reader.details_text()
    }

    pub fn state_text(&self) -> Option<String> {
        self.reader.state_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reader that serves a fixed path and counts decodes.
    struct CountingReader {
        path: Option<PathBuf>,
        decodes: Arc<AtomicUsize>,
    }

    impl SaveReader for CountingReader {
        fn locate(&self) -> Option<PathBuf> {
            self.path.clone()
        }

        fn decode(&mut self, _path: &Path) {
            self.decodes.fetch_add(1, Ordering::SeqCst);
        }

        fn details_text(&self) -> String {
            "testing".to_string()
        }

        fn state_text(&self) -> Option<String> {
            None
        }
    }

    fn extractor_over(
        path: Option<PathBuf>,
        interval: Duration,
    ) -> (Extractor, Arc<AtomicUsize>) {
        let decodes = Arc::new(AtomicUsize::new(0));
        let reader = CountingReader {
            path,
            decodes: Arc::clone(&decodes),
        };
        (
            Extractor::with_reader(Box::new(reader), interval),
            decodes,
        )
    }

    #[test]
    fn unchanged_file_is_decoded_once() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("game.sav");
        fs::write(&save, b"contents").unwrap();

        let (mut extractor, decodes) = extractor_over(Some(save), Duration::ZERO);
        let now = Instant::now();

        assert!(extractor.refresh(now));
        assert!(!extractor.refresh(now));
        assert_eq!(decodes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn modified_file_triggers_a_second_decode() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("game.sav");
        fs::write(&save, b"v1").unwrap();

        let (mut extractor, decodes) = extractor_over(Some(save.clone()), Duration::ZERO);
        assert!(extractor.refresh(Instant::now()));

        let file = fs::File::options().write(true).open(&save).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        assert!(extractor.refresh(Instant::now()));
        assert_eq!(decodes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn throttle_skips_checks_inside_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("game.sav");
        fs::write(&save, b"contents").unwrap();

        let (mut extractor, decodes) =
            extractor_over(Some(save.clone()), Duration::from_secs(5));
        let start = Instant::now();

        assert!(extractor.refresh(start));

        // Inside the interval nothing happens, even for an updated file.
        let file = fs::File::options().write(true).open(&save).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        assert!(!extractor.refresh(start + Duration::from_secs(2)));
        assert_eq!(decodes.load(Ordering::SeqCst), 1);

        // Past the interval the update is picked up.
        assert!(extractor.refresh(start + Duration::from_secs(6)));
        assert_eq!(decodes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_candidate_leaves_cache_untouched() {
        let (mut extractor, decodes) = extractor_over(None, Duration::ZERO);
        assert!(!extractor.refresh(Instant::now()));
        assert_eq!(decodes.load(Ordering::SeqCst), 0);
        assert_eq!(extractor.details_text(), "testing");
    }
}
