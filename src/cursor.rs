use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::{
    CURSOR_ENTRIES_KEPT, FIRST_RUN_LOOKBACK_SECS, LOOKUP_DIR, WINDOW_OVERLAP_SECS,
};
use crate::error::{PollerError, Result};

/// Durable record of the last two poll stamps for one source.
///
/// The file holds one epoch-second integer per line, newest last, and is
/// trimmed to two lines on every write. Each source owns its own file under
/// `<data_root>/lookups/`, so concurrent cycles for different sources never
/// contend on it.
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn for_source<P: AsRef<Path>>(data_root: P, source: &str) -> Self {
        Self {
            path: data_root
                .as_ref()
                .join(LOOKUP_DIR)
                .join(format!("{source}.cursor")),
        }
    }

    pub fn at_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the lower bound for the next poll and durably advances the
    /// cursor in the same call. Exactly one write per completed call, so
    /// callers invoke this at most once per cycle.
    ///
    /// - Missing or short file (first run, truncated file): the window is
    ///   `now - 90 days` and the file is seeded with that stamp plus `now`.
    /// - Otherwise the window is the second-to-last persisted stamp minus one
    ///   day, and `now` is appended before the trim.
    pub fn load_window(&self, now: i64) -> Result<i64> {
        let entries = self.read_entries()?;
        let (since, next) = advance(&entries, now);
        self.write_entries(&next)?;
        debug!(path = %self.path.display(), since, "cursor advanced");
        Ok(since)
    }

    /// Read half of the load; no side effects on the stored stamps, so
    /// repeated reads before a write see the same state.
    fn read_entries(&self) -> Result<Vec<i64>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(PollerError::Cursor)?;
        }
        if !self.path.exists() {
            fs::File::create(&self.path).map_err(PollerError::Cursor)?;
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(PollerError::Cursor)?;
        // Lines that don't parse (a torn write, trailing garbage) are dropped;
        // if that leaves fewer than two stamps the load falls back to the
        // first-run window.
        Ok(raw
            .lines()
            .filter_map(|line| line.trim().parse::<i64>().ok())
            .collect())
    }

    /// Write-to-temp plus rename, so the read-modify-write pair in
    /// [`Self::load_window`] is atomic on the file and an overlapping cycle
    /// can never observe a torn cursor.
    fn write_entries(&self, entries: &[i64]) -> Result<()> {
        let tmp = self.path.with_extension("cursor.tmp");
        let mut body = String::new();
        for stamp in entries {
            body.push_str(&stamp.to_string());
            body.push('\n');
        }
        fs::write(&tmp, body).map_err(PollerError::Cursor)?;
        fs::rename(&tmp, &self.path).map_err(PollerError::Cursor)?;
        Ok(())
    }
}

/// Pure window arithmetic: given the persisted stamps and `now`, produce the
/// poll window and the stamps to persist.
///
/// The basis is the second-to-last *persisted* stamp (not the last), minus a
/// one-day overlap. That anchor lags one cycle behind the latest poll; it is
/// the long-standing behavior of this feed integration and is kept as-is
/// pending product-owner confirmation (see DESIGN.md).
fn advance(entries: &[i64], now: i64) -> (i64, Vec<i64>) {
    if entries.len() < 2 {
        let since = now - FIRST_RUN_LOOKBACK_SECS;
        (since, vec![since, now])
    } else {
        let since = entries[entries.len() - 2] - WINDOW_OVERLAP_SECS;
        let mut next = entries.to_vec();
        next.push(now);
        let keep = next.split_off(next.len() - CURSOR_ENTRIES_KEPT);
        (since, keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_lines(store: &CursorStore) -> Vec<i64> {
        fs::read_to_string(store.path())
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect()
    }

    #[test]
    fn first_run_seeds_ninety_day_window() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");

        let now = 10_000_000;
        let since = store.load_window(now).unwrap();

        assert_eq!(since, now - 7_776_000);
        assert_eq!(read_lines(&store), vec![now - 7_776_000, now]);
    }

    #[test]
    fn short_file_falls_back_to_first_run_window() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "1234567\n").unwrap();

        let now = 10_000_000;
        let since = store.load_window(now).unwrap();

        assert_eq!(since, now - 7_776_000);
        assert_eq!(read_lines(&store), vec![now - 7_776_000, now]);
    }

    #[test]
    fn established_cursor_anchors_to_second_to_last_stamp() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "1000000\n1003600\n").unwrap();

        let since = store.load_window(1_100_000).unwrap();

        assert_eq!(since, 1_000_000 - 86_400);
        assert_eq!(read_lines(&store), vec![1_003_600, 1_100_000]);
    }

    #[test]
    fn file_never_grows_past_two_entries() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");

        let mut now = 2_000_000_000;
        for _ in 0..5 {
            store.load_window(now).unwrap();
            now += 3_600;
        }

        let lines = read_lines(&store);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], now - 3_600);
    }

    #[test]
    fn unparseable_lines_are_ignored() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not-a-number\n1000000\n1003600\n").unwrap();

        let since = store.load_window(1_100_000).unwrap();

        assert_eq!(since, 1_000_000 - 86_400);
        assert_eq!(read_lines(&store), vec![1_003_600, 1_100_000]);
    }

    #[test]
    fn consecutive_windows_slide_with_the_polls() {
        let dir = tempdir().unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");

        let first = store.load_window(1_000_000).unwrap();
        assert_eq!(first, 1_000_000 - 7_776_000);

        // Second run still sees the seeded first-run stamp as its basis.
        let second = store.load_window(1_003_600).unwrap();
        assert_eq!(second, (1_000_000 - 7_776_000) - 86_400);

        // From the third run on, the basis is the poll before last.
        let third = store.load_window(1_007_200).unwrap();
        assert_eq!(third, 1_000_000 - 86_400);
    }

    #[test]
    fn unwritable_root_is_a_cursor_error() {
        let dir = tempdir().unwrap();
        // Occupy the lookups path with a file so create_dir_all fails.
        fs::write(dir.path().join(LOOKUP_DIR), b"in the way").unwrap();
        let store = CursorStore::for_source(dir.path(), "acme");

        let err = store.load_window(1_000_000).unwrap_err();
        assert!(matches!(err, PollerError::Cursor(_)));
        assert_eq!(err.kind(), "cursor");
    }
}
