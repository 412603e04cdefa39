//! Sysfs value store: cached integer control files behind a filesystem trait.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Placeholder used in diagnostics for a handle without a path.
const UNSET: &str = "unset";

/// How a control file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    WriteOnly,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::ReadWrite | AccessMode::WriteOnly)
    }
}

// ── Trait ──

/// An open sysfs control file holding a small decimal integer.
///
/// Dropping the file closes it.
pub trait SysfsFile {
    /// Read the current value from the start of the file.
    fn read_value(&mut self) -> io::Result<i32>;
    /// Write `value` as decimal ASCII.
    fn write_value(&mut self, value: i32) -> io::Result<()>;
}

/// Source of [`SysfsFile`]s. Implemented by the host filesystem and by
/// [`mock::MockSysfs`] for tests.
pub trait SysfsFs {
    type File: SysfsFile;

    fn open(&self, path: &str, mode: AccessMode) -> io::Result<Self::File>;
}

/// Parse sysfs text the way `strtol(text, NULL, 0)` would.
///
/// Leading whitespace and sign are accepted, `0x` selects hex, a leading `0`
/// selects octal. Parsing stops at the first invalid digit; no digits at all
/// yields 0. Out-of-range values saturate.
pub fn parse_number(text: &str) -> i32 {
    let s = text.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };

    let mut value: i64 = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        value = (value * i64::from(radix) + i64::from(d)).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ── Host implementation ──

/// Real filesystem access.
///
/// With a root set, absolute sysfs paths are resolved below that directory,
/// e.g. `/sys/class/leds/red/brightness` → `<root>/sys/class/leds/red/brightness`.
#[derive(Debug, Clone, Default)]
pub struct HostFs {
    root: Option<PathBuf>,
}

impl HostFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every path below `root` instead of `/`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        HostFs {
            root: Some(root.into()),
        }
    }

    /// Map a sysfs path onto the host filesystem.
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

impl SysfsFs for HostFs {
    type File = HostFile;

    fn open(&self, path: &str, mode: AccessMode) -> io::Result<HostFile> {
        let resolved = self.resolve(path);
        let file = OpenOptions::new()
            .read(mode.can_read())
            .write(mode.can_write())
            .open(&resolved)?;
        Ok(HostFile {
            file,
            path: resolved,
        })
    }
}

#[derive(Debug)]
pub struct HostFile {
    file: File,
    path: PathBuf,
}

impl SysfsFile for HostFile {
    fn read_value(&mut self) -> io::Result<i32> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut data = String::new();
        self.file.read_to_string(&mut data)?;
        if data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "read: EOF"));
        }
        Ok(parse_number(&data))
    }

    fn write_value(&mut self, value: i32) -> io::Result<()> {
        let data = value.to_string();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(data.as_bytes())?;
        // Sysfs attributes ignore the offset and size; regular files (test
        // trees) need the stale tail dropped.
        if let Err(e) = self.file.set_len(data.len() as u64) {
            log::debug!("{}: truncate: {e}", self.path.display());
        }
        Ok(())
    }
}

// ── Cached value ──

/// A sysfs control file plus the last value read from or written to it.
///
/// Starts closed with a cached value of `-1`. Closing keeps the cached value,
/// so e.g. a max_brightness reading stays available after its file is closed.
pub struct SysfsValue<F: SysfsFs> {
    path: Option<String>,
    file: Option<F::File>,
    curr: i32,
}

impl<F: SysfsFs> Default for SysfsValue<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SysfsFs> fmt::Debug for SysfsValue<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysfsValue")
            .field("path", &self.path())
            .field("open", &self.is_open())
            .field("curr", &self.curr)
            .finish()
    }
}

impl<F: SysfsFs> SysfsValue<F> {
    pub fn new() -> Self {
        SysfsValue {
            path: None,
            file: None,
            curr: -1,
        }
    }

    /// Open `path` for reading and writing.
    pub fn open_rw(&mut self, fs: &F, path: &str) -> io::Result<()> {
        self.open_ex(fs, path, AccessMode::ReadWrite)
    }

    /// Open `path` read-only.
    pub fn open_ro(&mut self, fs: &F, path: &str) -> io::Result<()> {
        self.open_ex(fs, path, AccessMode::ReadOnly)
    }

    /// Open `path` write-only.
    pub fn open_wo(&mut self, fs: &F, path: &str) -> io::Result<()> {
        self.open_ex(fs, path, AccessMode::WriteOnly)
    }

    fn open_ex(&mut self, fs: &F, path: &str, mode: AccessMode) -> io::Result<()> {
        self.close();

        match fs.open(path, mode) {
            Ok(file) => {
                log::debug!("{path}: opened");
                // Current value is not fetched by default.
                self.path = Some(path.to_string());
                self.file = Some(file);
                Ok(())
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    log::debug!("{path}: open: {e}");
                } else {
                    log::error!("{path}: open: {e}");
                }
                Err(e)
            }
        }
    }

    /// Release the file. Safe to call on a closed handle.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            log::debug!("{}: closed", self.path());
            drop(file);
        }
        self.path = None;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path for diagnostics; `"unset"` when closed.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(UNSET)
    }

    /// Last cached value, `-1` if never read or written.
    pub fn get(&self) -> i32 {
        self.curr
    }

    /// Cache `value` and write it through if it differs from the cached one.
    ///
    /// Writing to a closed handle only updates the cache. Returns `false` if
    /// the write itself failed; the failure is logged.
    pub fn set(&mut self, value: i32) -> bool {
        let prev = self.curr;
        self.curr = value;

        if prev == value {
            return true;
        }
        let path = self.path.as_deref().unwrap_or(UNSET);
        let Some(file) = self.file.as_mut() else {
            return true;
        };

        log::debug!("{path}: write: {prev} -> {value}");
        match file.write_value(value) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{path}: write: {e}");
                false
            }
        }
    }

    /// Forget the cached value so the next [`set`](Self::set) always writes.
    pub fn invalidate(&mut self) {
        let prev = self.curr;
        self.curr = -1;
        if prev != -1 && self.is_open() {
            log::debug!("{}: invalidated", self.path());
        }
    }

    /// Re-read the live value into the cache.
    ///
    /// On failure the cache is invalidated.
    pub fn refresh(&mut self) -> io::Result<i32> {
        let path = self.path.as_deref().unwrap_or(UNSET);
        let result = match self.file.as_mut() {
            Some(file) => file.read_value(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "not open")),
        };

        match result {
            Ok(value) => {
                log::debug!("{path}: read: {} -> {value}", self.curr);
                self.curr = value;
                Ok(value)
            }
            Err(e) => {
                if self.file.is_some() {
                    log::error!("{path}: read: {e}");
                }
                self.invalidate();
                Err(e)
            }
        }
    }
}

// ── Mock filesystem for testing ──

/// In-memory sysfs for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    /// One recorded filesystem operation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Open { path: String, mode: AccessMode },
        Read { path: String, value: i32 },
        Write { path: String, value: i32 },
        Close { path: String },
    }

    #[derive(Debug, Clone)]
    struct Node {
        value: i32,
        writable: bool,
    }

    #[derive(Debug, Default)]
    struct State {
        nodes: RefCell<HashMap<String, Node>>,
        events: RefCell<Vec<Event>>,
        open: Cell<usize>,
        fail_writes: Cell<bool>,
    }

    /// Cloneable in-memory filesystem; clones share the same files and log.
    #[derive(Debug, Clone, Default)]
    pub struct MockSysfs {
        state: Rc<State>,
    }

    impl MockSysfs {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a read-write file.
        pub fn add_file(&self, path: &str, value: i32) {
            self.insert(path, value, true);
        }

        /// Register a file that rejects opening for write (like max_brightness).
        pub fn add_read_only(&self, path: &str, value: i32) {
            self.insert(path, value, false);
        }

        /// Register `/sys/class/leds/<name>/{brightness,max_brightness,blink}`.
        pub fn add_led(&self, name: &str, max_brightness: i32) {
            self.add_file(&format!("/sys/class/leds/{name}/brightness"), 0);
            self.add_read_only(
                &format!("/sys/class/leds/{name}/max_brightness"),
                max_brightness,
            );
            self.add_file(&format!("/sys/class/leds/{name}/blink"), 0);
        }

        fn insert(&self, path: &str, value: i32, writable: bool) {
            self.state
                .nodes
                .borrow_mut()
                .insert(path.to_string(), Node { value, writable });
        }

        pub fn remove(&self, path: &str) {
            self.state.nodes.borrow_mut().remove(path);
        }

        /// Current file content.
        pub fn value(&self, path: &str) -> Option<i32> {
            self.state.nodes.borrow().get(path).map(|n| n.value)
        }

        /// Make every subsequent write fail.
        pub fn set_fail_writes(&self, fail: bool) {
            self.state.fail_writes.set(fail);
        }

        pub fn events(&self) -> Vec<Event> {
            self.state.events.borrow().clone()
        }

        pub fn clear_events(&self) {
            self.state.events.borrow_mut().clear();
        }

        /// Successful writes in order: (path, value).
        pub fn writes(&self) -> Vec<(String, i32)> {
            self.state
                .events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    Event::Write { path, value } => Some((path.clone(), *value)),
                    _ => None,
                })
                .collect()
        }

        /// Successful writes to one path, in order.
        pub fn writes_to(&self, path: &str) -> Vec<i32> {
            self.writes()
                .into_iter()
                .filter(|(p, _)| p == path)
                .map(|(_, v)| v)
                .collect()
        }

        /// Paths successfully opened, in order (duplicates kept).
        pub fn opened_paths(&self) -> Vec<String> {
            self.state
                .events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    Event::Open { path, .. } => Some(path.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Paths closed, in order (duplicates kept).
        pub fn closed_paths(&self) -> Vec<String> {
            self.state
                .events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    Event::Close { path } => Some(path.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Number of handles currently open.
        pub fn open_handles(&self) -> usize {
            self.state.open.get()
        }

        fn record(&self, event: Event) {
            self.state.events.borrow_mut().push(event);
        }
    }

    impl SysfsFs for MockSysfs {
        type File = MockFile;

        fn open(&self, path: &str, mode: AccessMode) -> io::Result<MockFile> {
            let writable = match self.state.nodes.borrow().get(path) {
                Some(node) => node.writable,
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        "No such file or directory",
                    ));
                }
            };
            if mode.can_write() && !writable {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "Permission denied",
                ));
            }
            self.record(Event::Open {
                path: path.to_string(),
                mode,
            });
            self.state.open.set(self.state.open.get() + 1);
            Ok(MockFile {
                fs: self.clone(),
                path: path.to_string(),
                mode,
            })
        }
    }

    /// Handle into a [`MockSysfs`]; records a close event when dropped.
    #[derive(Debug)]
    pub struct MockFile {
        fs: MockSysfs,
        path: String,
        mode: AccessMode,
    }

    fn bad_fd() -> io::Error {
        io::Error::other("Bad file descriptor")
    }

    impl SysfsFile for MockFile {
        fn read_value(&mut self) -> io::Result<i32> {
            if !self.mode.can_read() {
                return Err(bad_fd());
            }
            let value = self
                .fs
                .value(&self.path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file removed"))?;
            self.fs.record(Event::Read {
                path: self.path.clone(),
                value,
            });
            Ok(value)
        }

        fn write_value(&mut self, value: i32) -> io::Result<()> {
            if !self.mode.can_write() {
                return Err(bad_fd());
            }
            if self.fs.state.fail_writes.get() {
                return Err(io::Error::other("injected write failure"));
            }
            if let Some(node) = self.fs.state.nodes.borrow_mut().get_mut(&self.path) {
                node.value = value;
            }
            self.fs.record(Event::Write {
                path: self.path.clone(),
                value,
            });
            Ok(())
        }
    }

    impl Drop for MockFile {
        fn drop(&mut self) {
            self.fs.record(Event::Close {
                path: self.path.clone(),
            });
            self.fs.state.open.set(self.fs.state.open.get() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Event, MockSysfs};
    use super::*;

    const BRIGHTNESS: &str = "/sys/class/leds/red/brightness";
    const MAX: &str = "/sys/class/leds/red/max_brightness";

    fn fs() -> MockSysfs {
        let fs = MockSysfs::new();
        fs.add_led("red", 255);
        fs
    }

    // ── parse_number ──

    #[test]
    fn parse_decimal_with_newline() {
        assert_eq!(parse_number("255\n"), 255);
    }

    #[test]
    fn parse_negative_and_whitespace() {
        assert_eq!(parse_number("  -12"), -12);
    }

    #[test]
    fn parse_hex_and_octal() {
        assert_eq!(parse_number("0x1F"), 31);
        assert_eq!(parse_number("017"), 15);
        assert_eq!(parse_number("0"), 0);
    }

    #[test]
    fn parse_stops_at_garbage() {
        assert_eq!(parse_number("42 [on]"), 42);
        assert_eq!(parse_number("garbage"), 0);
        assert_eq!(parse_number(""), 0);
    }

    #[test]
    fn parse_saturates() {
        assert_eq!(parse_number("99999999999"), i32::MAX);
        assert_eq!(parse_number("-99999999999"), i32::MIN);
    }

    // ── SysfsValue ──

    #[test]
    fn new_value_is_closed_and_unset() {
        let v = SysfsValue::<MockSysfs>::new();
        assert!(!v.is_open());
        assert_eq!(v.get(), -1);
        assert_eq!(v.path(), "unset");
    }

    #[test]
    fn open_missing_file_fails() {
        let fs = fs();
        let mut v = SysfsValue::new();
        let err = v.open_rw(&fs, "/sys/class/leds/nope/brightness").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!v.is_open());
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn open_rw_on_read_only_file_fails() {
        let fs = fs();
        let mut v = SysfsValue::new();
        assert!(v.open_rw(&fs, MAX).is_err());
        assert!(v.open_ro(&fs, MAX).is_ok());
    }

    #[test]
    fn refresh_reads_live_value() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_ro(&fs, MAX).unwrap();
        assert_eq!(v.refresh().unwrap(), 255);
        assert_eq!(v.get(), 255);
    }

    #[test]
    fn refresh_on_closed_handle_invalidates() {
        let mut v = SysfsValue::<MockSysfs>::new();
        v.set(7);
        assert!(v.refresh().is_err());
        assert_eq!(v.get(), -1);
    }

    #[test]
    fn set_writes_through_and_elides_repeats() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_rw(&fs, BRIGHTNESS).unwrap();

        assert!(v.set(10));
        assert!(v.set(10));
        assert!(v.set(20));

        assert_eq!(fs.writes_to(BRIGHTNESS), vec![10, 20]);
        assert_eq!(fs.value(BRIGHTNESS), Some(20));
        assert_eq!(v.get(), 20);
    }

    #[test]
    fn set_on_closed_handle_only_caches() {
        let fs = fs();
        let mut v = SysfsValue::<MockSysfs>::new();
        assert!(v.set(5));
        assert_eq!(v.get(), 5);
        assert!(fs.writes().is_empty());
    }

    #[test]
    fn set_on_read_only_handle_reports_failure() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_ro(&fs, MAX).unwrap();
        assert!(!v.set(1000));
        // Cache follows the request even though the write failed.
        assert_eq!(v.get(), 1000);
        assert_eq!(fs.value(MAX), Some(255));
    }

    #[test]
    fn invalidate_forces_next_write() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_rw(&fs, BRIGHTNESS).unwrap();
        v.set(3);
        v.invalidate();
        v.set(3);
        assert_eq!(fs.writes_to(BRIGHTNESS), vec![3, 3]);
    }

    #[test]
    fn close_is_idempotent_and_keeps_value() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_ro(&fs, MAX).unwrap();
        v.refresh().unwrap();
        v.close();
        v.close();

        assert_eq!(v.get(), 255);
        assert_eq!(fs.open_handles(), 0);
        assert_eq!(fs.closed_paths(), vec![MAX.to_string()]);
    }

    #[test]
    fn reopen_closes_previous_file() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_rw(&fs, BRIGHTNESS).unwrap();
        v.open_ro(&fs, MAX).unwrap();
        assert_eq!(fs.open_handles(), 1);
        assert_eq!(v.path(), MAX);
        assert!(fs.events().contains(&Event::Close {
            path: BRIGHTNESS.to_string()
        }));
    }

    #[test]
    fn drop_closes_file() {
        let fs = fs();
        {
            let mut v = SysfsValue::new();
            v.open_rw(&fs, BRIGHTNESS).unwrap();
            assert_eq!(fs.open_handles(), 1);
        }
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn injected_write_failure_is_reported() {
        let fs = fs();
        let mut v = SysfsValue::new();
        v.open_rw(&fs, BRIGHTNESS).unwrap();
        fs.set_fail_writes(true);
        assert!(!v.set(9));
        assert!(fs.writes().is_empty());
    }

    // ── HostFs ──

    #[test]
    fn host_fs_resolves_below_root() {
        let fs = HostFs::with_root("/tmp/fake");
        assert_eq!(
            fs.resolve(BRIGHTNESS),
            PathBuf::from("/tmp/fake/sys/class/leds/red/brightness")
        );
        assert_eq!(HostFs::new().resolve(BRIGHTNESS), PathBuf::from(BRIGHTNESS));
    }

    #[test]
    fn host_fs_read_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let led = dir.path().join("sys/class/leds/red");
        std::fs::create_dir_all(&led).unwrap();
        std::fs::write(led.join("brightness"), "1000\n").unwrap();

        let fs = HostFs::with_root(dir.path());
        let mut v = SysfsValue::new();
        v.open_rw(&fs, BRIGHTNESS).unwrap();
        assert_eq!(v.refresh().unwrap(), 1000);

        v.set(7);
        let on_disk = std::fs::read_to_string(led.join("brightness")).unwrap();
        assert_eq!(on_disk, "7");
        assert_eq!(v.refresh().unwrap(), 7);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn host_fs_write_ignores_untruncatable_target() {
        // Character devices reject ftruncate like sysfs attributes can.
        let mut file = HostFs::new()
            .open("/dev/null", AccessMode::WriteOnly)
            .unwrap();
        assert!(file.file.set_len(0).is_err());
        assert!(file.write_value(42).is_ok());
    }

    #[test]
    fn host_fs_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = HostFs::with_root(dir.path());
        let err = fs.open(BRIGHTNESS, AccessMode::ReadOnly).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn host_fs_empty_file_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let led = dir.path().join("sys/class/leds/red");
        std::fs::create_dir_all(&led).unwrap();
        std::fs::write(led.join("max_brightness"), "").unwrap();

        let fs = HostFs::with_root(dir.path());
        let mut v = SysfsValue::new();
        v.open_ro(&fs, MAX).unwrap();
        assert!(v.refresh().is_err());
        assert_eq!(v.get(), -1);
    }
}
