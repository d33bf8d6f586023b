//! evdev keycode mode
//!
//! Reads raw `struct input_event` records from /dev/input/eventN.
//! The device is grabbed exclusively (EVIOCGRAB) so no other process,
//! including the console, sees the reader's keystrokes.

use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use super::keycodes::{digit_for_key, is_terminator_key, EV_KEY, KEY_PRESSED};
use super::{CaptureError, Symbol, SymbolSource, TERMINATOR};

nix::ioctl_write_int!(eviocgrab, b'E', 0x90);
nix::ioctl_read_buf!(eviocgname, b'E', 0x06, u8);

/// Fields of one input event that matter for decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub type_: u16,
    pub code: u16,
    pub value: i32,
}

/// Map an input event to a symbol
///
/// Only key presses count; releases, repeats and non-key events
/// become Null. Unmapped keys are ignored rather than rejected.
pub fn decode_event(event: KeyEvent) -> Symbol {
    if event.type_ != EV_KEY || event.value != KEY_PRESSED {
        return Symbol::Null;
    }
    if is_terminator_key(event.code) {
        return Symbol::Char(TERMINATOR);
    }
    match digit_for_key(event.code) {
        Some(c) => Symbol::Char(c),
        None => Symbol::Null,
    }
}

/// Exclusively grabbed evdev device
///
/// The grab is held until drop.
pub struct DeviceSource {
    file: File,
    path: PathBuf,
}

impl DeviceSource {
    /// Open the device and take the exclusive grab
    ///
    /// Symlinks (e.g. /dev/input/by-id/...) are resolved first.
    /// There is no retry: failure here is fatal to the caller.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let resolved = path.canonicalize().map_err(|e| CaptureError::DeviceOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        if resolved != path {
            debug!("Resolved {:?} -> {:?}", path, resolved);
        }

        let file = OpenOptions::new()
            .read(true)
            .open(&resolved)
            .map_err(|e| CaptureError::DeviceOpen {
                path: resolved.clone(),
                source: e,
            })?;

        unsafe { eviocgrab(file.as_raw_fd(), 1) }.map_err(|e| CaptureError::DeviceGrab {
            path: resolved.clone(),
            source: e,
        })?;

        info!("Grabbed input device {:?}", resolved);
        Ok(Self {
            file,
            path: resolved,
        })
    }

    /// Locate a device by its evdev name and open it
    pub fn open_by_name(dir: &Path, name: &str) -> Result<Self, CaptureError> {
        let path = find_device_by_name(dir, name)?;
        Self::open(&path)
    }

    /// Read one complete input event
    fn read_event(&mut self) -> Result<KeyEvent, CaptureError> {
        let size = std::mem::size_of::<libc::input_event>();
        let mut event: libc::input_event = unsafe { std::mem::zeroed() };
        let buf = unsafe {
            std::slice::from_raw_parts_mut(&mut event as *mut libc::input_event as *mut u8, size)
        };

        let got = loop {
            match self.file.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CaptureError::Read(e)),
            }
        };
        if got < size {
            return Err(CaptureError::ShortRead {
                got,
                expected: size,
            });
        }

        Ok(KeyEvent {
            type_: event.type_,
            code: event.code,
            value: event.value,
        })
    }
}

impl SymbolSource for DeviceSource {
    fn next_symbol(&mut self) -> Result<Symbol, CaptureError> {
        self.read_event().map(decode_event)
    }

    fn describe(&self) -> String {
        format!("input device {}", self.path.display())
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        match unsafe { eviocgrab(self.file.as_raw_fd(), 0) } {
            Ok(_) => info!("Released input device {:?}", self.path),
            Err(e) => warn!("Failed to release input device {:?}: {}", self.path, e),
        }
    }
}

/// Read the evdev name of an open device
fn device_name(file: &File) -> Option<String> {
    let mut buf = [0u8; 256];
    unsafe { eviocgname(file.as_raw_fd(), &mut buf) }.ok()?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Scan `dir` for event nodes whose name matches (case-insensitive)
fn find_device_by_name(dir: &Path, name: &str) -> Result<PathBuf, CaptureError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CaptureError::DeviceOpen {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("event"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    for path in candidates {
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!("Skipping {:?}: {}", path, e);
                continue;
            }
        };
        if let Some(found) = device_name(&file) {
            debug!("{:?}: {}", path, found);
            if found.eq_ignore_ascii_case(name) {
                info!("Found input device {:?} at {:?}", name, path);
                return Ok(path);
            }
        }
    }

    Err(CaptureError::DeviceNotFound(name.to_string()))
}
