//! evdev keycode constants
//!
//! The subset of Linux input event codes a keyboard-emulating reader emits.
//! Values are from <linux/input-event-codes.h>.

#![allow(dead_code)]

// ============================================================================
// Event Types and Values
// ============================================================================

/// Key/button state change event type
pub const EV_KEY: u16 = 0x01;

/// EV_KEY value for a key release
pub const KEY_RELEASED: i32 = 0;

/// EV_KEY value for a key press
pub const KEY_PRESSED: i32 = 1;

/// EV_KEY value for autorepeat
pub const KEY_REPEATED: i32 = 2;

// ============================================================================
// Top-row Digits
// ============================================================================

pub const KEY_1: u16 = 2;
pub const KEY_2: u16 = 3;
pub const KEY_3: u16 = 4;
pub const KEY_4: u16 = 5;
pub const KEY_5: u16 = 6;
pub const KEY_6: u16 = 7;
pub const KEY_7: u16 = 8;
pub const KEY_8: u16 = 9;
pub const KEY_9: u16 = 10;
pub const KEY_0: u16 = 11;

/// Main Enter key (line terminator)
pub const KEY_ENTER: u16 = 28;

// ============================================================================
// Keypad
// ============================================================================

pub const KEY_KP7: u16 = 71;
pub const KEY_KP8: u16 = 72;
pub const KEY_KP9: u16 = 73;
pub const KEY_KP4: u16 = 75;
pub const KEY_KP5: u16 = 76;
pub const KEY_KP6: u16 = 77;
pub const KEY_KP1: u16 = 79;
pub const KEY_KP2: u16 = 80;
pub const KEY_KP3: u16 = 81;
pub const KEY_KP0: u16 = 82;

/// Keypad Enter key (line terminator)
pub const KEY_KPENTER: u16 = 96;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a digit keycode (top row or keypad) to its ASCII digit
/// Returns None if not a digit key
#[inline]
pub const fn digit_for_key(keycode: u16) -> Option<char> {
    match keycode {
        KEY_1 | KEY_KP1 => Some('1'),
        KEY_2 | KEY_KP2 => Some('2'),
        KEY_3 | KEY_KP3 => Some('3'),
        KEY_4 | KEY_KP4 => Some('4'),
        KEY_5 | KEY_KP5 => Some('5'),
        KEY_6 | KEY_KP6 => Some('6'),
        KEY_7 | KEY_KP7 => Some('7'),
        KEY_8 | KEY_KP8 => Some('8'),
        KEY_9 | KEY_KP9 => Some('9'),
        KEY_0 | KEY_KP0 => Some('0'),
        _ => None,
    }
}

/// Check if keycode terminates a scan line
#[inline]
pub const fn is_terminator_key(keycode: u16) -> bool {
    keycode == KEY_ENTER || keycode == KEY_KPENTER
}
