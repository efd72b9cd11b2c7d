/// The hex keypad as seen by the chip. The chip only ever asks whether a key
/// is down; the host owns the state and decides how it changes.
pub trait Keypad {
    /// Whether `key` (0x0 - 0xF) is currently pressed.
    fn pressed(&self, key: u8) -> bool;
}

impl<K: Keypad + ?Sized> Keypad for &K {
    fn pressed(&self, key: u8) -> bool {
        (**self).pressed(key)
    }
}

/// Sixteen key states, one per key of the hex keypad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    keys: [bool; 16],
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state of `key`. Only the low nibble of `key` is considered.
    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0xF) as usize] = pressed;
    }

    pub fn release_all(&mut self) {
        self.keys = [false; 16];
    }
}

impl Keypad for KeyState {
    fn pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }
}
