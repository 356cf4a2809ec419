use ux::u4;

/// The state of the 16 hexadecimal keys. The keypad is owned by the host,
/// which maps its native input events onto key indices, and lent to the chip
/// for every executed instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; 16],
}

fn slot(key: u4) -> usize {
    u8::from(key) as usize
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    pub fn set(&mut self, key: u4, pressed: bool) {
        self.keys[slot(key)] = pressed;
    }

    pub fn press(&mut self, key: u4) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u4) {
        self.set(key, false);
    }

    pub fn release_all(&mut self) {
        self.keys = [false; 16];
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[slot(key)]
    }

    /// Looks up a key by a raw index as found in a register. Returns `None`
    /// if the index does not name a key.
    pub(crate) fn lookup(&self, index: u8) -> Option<bool> {
        self.keys.get(index as usize).copied()
    }

    /// The indices of all pressed keys, in ascending order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(index, _)| index as u8)
    }
}
