//! Button identifiers.
//!
//! The set is closed: per-button state lives in `[T; InputId::COUNT]`
//! arrays indexed by [`InputId::index`], never in a map.

/// Physical button on the front panel.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputId {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
    /// Left shoulder
    Lt = 4,
    B = 5,
    A = 6,
    /// Right shoulder
    Rt = 7,
    /// Start/play
    Play = 8,
}

impl InputId {
    /// Number of buttons.
    pub const COUNT: usize = 9;

    /// All buttons, in index order.
    pub const ALL: [InputId; Self::COUNT] = [
        InputId::Left,
        InputId::Down,
        InputId::Right,
        InputId::Up,
        InputId::Lt,
        InputId::B,
        InputId::A,
        InputId::Rt,
        InputId::Play,
    ];

    /// Array index for this button (0..COUNT).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from index. Returns `None` past the last button.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            InputId::Left => "LEFT",
            InputId::Down => "DOWN",
            InputId::Right => "RIGHT",
            InputId::Up => "UP",
            InputId::Lt => "LT",
            InputId::B => "B",
            InputId::A => "A",
            InputId::Rt => "RT",
            InputId::Play => "PLAY",
        }
    }
}

impl core::fmt::Display for InputId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
