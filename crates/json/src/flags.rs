use std::ops::{BitOr, BitOrAssign};

/// Per-entry flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Hidden from output and unreachable by path from outside its scope.
    pub const PRIVATE: Flags = Flags(1);
    /// Hidden from output, reachable by reference.
    pub const VAR: Flags = Flags(1 << 1);
    /// Produced by the evaluator rather than written in the source.
    pub const GENERATED: Flags = Flags(1 << 2);
    /// Never printed on a single line.
    pub const NOINLINE: Flags = Flags(1 << 3);

    pub const HIDDEN: Flags = Flags(Self::PRIVATE.0 | Self::VAR.0);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    pub fn is_hidden(self) -> bool {
        self.intersects(Self::HIDDEN)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

/// Formatting metadata attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    /// Comments written directly above the entry, raw text including markers.
    pub comments: Vec<String>,
    /// Number of empty lines preceding the entry.
    pub blank_lines: usize,
}

impl Format {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.blank_lines == 0
    }
}
