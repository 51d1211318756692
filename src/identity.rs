// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Sharing tokens handed between execution contexts.
//
// An identity is a plain 64-bit integer so the host can marshal it like any
// other number. It never encodes an address: attach resolves it through the
// per-kind registry, which checks kind, slot and generation.
//
// Layout (most significant first):
//   [63..56] kind   [55..32] generation   [31..0] slot index

use std::fmt;

const KIND_SHIFT: u32 = 56;
const GEN_SHIFT: u32 = 32;

/// Generations are 24 bits wide and never zero.
pub(crate) const GEN_MASK: u32 = 0x00ff_ffff;

/// The kind of object an identity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    Thread = 1,
    Mutex = 2,
    Condition = 3,
    Queue = 4,
}

impl Kind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Kind::Thread),
            2 => Some(Kind::Mutex),
            3 => Some(Kind::Condition),
            4 => Some(Kind::Queue),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Thread => "Thread",
            Kind::Mutex => "Mutex",
            Kind::Condition => "Condition",
            Kind::Queue => "Queue",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An opaque token naming a thread, mutex, condition or queue.
///
/// A released identity stays dead until its slot has been reused 2^24 - 1
/// times; after that the 24-bit generation wraps and the old value could
/// name a new object of the same kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(u64);

impl Identity {
    pub(crate) fn new(kind: Kind, generation: u32, index: u32) -> Self {
        let raw = ((kind as u64) << KIND_SHIFT)
            | (((generation & GEN_MASK) as u64) << GEN_SHIFT)
            | index as u64;
        Self(raw)
    }

    /// Rebuild an identity from the integer another context published.
    /// Validity is only checked when the identity is attached to.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The integer form, suitable for passing across context boundaries.
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// The kind tag, or `None` for an integer that was never an identity.
    pub fn kind(self) -> Option<Kind> {
        Kind::from_tag((self.0 >> KIND_SHIFT) as u8)
    }

    pub(crate) fn generation(self) -> u32 {
        ((self.0 >> GEN_SHIFT) as u32) & GEN_MASK
    }

    pub(crate) fn index(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("kind", &self.kind())
            .field("generation", &self.generation())
            .field("index", &self.index())
            .finish()
    }
}

impl From<Identity> for u64 {
    fn from(id: Identity) -> Self {
        id.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_survive_raw_conversion() {
        let id = Identity::new(Kind::Condition, 7, 42);
        let back = Identity::from_raw(id.as_raw());
        assert_eq!(back, id);
        assert_eq!(back.kind(), Some(Kind::Condition));
        assert_eq!(back.generation(), 7);
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn generation_is_truncated_to_24_bits() {
        let id = Identity::new(Kind::Mutex, 0x0100_0003, 0);
        assert_eq!(id.generation(), 3);
        assert_eq!(id.kind(), Some(Kind::Mutex));
    }

    #[test]
    fn arbitrary_integers_have_no_kind() {
        assert_eq!(Identity::from_raw(0).kind(), None);
        assert_eq!(Identity::from_raw(0xff << 56).kind(), None);
    }

    #[test]
    fn display_is_hex() {
        let id = Identity::new(Kind::Queue, 1, 2);
        assert_eq!(id.to_string(), format!("{:#x}", id.as_raw()));
        assert!(id.to_string().starts_with("0x4"));
    }
}
