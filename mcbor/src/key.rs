use super::*;

/// Identifies the schema a buffer encodes.
///
/// Values are part of the wire format and the C ABI (`CBOR_KEY`), and must
/// never be renumbered.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Person = 0,
}

impl Key {
    pub const ALL: [Key; 1] = [Key::Person];

    pub const fn id(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Key::Person => "person",
        }
    }
}

impl TryFrom<u64> for Key {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Key::ALL
            .into_iter()
            .find(|k| u64::from(k.id()) == value)
            .ok_or(Error::InvalidKey(value))
    }
}

impl TryFrom<u32> for Key {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Key::try_from(u64::from(value))
    }
}

impl core::fmt::Display for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
