use super::*;

/// A borrowed record of any known kind, for key-dispatched encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyRecord<'a> {
    Person(&'a Person),
}

impl AnyRecord<'_> {
    pub fn key(&self) -> Key {
        match self {
            AnyRecord::Person(_) => Key::Person,
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            AnyRecord::Person(p) => p.encoded_len(),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        match self {
            AnyRecord::Person(p) => p.encode(buf),
        }
    }
}

impl<'a> From<&'a Person> for AnyRecord<'a> {
    fn from(p: &'a Person) -> Self {
        AnyRecord::Person(p)
    }
}
