use super::*;

const FIELDS: &[Field] = &[
    Field {
        name: "name",
        kind: FieldKind::Bytes(Person::NAME_LEN),
    },
    Field {
        name: "id",
        kind: FieldKind::Uint(Width::W8),
    },
];

/// The `person` record, laid out exactly as the C `struct person`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Person {
    /// NUL-padded, not necessarily NUL-terminated
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "ser_name", deserialize_with = "de_name")
    )]
    pub name: [u8; 8],
    pub id: u8,
}

impl Person {
    pub const NAME_LEN: usize = 8;

    /// Build a person from a text name, truncated to fit at a character
    /// boundary and NUL padded.
    pub fn new(name: &str, id: u8) -> Self {
        let mut p = Self {
            name: [0; Self::NAME_LEN],
            id,
        };
        p.set_name(name);
        p
    }

    pub fn set_name(&mut self, name: &str) {
        let name = error::clip(name, Self::NAME_LEN);
        self.name = [0; Self::NAME_LEN];
        self.name[..name.len()].copy_from_slice(name.as_bytes());
    }

    /// The name up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(Self::NAME_LEN);
        &self.name[..end]
    }

    /// The name up to the first NUL, if it is valid UTF-8
    pub fn name_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.name_bytes())
    }
}

impl Record for Person {
    const SCHEMA: Schema = Schema {
        name: "person",
        key: Key::Person,
        fields: FIELDS,
    };

    fn field(&self, index: usize) -> FieldValue<'_> {
        match index {
            0 => FieldValue::Bytes(&self.name),
            _ => FieldValue::Uint(self.id.into()),
        }
    }

    fn set_field(&mut self, index: usize, value: FieldValue<'_>) -> Result<(), Mismatch> {
        match (index, value) {
            (0, FieldValue::Bytes(b)) => {
                self.name = b.try_into().map_err(|_| Mismatch::Width {
                    expected: Self::NAME_LEN,
                    found: b.len(),
                })?;
            }
            (1, FieldValue::Uint(v)) => {
                self.id = u8::try_from(v).map_err(|_| Mismatch::Range {
                    max: u8::MAX.into(),
                    found: v,
                })?;
            }
            (index, value) => {
                return Err(Mismatch::Type {
                    expected: FIELDS
                        .get(index)
                        .map_or("nothing", |f| f.kind.type_name()),
                    found: value.type_name(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
fn ser_name<S>(name: &[u8; 8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
    match core::str::from_utf8(&name[..end]) {
        Ok(s) => serializer.serialize_str(s),
        Err(e) => Err(serde::ser::Error::custom(e)),
    }
}

#[cfg(feature = "serde")]
fn de_name<'de, D>(deserializer: D) -> Result<[u8; 8], D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct NameVisitor;

    impl serde::de::Visitor<'_> for NameVisitor {
        type Value = [u8; 8];

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            write!(f, "a name of at most {} bytes", Person::NAME_LEN)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Person::new(v, 0).name)
        }
    }

    deserializer.deserialize_str(NameVisitor)
}
