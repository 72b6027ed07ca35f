use super::decode::*;

/// A cursor over the items of an array (`D == 1`) or map (`D == 2`).
///
/// `offset` is absolute within `data`, and is handed back to the enclosing
/// `try_parse_value` once the caller is done with the sequence.
#[derive(Debug)]
pub struct Sequence<'a, const D: usize> {
    data: &'a [u8],
    count: Option<usize>,
    offset: usize,
    parsed: usize,
}

pub type Array<'a> = Sequence<'a, 1>;
pub type Map<'a> = Sequence<'a, 2>;

impl<'a, const D: usize> Sequence<'a, D> {
    pub(super) fn new(data: &'a [u8], count: Option<usize>, offset: usize) -> Self {
        Self {
            data,
            count,
            offset,
            parsed: 0,
        }
    }

    /// Number of items (or pairs, for a map), if definite
    pub fn len(&self) -> Option<usize> {
        self.count.map(|c| c / D)
    }

    pub fn is_empty(&self) -> bool {
        self.count == Some(0)
    }

    pub fn is_definite(&self) -> bool {
        self.count.is_some()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn check_for_end(&mut self) -> Result<bool, Error> {
        if let Some(count) = self.count {
            Ok(self.parsed >= count)
        } else {
            match self.data.get(self.offset) {
                None => Err(Error::NotEnoughData),
                Some(0xFF) => {
                    if self.parsed % D != 0 {
                        Err(Error::PartialMap)
                    } else {
                        self.offset += 1;
                        self.count = Some(self.parsed);
                        Ok(true)
                    }
                }
                Some(_) => Ok(false),
            }
        }
    }

    pub fn at_end(&mut self) -> Result<bool, Error> {
        self.check_for_end()
    }

    pub(super) fn complete(&mut self) -> Result<(), Error> {
        if !self.check_for_end()? {
            return Err(Error::AdditionalItems);
        }
        Ok(())
    }

    /// Consume the remaining items, descending at most `max_recursion`
    /// levels into any nested arrays or maps.
    pub fn skip_to_end(&mut self, max_recursion: usize) -> Result<(), Error> {
        while self
            .try_parse_value(|mut value, _, _| value.skip(max_recursion))?
            .is_some()
        {}
        Ok(())
    }

    pub fn try_parse_value<T, F, E>(&mut self, f: F) -> Result<Option<(T, usize)>, E>
    where
        F: FnOnce(Value<'a, '_>, bool, Tags<'a>) -> Result<T, E>,
        E: From<Error>,
    {
        // Check for end of sequence
        if self.check_for_end()? {
            return Ok(None);
        }

        // Parse sub-item
        let data: &'a [u8] = self.data;
        let r = try_parse_value(&data[self.offset..], f)?;
        match r {
            Some((r, len)) => {
                self.parsed += 1;
                self.offset += len;
                Ok(Some((r, len)))
            }
            // A definite sequence that runs out of data is truncated
            None => Err(Error::NotEnoughData.into()),
        }
    }

    pub fn parse_value<T, F, E>(&mut self, f: F) -> Result<(T, usize), E>
    where
        F: FnOnce(Value<'a, '_>, bool, Tags<'a>) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(f)?.ok_or(Error::NotEnoughData.into())
    }

    pub fn try_parse<T>(&mut self) -> Result<Option<T>, T::Error>
    where
        T: FromCbor,
    {
        if self.check_for_end()? {
            return Ok(None);
        }

        match T::try_from_cbor(&self.data[self.offset..])? {
            Some((value, _, len)) => {
                self.parsed += 1;
                self.offset += len;
                Ok(Some(value))
            }
            None => Err(Error::NotEnoughData.into()),
        }
    }

    pub fn parse<T>(&mut self) -> Result<T, T::Error>
    where
        T: FromCbor,
    {
        self.try_parse::<T>()?.ok_or(Error::NotEnoughData.into())
    }

    pub fn try_parse_array<T, F, E>(&mut self, f: F) -> Result<Option<(T, usize)>, E>
    where
        F: FnOnce(&mut Array<'a>, bool, Tags<'a>) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(|value, shortest, tags| match value {
            Value::Array(a) => f(a, shortest, tags),
            value => Err(Error::IncorrectType("Array", value.type_name()).into()),
        })
    }

    pub fn parse_array<T, F, E>(&mut self, f: F) -> Result<(T, usize), E>
    where
        F: FnOnce(&mut Array<'a>, bool, Tags<'a>) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_array(f)?.ok_or(Error::NotEnoughData.into())
    }
}
