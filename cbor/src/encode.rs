use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Buffer too small for encoded value: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Invalid simple value {0}, use bool, Null or Undefined")]
    InvalidSimpleValue(u8),
}

/// Destination for encoded bytes.
///
/// Implementations must either accept all of `data` or none of it.
pub trait Writer {
    fn write(&mut self, data: &[u8]) -> Result<(), Error>;

    fn position(&self) -> usize;
}

/// Writes into a caller-owned slice, never past its end.
pub struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Writer for Cursor<'_> {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        let end = self.pos + data.len();
        let Some(dst) = self.buf.get_mut(self.pos..end) else {
            return Err(Error::BufferTooSmall {
                needed: end,
                available: self.buf.len(),
            });
        };
        dst.copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Counts the bytes an encoding would produce without storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sizer {
    len: usize,
}

impl Writer for Sizer {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.len += data.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.len
    }
}

pub trait ToCbor {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error>;
}

pub struct Encoder<W: Writer> {
    writer: W,
}

impl<W: Writer> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    pub fn offset(&self) -> usize {
        self.writer.position()
    }

    fn emit_uint_minor(&mut self, major: u8, val: u64) -> Result<(), Error> {
        if val < 24 {
            self.writer.write(&[(major << 5) | (val as u8)])
        } else if val <= u8::MAX as u64 {
            self.writer.write(&[(major << 5) | 24u8, val as u8])
        } else if val <= u16::MAX as u64 {
            let b = (val as u16).to_be_bytes();
            self.writer.write(&[(major << 5) | 25u8, b[0], b[1]])
        } else if val <= u32::MAX as u64 {
            let b = (val as u32).to_be_bytes();
            self.writer
                .write(&[(major << 5) | 26u8, b[0], b[1], b[2], b[3]])
        } else {
            let b = val.to_be_bytes();
            self.writer.write(&[
                (major << 5) | 27u8,
                b[0],
                b[1],
                b[2],
                b[3],
                b[4],
                b[5],
                b[6],
                b[7],
            ])
        }
    }

    pub fn emit<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        value.to_cbor(self)
    }

    /// Emit only the head of an array, the caller is responsible for the items
    pub fn emit_array_header(&mut self, count: Option<usize>) -> Result<(), Error> {
        match count {
            Some(count) => self.emit_uint_minor(4, count as u64),
            None => self.writer.write(&[(4 << 5) | 31]),
        }
    }

    /// Emit only the head of a map, the caller is responsible for the pairs
    pub fn emit_map_header(&mut self, count: Option<usize>) -> Result<(), Error> {
        match count {
            Some(count) => self.emit_uint_minor(5, count as u64),
            None => self.writer.write(&[(5 << 5) | 31]),
        }
    }

    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Array<W>) -> Result<(), Error>,
    {
        let mut a = Array::new(self, count)?;
        f(&mut a)?;
        a.end()
    }

    pub fn emit_map<F>(&mut self, count: Option<usize>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Map<W>) -> Result<(), Error>,
    {
        let mut m = Map::new(self, count)?;
        f(&mut m)?;
        m.end()
    }
}

pub struct Sequence<'a, W: Writer, const D: usize> {
    encoder: &'a mut Encoder<W>,
    start: usize,
    count: Option<usize>,
    idx: usize,
}

pub type Array<'a, W> = Sequence<'a, W, 1>;
pub type Map<'a, W> = Sequence<'a, W, 2>;

impl<'a, W: Writer, const D: usize> Sequence<'a, W, D> {
    fn new(encoder: &'a mut Encoder<W>, count: Option<usize>) -> Result<Self, Error> {
        let start = encoder.offset();
        if D == 1 {
            encoder.emit_array_header(count)?;
        } else {
            encoder.emit_map_header(count)?;
        }
        Ok(Self {
            start,
            encoder,
            count: count.map(|c| c * D),
            idx: 0,
        })
    }

    pub fn offset(&self) -> usize {
        self.encoder.offset() - self.start
    }

    fn next_field(&mut self) -> &mut Encoder<W> {
        self.idx += 1;
        match self.count {
            Some(count) if self.idx > count => {
                panic!("Too many items added to definite length sequence")
            }
            _ => {}
        };
        self.encoder
    }

    fn end(self) -> Result<(), Error> {
        let Some(count) = self.count else {
            return self.encoder.writer.write(&[0xFF]);
        };
        if self.idx != count {
            panic!(
                "Definite length sequence is short of items: {}, expected {}",
                self.idx, count
            );
        }
        Ok(())
    }

    pub fn emit<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        self.next_field().emit(value)
    }

    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Array<W>) -> Result<(), Error>,
    {
        self.next_field().emit_array(count, f)
    }

    pub fn emit_map<F>(&mut self, count: Option<usize>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Map<W>) -> Result<(), Error>,
    {
        self.next_field().emit_map(count, f)
    }
}

macro_rules! impl_uint_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
                    encoder.emit_uint_minor(0, *self as u64)
                }
            }
        )*
    };
}

impl_uint_to_cbor!(u8, u16, u32, u64, usize);

fn emit_i64<W: Writer>(encoder: &mut Encoder<W>, val: i64) -> Result<(), Error> {
    if val >= 0 {
        encoder.emit_uint_minor(0, val as u64)
    } else {
        // -1 - val cannot overflow, unlike abs(i64::MIN)
        encoder.emit_uint_minor(1, !(val as u64))
    }
}

macro_rules! impl_int_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
                    emit_i64(encoder, *self as i64)
                }
            }
        )*
    };
}

impl_int_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for bool {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        encoder
            .writer
            .write(&[(7 << 5) | if *self { 21 } else { 20 }])
    }
}

/// The CBOR `null` simple value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Null;

impl ToCbor for Null {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        encoder.writer.write(&[(7 << 5) | 22])
    }
}

/// The CBOR `undefined` simple value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undefined;

impl ToCbor for Undefined {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        encoder.writer.write(&[(7 << 5) | 23])
    }
}

/// An unassigned simple value, 0..=19 or 32..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simple(pub u8);

impl ToCbor for Simple {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        match self.0 {
            20..=31 => Err(Error::InvalidSimpleValue(self.0)),
            v => encoder.emit_uint_minor(7, v as u64),
        }
    }
}

impl ToCbor for str {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        encoder.emit_uint_minor(3, self.len() as u64)?;
        encoder.writer.write(self.as_bytes())
    }
}

impl ToCbor for [u8] {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        encoder.emit_uint_minor(2, self.len() as u64)?;
        encoder.writer.write(self)
    }
}

impl<const N: usize> ToCbor for [u8; N] {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        self.as_slice().to_cbor(encoder)
    }
}

impl<T> ToCbor for &T
where
    T: ToCbor + ?Sized,
{
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), Error> {
        (**self).to_cbor(encoder)
    }
}

/// Exact number of bytes `emit` writes for `value`.
pub fn emitted_len<T>(value: &T) -> usize
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::new(Sizer::default());
    // Sizer never rejects a write, and any value error resurfaces from `emit`
    _ = e.emit(value);
    e.offset()
}

/// Encode `value` into `buf`, returning the number of bytes written.
///
/// The length is checked before anything is written, so on
/// `Error::BufferTooSmall` the contents of `buf` are unchanged.
pub fn emit<T>(value: &T, buf: &mut [u8]) -> Result<usize, Error>
where
    T: ToCbor + ?Sized,
{
    let needed = emitted_len(value);
    if needed > buf.len() {
        return Err(Error::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    let mut e = Encoder::new(Cursor::new(buf));
    e.emit(value)?;
    Ok(e.offset())
}
