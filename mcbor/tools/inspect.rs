/*!
Inspect command - display CBOR data in diagnostic notation
*/

use super::io::{Input, Output};
use clap::Parser;
use mcbor_cbor::decode::{self, Tags, Value};
use std::fmt::Write;

const MAX_DEPTH: usize = 16;

/// Inspect and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Display CBOR data in diagnostic notation", long_about = None)]
pub struct Command {
    /// Input is hexadecimal text rather than raw CBOR
    #[arg(long)]
    hex: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input CBOR file (use '-' for stdin)
    input: Input,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read_bytes(self.hex)?;
        let text = format_sequence(&data)?;
        self.output.unwrap_or(Output::Stdout).write_line(&text)?;
        Ok(())
    }
}

/// Render every item in `data`, one per line
pub fn format_sequence(data: &[u8]) -> Result<String, decode::Error> {
    let mut out = String::new();
    let mut offset = 0;
    while offset < data.len() {
        if offset > 0 {
            out.push('\n');
        }
        let (_, len) = decode::parse_value(&data[offset..], |value, _, tags| {
            write_item(&mut out, value, tags, 0)
        })?;
        offset += len;
    }
    Ok(out)
}

fn write_item(
    out: &mut String,
    value: Value,
    tags: Tags,
    depth: usize,
) -> Result<(), decode::Error> {
    if depth >= MAX_DEPTH {
        return Err(decode::Error::MaxRecursion);
    }

    let mut open_tags = 0;
    for tag in tags {
        _ = write!(out, "{tag}(");
        open_tags += 1;
    }

    match value {
        Value::UnsignedInteger(n) => {
            _ = write!(out, "{n}");
        }
        Value::NegativeInteger(n) => {
            _ = write!(out, "{}", -1 - i128::from(n));
        }
        Value::Bytes(b) => {
            _ = write!(out, "h'{}'", hex::encode(b));
        }
        Value::ByteStream(chunks) => {
            out.push_str("(_ ");
            for (i, chunk) in chunks.enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                _ = write!(out, "h'{}'", hex::encode(chunk));
            }
            out.push(')');
        }
        Value::Text(s) => write_text(out, s),
        Value::TextStream(chunks) => {
            out.push_str("(_ ");
            for (i, chunk) in chunks.enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_text(out, core::str::from_utf8(chunk)?);
            }
            out.push(')');
        }
        Value::Array(a) => {
            out.push_str(if a.is_definite() { "[" } else { "[_ " });
            let mut first = true;
            loop {
                let sep = if first { "" } else { ", " };
                let item = a.try_parse_value(|value, _, tags| {
                    out.push_str(sep);
                    write_item(out, value, tags, depth + 1)
                })?;
                if item.is_none() {
                    break;
                }
                first = false;
            }
            out.push(']');
        }
        Value::Map(m) => {
            out.push_str(if m.is_definite() { "{" } else { "{_ " });
            let mut first = true;
            loop {
                let sep = if first { "" } else { ", " };
                let key = m.try_parse_value(|value, _, tags| {
                    out.push_str(sep);
                    write_item(out, value, tags, depth + 1)
                })?;
                if key.is_none() {
                    break;
                }
                out.push_str(": ");
                m.parse_value(|value, _, tags| write_item(out, value, tags, depth + 1))?;
                first = false;
            }
            out.push('}');
        }
        Value::False => out.push_str("false"),
        Value::True => out.push_str("true"),
        Value::Null => out.push_str("null"),
        Value::Undefined => out.push_str("undefined"),
        Value::Simple(v) => {
            _ = write!(out, "simple({v})");
        }
        Value::Float(f) => {
            if f.is_nan() {
                out.push_str("NaN");
            } else if f.is_infinite() {
                out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
            } else {
                _ = write!(out, "{f:?}");
            }
        }
    }

    for _ in 0..open_tags {
        out.push(')');
    }
    Ok(())
}

fn write_text(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod test {
    use super::*;

    fn diag(hex: &str) -> String {
        format_sequence(&hex::decode(hex).unwrap()).unwrap()
    }

    #[test]
    fn test_person() {
        assert_eq!(
            diag("830048416c69636500000007"),
            "[0, h'416c696365000000', 7]"
        );
    }

    #[test]
    fn test_items() {
        assert_eq!(diag("20"), "-1");
        assert_eq!(diag("3bffffffffffffffff"), "-18446744073709551616");
        assert_eq!(diag("6161"), "\"a\"");
        assert_eq!(diag("62225c"), "\"\\\"\\\\\"");
        assert_eq!(diag("f4f5f6f7"), "false\ntrue\nnull\nundefined");
        assert_eq!(diag("f0"), "simple(16)");
        assert_eq!(diag("f93e00"), "1.5");
        assert_eq!(diag("f97c00"), "Infinity");
        assert_eq!(diag("f97e00"), "NaN");
        assert_eq!(diag("c11a514b67b0"), "1(1363896240)");
    }

    #[test]
    fn test_containers() {
        assert_eq!(diag("80"), "[]");
        assert_eq!(diag("a201020304"), "{1: 2, 3: 4}");
        assert_eq!(diag("9f018202039f0405ffff"), "[_ 1, [2, 3], [_ 4, 5]]");
        assert_eq!(diag("bf61610161629f0203ffff"), "{_ \"a\": 1, \"b\": [_ 2, 3]}");
        assert_eq!(diag("5f42010243030405ff"), "(_ h'0102', h'030405')");
        assert_eq!(diag("7f657374726561646d696e67ff"), "(_ \"strea\", \"ming\")");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            format_sequence(&hex::decode("8301").unwrap()),
            Err(decode::Error::NotEnoughData)
        );
        let nested = [0x81u8; MAX_DEPTH + 1];
        assert_eq!(format_sequence(&nested), Err(decode::Error::MaxRecursion));
    }
}
