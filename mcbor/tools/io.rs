/*!
Reading records from files or stdin, and writing them to files or stdout
*/

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Input source - either stdin or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        match self {
            Input::Stdin => {
                let mut buffer = Vec::new();
                io::stdin().read_to_end(&mut buffer)?;
                Ok(buffer)
            }
            Input::File(path) => fs::read(path),
        }
    }

    /// Read the input, treating it as hex text when `hex` is set
    pub fn read_bytes(&self, hex: bool) -> anyhow::Result<Vec<u8>> {
        let data = self.read_all()?;
        if !hex {
            return Ok(data);
        }
        let text = String::from_utf8(data)?;
        let digits: String = text.split_whitespace().collect();
        Ok(hex::decode(digits)?)
    }
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Input::Stdin)
        } else {
            Ok(Input::File(PathBuf::from(s)))
        }
    }
}

/// Output destination - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    pub fn write_all(&self, data: &[u8]) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(data)?;
                stdout.flush()
            }
            Output::File(path) => fs::write(path, data),
        }
    }

    /// Write a line of text, adding the newline only on a terminal stream
    pub fn write_line(&self, text: &str) -> io::Result<()> {
        match self {
            Output::Stdout => self.write_all(format!("{text}\n").as_bytes()),
            Output::File(_) => self.write_all(text.as_bytes()),
        }
    }
}

impl FromStr for Output {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "-" {
            Ok(Output::Stdout)
        } else {
            Ok(Output::File(PathBuf::from(s)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("-".parse::<Input>(), Ok(Input::Stdin));
        assert_eq!(
            "a.cbor".parse::<Input>(),
            Ok(Input::File(PathBuf::from("a.cbor")))
        );
        assert_eq!("".parse::<Output>(), Ok(Output::Stdout));
        assert_eq!("-".parse::<Output>(), Ok(Output::Stdout));
    }

    #[test]
    fn test_hex_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.hex");
        fs::write(&path, "8300 4841 6c69 6365 0000 00\n07\n").unwrap();

        let input = Input::File(path);
        assert_eq!(
            input.read_bytes(true).unwrap(),
            hex::decode("830048416c69636500000007").unwrap()
        );
        assert_eq!(input.read_bytes(false).unwrap().len(), 31);

        fs::write(dir.path().join("bad.hex"), "83zz").unwrap();
        assert!(
            Input::File(dir.path().join("bad.hex"))
                .read_bytes(true)
                .is_err()
        );
    }
}
