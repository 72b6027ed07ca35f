/*!
Encode command - build a person record and write its encoding
*/

use super::io::{Input, Output};
use super::settings::Settings;
use anyhow::anyhow;
use clap::Parser;
use mcbor::{Person, Record};
use serde::Deserialize;
use tracing::{debug, warn};

/// Encode a person record
#[derive(Parser, Debug)]
#[command(about = "Encode a person record", long_about = None)]
pub struct Command {
    /// Name, clipped to 8 bytes at a character boundary
    #[arg(long, required_unless_present = "json", conflicts_with = "json")]
    name: Option<String>,

    /// Identifier
    #[arg(long, default_value_t = 0, conflicts_with = "json")]
    id: u8,

    /// Read the person as JSON from FILE (use '-' for stdin)
    #[arg(long, value_name = "FILE")]
    json: Option<Input>,

    /// Output format (default: the configured 'output_format')
    #[arg(long, value_name = "FORMAT")]
    format: Option<Format>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Raw CBOR bytes
    #[default]
    Binary,
    /// Hexadecimal text
    Hex,
}

/// Build a person from command line values, warning if the name is clipped.
pub fn person_from_args(name: &str, id: u8) -> Person {
    let person = Person::new(name, id);
    if person.name_bytes().len() < name.len() {
        warn!("Name '{name}' clipped to {} bytes", Person::NAME_LEN);
    }
    person
}

pub fn encode(person: &Person) -> Result<Vec<u8>, mcbor::Error> {
    let mut buf = vec![0; person.encoded_len()];
    let len = person.encode(&mut buf)?;
    buf.truncate(len);
    Ok(buf)
}

impl Command {
    fn person(&self) -> anyhow::Result<Person> {
        match (&self.json, &self.name) {
            (Some(input), _) => Ok(serde_json::from_slice(&input.read_all()?)?),
            (None, Some(name)) => Ok(person_from_args(name, self.id)),
            (None, None) => Err(anyhow!("Either --name or --json is required")),
        }
    }

    pub fn exec(self, settings: &Settings) -> anyhow::Result<()> {
        let person = self.person()?;
        let encoded = encode(&person)?;
        debug!("Encoded {person:?} into {} bytes", encoded.len());

        let output = self.output.unwrap_or(Output::Stdout);
        match self.format.unwrap_or(settings.output_format) {
            Format::Binary => output.write_all(&encoded)?,
            Format::Hex => output.write_line(&hex::encode(&encoded))?,
        }
        Ok(())
    }
}
