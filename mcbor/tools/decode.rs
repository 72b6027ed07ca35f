/*!
Decode command - validate an encoded person and display it
*/

use super::io::{Input, Output};
use anyhow::Context;
use clap::Parser;
use mcbor::Person;
use tracing::debug;

/// Decode a person record
#[derive(Parser, Debug)]
#[command(about = "Decode and validate a person record", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    format: Format,

    /// Input is hexadecimal text rather than raw CBOR
    #[arg(long)]
    hex: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input file (use '-' for stdin)
    input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    /// JSON, the name as text
    Json,
    /// Rust debug format, the name as raw bytes
    Debug,
}

pub fn decode(data: &[u8]) -> anyhow::Result<Person> {
    mcbor::decode_diagnosed::<Person>(data)
        .inspect_err(|d| debug!(code = d.code(), "Decode failed"))
        .context("Invalid person record")
}

fn render(person: &Person, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => serde_json::to_string_pretty(person)
            .context("Name is not valid UTF-8, try '--format debug'"),
        Format::Debug => Ok(format!("{person:#?}")),
    }
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read_bytes(self.hex)?;
        let person = decode(&data)?;
        let text = render(&person, self.format)?;
        self.output.unwrap_or(Output::Stdout).write_line(&text)?;
        Ok(())
    }
}
