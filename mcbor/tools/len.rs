/*!
Len command - the exact size of an encoded person
*/

use super::encode::person_from_args;
use super::io::Output;
use clap::Parser;
use mcbor::Record;

/// Print the encoded length of a person record
#[derive(Parser, Debug)]
#[command(about = "Print the encoded length of a person record", long_about = None)]
pub struct Command {
    /// Name, clipped to 8 bytes at a character boundary
    #[arg(long, default_value = "")]
    name: String,

    /// Identifier
    #[arg(long, default_value_t = 0)]
    id: u8,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let len = person_from_args(&self.name, self.id).encoded_len();
        Output::Stdout.write_line(&len.to_string())?;
        Ok(())
    }
}
