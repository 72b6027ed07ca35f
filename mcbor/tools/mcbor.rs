/*!
mcbor - A CLI for working with mcbor records

# Commands

- `encode`: Encode a person from arguments or JSON
- `decode`: Decode and validate an encoded person
- `len`: Print the encoded length of a person
- `inspect`: Display any CBOR data in diagnostic notation

# Examples

```bash
# Encode a person as hex
mcbor encode --name Alice --id 7 --format hex

# Round-trip through a file
mcbor encode --name Alice --id 7 -o alice.cbor
mcbor decode alice.cbor

# Decode hex from stdin
echo 830048416c69636500000007 | mcbor decode --hex -

# Inspect the wire format
mcbor inspect alice.cbor
```
*/

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod decode;
mod encode;
mod inspect;
mod io;
mod len;
mod settings;

/// A CLI tool for working with mcbor records
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A CLI tool for encoding, decoding and inspecting mcbor records"
)]
struct Cli {
    /// Use a custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a person record
    Encode(encode::Command),

    /// Decode a person record
    Decode(decode::Command),

    /// Print the encoded length of a person record
    Len(len::Command),

    /// Display CBOR data in diagnostic notation
    Inspect(inspect::Command),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = settings::init(cli.config.as_deref())?;
    match cli.command {
        Commands::Encode(args) => args.exec(&settings),
        Commands::Decode(args) => args.exec(),
        Commands::Len(args) => args.exec(),
        Commands::Inspect(args) => args.exec(),
    }
}
