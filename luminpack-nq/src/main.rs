mod parser;
mod schema;
mod value;

use anyhow::{Context, Result};
use luminpack::{BufferPool, Evaluator, ParserRegistry, Reader, SegmentedBuffer, SerializerOptions, StringEncoding,
    StringRecording, Writer};
use std::io::{self, Read, Write};
use std::str::from_utf8;
use structopt::StructOpt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Decode, encode and measure luminpack messages. The wire format is not self-describing, so every command needs
/// the schema the message is laid out with.
#[derive(StructOpt)]
#[structopt(name = "nq", author = "Liv Fischer")]
enum Opt {
    /// read a binary message from stdin and pretty print it
    Decode(Format),
    /// parse a textual value from stdin and write its binary encoding to stdout
    Encode(Format),
    /// parse a textual value from stdin and print the size of its encoding
    Size(Format),
}

#[derive(StructOpt)]
struct Format {
    /// layout of the message, e.g. "(u32, string?, [f64])"
    #[structopt(short, long)]
    schema: String,
    /// string encoding: utf8 or utf16
    #[structopt(short, long, default_value = "utf8")]
    encoding: StringEncoding,
    /// string recording: length or token
    #[structopt(short, long, default_value = "length")]
    recording: StringRecording,
    /// binary input and output is base64 encoded
    #[structopt(short, long)]
    base64: bool,
}

impl Format {
    fn options(&self) -> SerializerOptions {
        SerializerOptions::new(self.encoding, self.recording)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let opt = Opt::from_args();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    debug!(bytes = buffer.len(), "read stdin");
    match opt {
        Opt::Decode(format) => decode(&format, &buffer),
        Opt::Encode(format) => encode(&format, &buffer),
        Opt::Size(format)   => size(&format, &buffer),
    }
}

fn decode(format: &Format, buffer: &[u8]) -> Result<()> {
    let schema = parser::parse_schema(&format.schema)?;
    let bytes = if format.base64 {
        base64::decode(from_utf8(buffer).context("input is not utf-8")?.trim()).context("input is not base64")?
    } else {
        buffer.to_vec()
    };
    let registry = ParserRegistry::new();
    let mut reader = Reader::new(&bytes, &registry, format.options());
    let value = schema::decode(&schema, &mut reader)
        .with_context(|| format!("Decoding error at byte {}", reader.position()))?;
    reader.ensure_consumed().context("Decoding error")?;
    debug!(%schema, bytes = bytes.len(), "decoded");
    println!("{}", value);
    Ok(())
}

fn encode(format: &Format, buffer: &[u8]) -> Result<()> {
    let schema = parser::parse_schema(&format.schema)?;
    let value = parser::parse_value(from_utf8(buffer).context("input is not utf-8")?)?;
    let registry = ParserRegistry::new();
    let mut output = SegmentedBuffer::new(BufferPool::shared());
    let mut writer = Writer::new(&mut output, &registry, format.options());
    schema::encode(&schema, &value, &mut writer).context("Encoding error")?;
    let written = writer.finish();
    debug!(%schema, bytes = written, "encoded");
    let bytes = output.to_vec();
    let mut stdout = io::stdout();
    if format.base64 {
        writeln!(stdout, "{}", base64::encode(&bytes))?;
    } else {
        stdout.write_all(&bytes)?;
    }
    Ok(stdout.flush()?)
}

fn size(format: &Format, buffer: &[u8]) -> Result<()> {
    let schema = parser::parse_schema(&format.schema)?;
    let value = parser::parse_value(from_utf8(buffer).context("input is not utf-8")?)?;
    let registry = ParserRegistry::new();
    let mut size = 0;
    schema::encode(&schema, &value, &mut Evaluator::new(&mut size, &registry, format.options()))
        .context("Encoding error")?;
    println!("{}", size);
    Ok(())
}
