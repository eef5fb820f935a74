use clap::Parser;

/// Remote filesystem and process agent.
///
/// Speaks CBOR-framed requests on stdin and streams CBOR-framed replies on
/// its secondary output stream (stderr).
#[derive(Debug, Parser)]
#[command(name = "fsagent", version, about)]
pub struct Cli {
    /// Run a small built-in request batch and pretty-print replies to
    /// stderr instead of reading stdin / emitting framed binary output.
    #[arg(long)]
    pub test: bool,

    /// Write a sample CBOR-encoded request batch to stdout and exit,
    /// useful for hand-crafting fixtures for `--test`.
    #[arg(long)]
    pub write: bool,
}
