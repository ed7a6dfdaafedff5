//! Subcommand implementations

pub mod copy;
pub mod duration;
pub mod scan;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};

/// Read a whole input file, or stdin when `input` is `-`
pub(crate) fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))
    }
}
