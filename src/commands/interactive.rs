//! Interactive user prompting

use std::io::{self, BufRead, Write};

use crate::error::Result;

/// Prompt for yes/no confirmation on stdin.
///
/// Returns `true` only for `y`/`yes`; anything else, including an empty
/// line or closed stdin, declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    read_answer(io::stdin().lock())
}

fn read_answer(mut input: impl BufRead) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
