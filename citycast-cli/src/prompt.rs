use anyhow::{Context, Result};
use std::io::{BufRead, IsTerminal};

const PROMPT: &str = "Enter the city name:";

/// Ask once for a city name. Uses an interactive prompt on a terminal and a
/// single line from stdin otherwise.
pub fn city_name() -> Result<String> {
    let stdin = std::io::stdin();

    if stdin.is_terminal() {
        let answer = inquire::Text::new(PROMPT)
            .prompt()
            .context("Failed to read city name")?;
        return Ok(answer.trim().to_string());
    }

    read_line(stdin.lock())
}

fn read_line(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read city name from stdin")?;

    Ok(line.trim().to_string())
}
