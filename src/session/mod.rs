//! The interactive question loop.

#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::chain::QueryEngine;
use crate::conversation::ConversationLog;

pub const PROMPT: &str = ">>> ";

/// True for the input that ends the session
#[inline]
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

pub struct ChatSession<'a> {
    engine: &'a dyn QueryEngine,
    history: Option<&'a ConversationLog>,
}

impl<'a> ChatSession<'a> {
    #[inline]
    pub fn new(engine: &'a dyn QueryEngine, history: Option<&'a ConversationLog>) -> Self {
        Self { engine, history }
    }

    /// Answer `initial_query` if given, then prompt until `exit` or end of input.
    ///
    /// Returns the number of questions answered.
    pub async fn run<R, W>(
        &self,
        initial_query: Option<&str>,
        mut input: R,
        mut output: W,
    ) -> Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        let mut answered = 0;

        if let Some(query) = initial_query {
            self.ask(query, &mut output).await?;
            answered += 1;
        }

        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}").context("Failed to write prompt")?;
            output.flush().context("Failed to flush prompt")?;

            line.clear();
            let read = input.read_line(&mut line).context("Failed to read input")?;
            if read == 0 {
                debug!("Input closed, ending session");
                writeln!(output).context("Failed to write output")?;
                break;
            }

            if is_exit_command(&line) {
                break;
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }

            self.ask(query, &mut output).await?;
            answered += 1;
        }

        Ok(answered)
    }

    /// Answer a single question without prompting, logging it like any other exchange
    pub async fn ask<W: Write>(&self, query: &str, output: &mut W) -> Result<()> {
        let answer = self.engine.answer(query).await?;
        writeln!(output, "{answer}").context("Failed to write answer")?;

        if let Some(history) = self.history {
            history.log_exchange(query, &answer).await?;
        }

        Ok(())
    }
}
