use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::Confirm;
use tracing::warn;

use crate::workflows::directory::DirectoryAccount;

/// Yes/no gate consulted once per candidate before anything is touched.
pub trait Confirmation {
    fn confirm(&mut self, account: &DirectoryAccount) -> bool;
}

pub fn prompt_for(account: &DirectoryAccount) -> String {
    format!(
        "Do you want to delete teacher {} ({})?",
        account.uid, account.display_name
    )
}

/// Asks the operator on the controlling terminal. A single keypress answers
/// when stdin is a TTY; otherwise one line is read from stdin.
#[derive(Debug, Default)]
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&mut self, account: &DirectoryAccount) -> bool {
        if !(io::stdin().is_terminal() && io::stderr().is_terminal()) {
            return LineConfirmation::new(io::stdin().lock(), io::stderr()).confirm(account);
        }

        match Confirm::new()
            .with_prompt(prompt_for(account))
            .default(false)
            .interact_opt()
        {
            Ok(answer) => answer.unwrap_or(false),
            Err(err) => {
                warn!(uid = %account.uid, error = %err, "confirmation prompt failed, treating as no");
                false
            }
        }
    }
}

/// Line-oriented prompt: only `y`/`Y` confirms, end of input declines.
#[derive(Debug)]
pub struct LineConfirmation<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, account: &DirectoryAccount) -> io::Result<bool> {
        write!(self.output, "\n{} (y/n): ", prompt_for(account))?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

impl<R: BufRead, W: Write> Confirmation for LineConfirmation<R, W> {
    fn confirm(&mut self, account: &DirectoryAccount) -> bool {
        match self.ask(account) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(uid = %account.uid, error = %err, "unable to read confirmation, treating as no");
                false
            }
        }
    }
}
