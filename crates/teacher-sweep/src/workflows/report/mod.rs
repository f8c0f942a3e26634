mod summary;

use std::io::{self, Write};

use serde::Serialize;

use crate::workflows::deprovision::CandidateDecision;
use crate::workflows::directory::DirectoryAccount;

pub use summary::{CandidateReport, CandidateVerdict, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Terminal sink for the run. Text mode prints as the run progresses; JSON mode
/// stays silent until [`Reporter::finish`] writes the whole summary.
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    pub fn inventory_degraded(&mut self) -> io::Result<()> {
        if self.text() {
            writeln!(
                self.out,
                "\nWarning: the LDAP inventory could not be loaded; no account can be reconciled in this run."
            )?;
        }
        Ok(())
    }

    pub fn nothing_to_do(&mut self) -> io::Result<()> {
        if self.text() {
            writeln!(self.out, "\nAll teachers in LDAP are in the XML.")?;
        }
        Ok(())
    }

    pub fn intro(&mut self, candidates: usize) -> io::Result<()> {
        if self.text() {
            writeln!(
                self.out,
                "\n{candidates} teacher(s) in LDAP are missing from the XML."
            )?;
            writeln!(
                self.out,
                "You are about to proceed with individual user deletion."
            )?;
            writeln!(
                self.out,
                "For each user, you will be asked if you want to delete them."
            )?;
        }
        Ok(())
    }

    pub fn candidate(
        &mut self,
        account: &DirectoryAccount,
        decision: &CandidateDecision,
    ) -> io::Result<()> {
        if !self.text() {
            return Ok(());
        }

        match decision {
            CandidateDecision::Declined => writeln!(
                self.out,
                "  Teacher {} ({}) not deleted.",
                account.uid, account.display_name
            ),
            CandidateDecision::Deprovisioned(outcome) if outcome.fully_succeeded() => writeln!(
                self.out,
                "  {}: User and directory successfully deleted.",
                account.uid
            ),
            CandidateDecision::Deprovisioned(outcome) => {
                writeln!(
                    self.out,
                    "  {}: {} - {}",
                    account.uid, account.display_name, outcome.filesystem_message
                )?;
                writeln!(self.out, "     LDAP: {}", outcome.directory_message)
            }
        }
    }

    pub fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                if summary.candidate_count > 0 {
                    writeln!(
                        self.out,
                        "\nSummary: {} candidate(s), {} deleted, {} partially deleted, {} failed, {} not deleted.",
                        summary.candidate_count,
                        summary.count(CandidateVerdict::Deleted),
                        summary.count(CandidateVerdict::PartiallyDeleted),
                        summary.count(CandidateVerdict::Failed),
                        summary.count(CandidateVerdict::Declined),
                    )?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, summary).map_err(io::Error::from)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }
}
