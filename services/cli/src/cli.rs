use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use teacher_sweep::config::AppConfig;
use teacher_sweep::error::AppError;
use teacher_sweep::telemetry;
use teacher_sweep::workflows::deprovision::{Deprovisioner, LocalFilesystem, TerminalConfirmation};
use teacher_sweep::workflows::directory::{load_inventory, LdapDirectory};
use teacher_sweep::workflows::report::{OutputFormat, Reporter};
use teacher_sweep::workflows::roster::RosterReader;
use teacher_sweep::workflows::sweep::run_sweep;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "clean-teachers",
    about = "Remove LDAP teacher accounts (and their home directories) that no longer appear in the roster",
    version
)]
struct Cli {
    /// Roster XML document listing the active teachers
    roster: PathBuf,
    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
    /// Override the configured log filter (APP_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(level) = cli.log_level {
        config.telemetry.log_level = level;
    }

    telemetry::init(&config.telemetry)?;

    let roster = RosterReader::from_path(&cli.roster)?;
    info!(path = %cli.roster.display(), logins = roster.len(), "roster loaded");

    let directory = LdapDirectory::new(&config.directory)?;
    let inventory = load_inventory(&directory, &config.directory)?;

    let mut deprovisioner = Deprovisioner::new(
        Box::new(directory),
        Box::new(LocalFilesystem),
        config.directory.clone(),
    );
    let mut confirmation = TerminalConfirmation;
    let mut reporter = Reporter::new(io::stdout().lock(), cli.format.into());

    run_sweep(
        &roster,
        &inventory,
        &mut deprovisioner,
        &mut confirmation,
        &mut reporter,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn requires_exactly_one_roster_path() {
        let missing = Cli::try_parse_from(["clean-teachers"]).expect_err("roster required");
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);

        let extra = Cli::try_parse_from(["clean-teachers", "a.xml", "b.xml"])
            .expect_err("only one roster");
        assert_eq!(extra.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn parses_roster_and_format() {
        let cli = Cli::try_parse_from(["clean-teachers", "profesores.xml", "--format", "json"])
            .expect("valid arguments");
        assert_eq!(cli.roster, PathBuf::from("profesores.xml"));
        assert!(matches!(cli.format, FormatArg::Json));
        assert!(cli.log_level.is_none());
    }
}
