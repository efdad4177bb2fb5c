//! CLI surface. Trailing `KEY=VALUE` / `--KEY VALUE` settings overrides are
//! captured verbatim and handed to `chassis_settings::args::parse`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chassis-runtime", about = "Chassis application runtime")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short = 'c', long = "config", default_value = "./config.yml")]
    pub config: PathBuf,

    /// Runs the settings backend's schema migration and exits.
    #[arg(long)]
    pub migrate: bool,

    /// Reserved: sets SETTINGS.TEST_MODE=true for the demo application.
    #[arg(long)]
    pub test: bool,

    /// Trailing settings overrides: `KEY=VALUE` or `--KEY VALUE`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub overrides: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides_after_known_flags() {
        let cli = Cli::parse_from([
            "chassis-runtime",
            "-c",
            "config.yml",
            "--",
            "--database.port",
            "5432",
        ]);
        assert_eq!(cli.config, PathBuf::from("config.yml"));
        assert_eq!(cli.overrides, vec!["--database.port".to_string(), "5432".to_string()]);
    }
}
