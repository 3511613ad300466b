use crate::config::Settings;
use crate::error::{Result, SeqGrepError};
use crate::extractor::RunMode;
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "seqgrep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grep groups from text files and create tables")]
#[command(
    long_about = "SeqGrep reads every matching text file under a directory, classifies each \
                  line against the patterns of a YAML settings file and writes one delimited \
                  table per pattern. Tables produced this way can be concatenated afterwards."
)]
#[command(after_help = "EXAMPLES:\n  \
    seqgrep -g -y settings.yaml -i logs/ -o tables/\n  \
    seqgrep -c -y settings.yaml -i tables/ -o combined/\n  \
    seqgrep --generate-config -y settings.yaml")]
#[command(group(ArgGroup::new("mode").args(["grep", "concatenate"]).multiple(false)))]
pub struct Cli {
    /// Grep groups from text files and create tables
    #[arg(short, long)]
    pub grep: bool,

    /// Concatenate the grepped tables
    #[arg(short, long)]
    pub concatenate: bool,

    /// YAML file that stores grep settings
    #[arg(short = 'y', long = "yamlfile", value_name = "FILE_YAML")]
    pub yamlfile: PathBuf,

    /// Input folder with data files
    #[arg(
        short = 'i',
        long = "inputdir",
        value_name = "DIR_SRC",
        required_unless_present = "generate_config"
    )]
    pub inputdir: Option<PathBuf>,

    /// Folder to output files
    #[arg(
        short = 'o',
        long = "outputdir",
        value_name = "DIR_DST",
        required_unless_present = "generate_config"
    )]
    pub outputdir: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print diagnostics as they happen instead of writing log.yaml
    #[arg(long)]
    pub no_log_file: bool,

    /// Validate settings and list the files that would be read
    #[arg(long)]
    pub dry_run: bool,

    /// Write a sample settings file to the --yamlfile path
    #[arg(long, conflicts_with = "mode")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn mode(&self) -> Option<RunMode> {
        if self.grep {
            Some(RunMode::Grep)
        } else if self.concatenate {
            Some(RunMode::Concatenate)
        } else {
            None
        }
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let settings = Settings::load_from_file(&self.yamlfile)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn input_dir(&self) -> Result<&Path> {
        let dir = self
            .inputdir
            .as_deref()
            .ok_or_else(|| SeqGrepError::InvalidPath {
                path: "no input directory given".to_string(),
            })?;

        if !dir.is_dir() {
            return Err(SeqGrepError::InvalidPath {
                path: format!("{} is not a directory", dir.display()),
            });
        }
        Ok(dir)
    }

    pub fn output_dir(&self) -> Result<&Path> {
        self.outputdir
            .as_deref()
            .ok_or_else(|| SeqGrepError::InvalidPath {
                path: "no output directory given".to_string(),
            })
    }

    pub fn write_log_file(&self) -> bool {
        !self.no_log_file
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_grep_arguments() {
        let cli = Cli::try_parse_from([
            "seqgrep", "-g", "-y", "s.yaml", "-i", "in", "-o", "out",
        ])
        .unwrap();

        assert_eq!(cli.mode(), Some(RunMode::Grep));
        assert_eq!(cli.yamlfile, PathBuf::from("s.yaml"));
        assert_eq!(cli.inputdir, Some(PathBuf::from("in")));
        assert!(cli.write_log_file());
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "seqgrep", "-g", "-c", "-y", "s.yaml", "-i", "in", "-o", "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_mode_parses_but_has_no_mode() {
        let cli = Cli::try_parse_from(["seqgrep", "-y", "s.yaml", "-i", "in", "-o", "out"]).unwrap();
        assert_eq!(cli.mode(), None);
    }

    #[test]
    fn test_directories_required_unless_generating_config() {
        assert!(Cli::try_parse_from(["seqgrep", "-g", "-y", "s.yaml"]).is_err());

        let cli = Cli::try_parse_from(["seqgrep", "--generate-config", "-y", "s.yaml"]).unwrap();
        assert!(cli.generate_config);
        assert!(cli.output_dir().is_err());
    }

    #[test]
    fn test_quiet_overrides_verbosity() {
        let cli = Cli::try_parse_from([
            "seqgrep", "-c", "-q", "-y", "s.yaml", "-i", "in", "-o", "out",
        ])
        .unwrap();
        assert_eq!(cli.verbosity_level(), 0);
        assert_eq!(cli.mode(), Some(RunMode::Concatenate));
    }

    #[test]
    fn test_missing_input_dir_is_invalid_path() {
        let cli = Cli::try_parse_from([
            "seqgrep", "-g", "-y", "s.yaml", "-i", "/no/such/dir", "-o", "out",
        ])
        .unwrap();
        assert!(matches!(cli.input_dir(), Err(SeqGrepError::InvalidPath { .. })));
    }
}
