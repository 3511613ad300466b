use clap::Parser;
use seqgrep::{
    Cli, OutputFormatter, OutputMode, RunMode, SeqGrep, SeqGrepError, UserFriendlyError,
};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let mode = match cli.mode() {
        Some(mode) => mode,
        None => {
            eprintln!("Select either -g or -c");
            return 1;
        }
    };

    let seqgrep = match SeqGrep::from_cli(&cli) {
        Ok(seqgrep) => seqgrep,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &seqgrep);
    }

    let result = cli.input_dir().and_then(|input_dir| {
        let output_dir = cli.output_dir()?;
        match mode {
            RunMode::Grep => seqgrep.create_tables(input_dir, output_dir),
            RunMode::Concatenate => seqgrep.concatenate_tables(input_dir, output_dir),
        }
    });

    match result {
        Ok(report) => {
            seqgrep.output_formatter().print_run_report(&report);

            // mismatched lines are expected; unreadable input or lossy output is not
            if report.has_data_problems() {
                2
            } else {
                0
            }
        }
        Err(e) => {
            seqgrep.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &SeqGrepError) -> i32 {
    match error {
        e if e.is_configuration() => 3,
        SeqGrepError::InvalidPath { .. } => 4,
        SeqGrepError::NoTablesFound { .. } => 5,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    match SeqGrep::generate_sample_config(&cli.yamlfile) {
        Ok(()) => {
            println!("Generated sample settings file: {}", cli.yamlfile.display());
            println!("\nTo use these settings:");
            println!(
                "  seqgrep -g -y {} -i <DIR_SRC> -o <DIR_DST>",
                cli.yamlfile.display()
            );
            println!("\nEdit the file to describe the lines you want to extract.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate settings file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, seqgrep: &SeqGrep) -> i32 {
    let formatter = seqgrep.output_formatter();

    formatter.info("DRY RUN MODE - No files will be read or written");
    formatter.print_separator();

    let input_dir = match cli.input_dir() {
        Ok(dir) => dir,
        Err(e) => {
            seqgrep.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.concatenate {
        let concatenator = match seqgrep::TableWriter::from_settings(seqgrep.settings()) {
            Ok(writer) => seqgrep::TableConcatenator::new(writer),
            Err(e) => {
                seqgrep.handle_error(&e);
                return exit_code_for(&e);
            }
        };

        match concatenator.find_tables(input_dir) {
            Ok(tables) => {
                formatter.info(&format!("Tables that would be concatenated: {}", tables.len()));
                for table in &tables {
                    println!("  {}", table.display());
                }
            }
            Err(e) => {
                seqgrep.handle_error(&e);
                return exit_code_for(&e);
            }
        }
    } else {
        let (patterns, files) = match seqgrep.plan(input_dir) {
            Ok(plan) => plan,
            Err(e) => {
                seqgrep.handle_error(&e);
                return exit_code_for(&e);
            }
        };

        formatter.info("Patterns:");
        for matcher in patterns.matchers() {
            let spec = matcher.spec();
            println!(
                "  {} [key: {:?}] {}",
                spec.table_name(),
                spec.key_substring(),
                spec.expression().as_str()
            );
            println!("    fields: {}", spec.field_names().join(", "));
        }

        formatter.print_separator();
        formatter.info(&format!("Files that would be read: {}", files.len()));
        for file in &files {
            println!("  {} ({} bytes)", file.display_path(), file.size);
        }
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    0
}

fn print_startup_error(error: &SeqGrepError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn default_log_filter(cli: &Cli) -> &'static str {
    match cli.verbosity_level() {
        _ if cli.quiet => "seqgrep=error",
        0 if cli.no_log_file => "seqgrep=info",
        0 => "seqgrep=warn",
        1 => "seqgrep=info",
        _ => "seqgrep=debug",
    }
}

fn setup_logging(cli: &Cli) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgrep::Settings;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.yaml");

        let cli = Cli::try_parse_from([
            "seqgrep",
            "--generate-config",
            "-y",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);
        let settings = Settings::load_from_file(&config_path).unwrap();
        assert!(!settings.patterns.is_empty());
    }

    #[test]
    fn test_dry_run_mode() {
        let input = TempDir::new().unwrap();
        fs::write(input.path().join("app.log"), "[ERROR] x\n").unwrap();

        let seqgrep = SeqGrep::new(Settings::default(), OutputMode::Plain, 0, true);
        let cli = Cli::try_parse_from([
            "seqgrep",
            "-g",
            "--dry-run",
            "-y",
            "unused.yaml",
            "-i",
            input.path().to_str().unwrap(),
            "-o",
            "out",
        ])
        .unwrap();

        assert_eq!(handle_dry_run(&cli, &seqgrep), 0);
        assert!(!std::path::Path::new("out").exists());
    }

    #[test]
    fn test_default_log_filter_follows_flags() {
        fn parse(args: &[&str]) -> Cli {
            let mut argv = vec!["seqgrep", "-g", "-y", "s.yaml", "-i", "in", "-o", "out"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap()
        }

        assert_eq!(default_log_filter(&parse(&[])), "seqgrep=warn");
        assert_eq!(default_log_filter(&parse(&["--no-log-file"])), "seqgrep=info");
        assert_eq!(default_log_filter(&parse(&["-v"])), "seqgrep=info");
        assert_eq!(default_log_filter(&parse(&["-vv"])), "seqgrep=debug");
        assert_eq!(default_log_filter(&parse(&["-q"])), "seqgrep=error");
    }

    #[test]
    fn test_exit_codes() {
        let config = SeqGrepError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(exit_code_for(&config), 3);

        let missing = SeqGrepError::InvalidPath {
            path: "x".to_string(),
        };
        assert_eq!(exit_code_for(&missing), 4);

        let empty = SeqGrepError::NoTablesFound {
            path: "x".to_string(),
        };
        assert_eq!(exit_code_for(&empty), 5);
    }
}
