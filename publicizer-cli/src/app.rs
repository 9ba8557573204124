use std::path::PathBuf;

use clap::Parser;
use publicizer::{PublicizeOptions, WriteOptions, WriteStrategy};

use crate::{error::CliError, paths};

/// publicizer - make every type, method and field of a .NET module public
#[derive(Debug, Parser)]
#[command(name = "publicizer", version, about, long_about = None)]
pub struct Cli {
    /// Path to the .NET module.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Path to the .NET module, instead of the positional argument.
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    pub input_flag: Option<PathBuf>,

    /// Output file or directory (default: <input dir>/publicized_assemblies/).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Exit right away instead of waiting for Enter.
    #[arg(long)]
    pub exit: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Rewrite declarations on all cores.
    #[arg(long)]
    pub parallel: bool,

    /// Patch attribute words in place even for IL-only modules.
    #[arg(long)]
    pub native: bool,
}

/// Everything a run needs, resolved and validated.
#[derive(Debug)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub publicize: PublicizeOptions,
    pub write: WriteOptions,
}

impl RunConfig {
    /// Resolve the input and output paths of `cli`.
    ///
    /// # Errors
    /// [`CliError::Argument`] without an input or with two different ones,
    /// [`CliError::FileNotFound`] if the input is missing, [`CliError::Path`] if it is not a
    /// file or the output would replace it.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let input = match (&cli.input, &cli.input_flag) {
            (Some(positional), Some(flag)) if positional != flag => {
                return Err(CliError::Argument(format!(
                    "two different inputs given, {} and {}",
                    positional.display(),
                    flag.display()
                )))
            }
            (Some(input), _) | (None, Some(input)) => input.clone(),
            (None, None) => return Err(CliError::Argument("no input module given".to_string())),
        };

        if !input.exists() {
            return Err(CliError::FileNotFound(input));
        }
        if !input.is_file() {
            return Err(CliError::Path(format!("{} is not a file", input.display())));
        }

        let output = paths::resolve_output(&input, cli.output.as_deref())?;
        if paths::same_file(&input, &output) {
            return Err(CliError::Path(format!(
                "output {} would replace the input",
                output.display()
            )));
        }

        Ok(RunConfig {
            input,
            output,
            publicize: PublicizeOptions {
                parallel: cli.parallel,
            },
            write: WriteOptions {
                strategy: cli.native.then_some(WriteStrategy::NativeAware),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("publicizer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn input_is_required() {
        let error = RunConfig::from_cli(&cli(&["--exit"])).unwrap_err();
        assert_eq!(error.exit_code(), 10);
    }

    #[test]
    fn conflicting_inputs() {
        let error = RunConfig::from_cli(&cli(&["a.dll", "-i", "b.dll"])).unwrap_err();
        assert!(matches!(error, CliError::Argument(_)));
    }

    #[test]
    fn missing_input_file() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("Missing.dll");
        let error = RunConfig::from_cli(&cli(&[input.to_str().unwrap()])).unwrap_err();
        assert_eq!(error.exit_code(), 30);
    }

    #[test]
    fn directory_input() {
        let temp_dir = tempdir().unwrap();
        let error = RunConfig::from_cli(&cli(&[temp_dir.path().to_str().unwrap()])).unwrap_err();
        assert_eq!(error.exit_code(), 20);
    }

    #[test]
    fn switches_map_to_options() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("Library.dll");
        std::fs::write(&input, b"MZ").unwrap();

        let config = RunConfig::from_cli(&cli(&[
            "--input",
            input.to_str().unwrap(),
            "--parallel",
            "--native",
        ]))
        .unwrap();

        assert!(config.publicize.parallel);
        assert_eq!(config.write.strategy, Some(WriteStrategy::NativeAware));
        assert_eq!(
            config.output,
            temp_dir
                .path()
                .join("publicized_assemblies")
                .join("Library_publicized.dll")
        );
    }

    #[test]
    fn output_must_not_replace_input() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("Library.dll");
        std::fs::write(&input, b"MZ").unwrap();

        let error = RunConfig::from_cli(&cli(&[
            input.to_str().unwrap(),
            "-o",
            input.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert_eq!(error.exit_code(), 20);
    }
}
