use std::path::PathBuf;

use thiserror::Error;

/// Everything that ends a run early. Each variant has a stable process exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing, conflicting or unparsable arguments
    #[error("invalid arguments - {0}")]
    Argument(String),

    /// An input or output path that cannot be used
    #[error("unusable path - {0}")]
    Path(String),

    /// The input module does not exist or cannot be read
    #[error("cannot read input {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input is not a module this tool can load
    #[error("failed to load {} - {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: publicizer::Error,
    },

    /// The publicized module could not be written
    #[error("failed to write {} - {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: publicizer::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Argument(_) => 10,
            CliError::Path(_) => 20,
            CliError::FileNotFound(_) => 30,
            CliError::Load { .. } => 40,
            CliError::Write { .. } => 50,
        }
    }

    /// What the user can do about it.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Argument(_) => {
                Some("pass the module as the first argument or with --input, see --help")
            }
            CliError::Path(_) => Some("choose an output path that differs from the input"),
            CliError::FileNotFound(_) => Some("check the path and the file's read permissions"),
            CliError::Load {
                source: publicizer::Error::Malformed { .. } | publicizer::Error::GoblinErr(_),
                ..
            } => Some("only managed .NET modules with a CLR header can be publicized"),
            CliError::Load { .. } => None,
            CliError::Write { .. } => {
                Some("check free disk space and write permissions of the output directory")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        let load = || CliError::Load {
            path: PathBuf::from("a.dll"),
            source: publicizer::Error::Empty,
        };
        let write = CliError::Write {
            path: PathBuf::from("b.dll"),
            source: publicizer::Error::OutOfBounds,
        };

        assert_eq!(CliError::Argument(String::new()).exit_code(), 10);
        assert_eq!(CliError::Path(String::new()).exit_code(), 20);
        assert_eq!(CliError::FileNotFound(PathBuf::new()).exit_code(), 30);
        assert_eq!(load().exit_code(), 40);
        assert_eq!(write.exit_code(), 50);
        assert!(load().hint().is_none());
    }
}
