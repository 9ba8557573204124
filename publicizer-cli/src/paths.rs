//! Output path derivation.
//!
//! The default file name is `<stem>_publicized<.ext>`. Without an output path the file goes to
//! `publicized_assemblies/` next to the input; an output path that looks like a directory
//! receives the default name inside it.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::error::CliError;

/// Directory created next to the input when no output is given
pub const DEFAULT_OUTPUT_DIR: &str = "publicized_assemblies";

/// Appended to the input's file stem
pub const FILE_SUFFIX: &str = "_publicized";

/// `<stem>_publicized<.ext>` for `input`.
pub fn default_file_name(input: &Path) -> Result<OsString, CliError> {
    let Some(stem) = input.file_stem() else {
        return Err(CliError::Path(format!(
            "{} has no file name",
            input.display()
        )));
    };

    let mut name = stem.to_os_string();
    name.push(FILE_SUFFIX);
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    Ok(name)
}

/// The file the publicized `input` is written to.
pub fn resolve_output(input: &Path, output: Option<&Path>) -> Result<PathBuf, CliError> {
    let file_name = default_file_name(input)?;

    let Some(output) = output else {
        let input_dir = input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        return Ok(input_dir.join(DEFAULT_OUTPUT_DIR).join(file_name));
    };

    if output.as_os_str().is_empty() {
        return Err(CliError::Path("output path is empty".to_string()));
    }

    if names_directory(output) {
        Ok(output.join(file_name))
    } else {
        Ok(output.to_path_buf())
    }
}

/// Whether `a` and `b` are the same existing file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn names_directory(path: &Path) -> bool {
    let text = path.as_os_str().to_string_lossy();
    text.ends_with('/')
        || text.ends_with(std::path::MAIN_SEPARATOR)
        || path.is_dir()
        || path.extension().is_none()
}
