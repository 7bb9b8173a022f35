//! Input checks and output writing shared by the commands.

use std::io::Write;

use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::CliError;

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match hotspot_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `value` as pretty JSON to `output`, or to `writer` when unset.
pub(crate) fn write_json<T: Serialize>(
    writer: &mut dyn Write,
    output: Option<&Utf8Path>,
    value: &T,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    payload.push('\n');
    match output {
        Some(path) => {
            hotspot_fs::write_utf8_file(path, &payload).map_err(CliError::WriteOutput)?;
            info!("wrote {path}");
        }
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteOutput)?,
    }
    Ok(())
}
