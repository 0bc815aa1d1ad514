use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::GdmError;
use crate::fs_util::has_suffix;
use crate::process::{CommandRunner, Confirm};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Conversion {
    Converted { source: PathBuf, output: PathBuf },
    NoMatrixMarket,
    Declined { output: PathBuf },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub undirected: bool,
    pub always: bool,
}

/// First `*.mtx` file directly inside `folder`, by name.
pub fn find_matrix_market(folder: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_suffix(path, ".mtx"))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

pub fn binary_output_path(mtx: &Path) -> Option<PathBuf> {
    let stem = mtx.file_name()?.to_str()?.split('.').next()?;
    let folder = mtx.parent().unwrap_or_else(|| Path::new("."));
    Some(folder.join(format!("{stem}.bin")))
}

/// Converts the matrix-market file of one dataset folder to binary.
///
/// An existing binary is only overwritten with `always` or after `confirm`
/// agrees. A non-zero converter exit is returned as an error carrying the
/// converter output.
pub fn convert_dataset(
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
    converter: &Path,
    folder: &Path,
    options: ConvertOptions,
) -> Result<Conversion, GdmError> {
    let Some(mtx) = find_matrix_market(folder) else {
        debug!(folder = %folder.display(), "no matrix-market file");
        return Ok(Conversion::NoMatrixMarket);
    };
    let output = binary_output_path(&mtx)
        .ok_or_else(|| GdmError::Filesystem(format!("invalid file name {}", mtx.display())))?;
    let basename = output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    if output.exists() && !options.always {
        let prompt =
            format!("{basename} already converted. Do you want to convert again? [y/n]: ");
        if !confirm.confirm(&prompt) {
            return Ok(Conversion::Declined { output });
        }
    }

    let mut args = vec![
        mtx.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ];
    if options.undirected {
        args.push("-u".to_string());
    }

    info!("Converting {basename}");
    let result = runner.run(converter, &args, None)?;
    debug!(output = %result.output, "converter finished");
    if !result.success {
        return Err(GdmError::Conversion {
            status: result.status,
            output: result.output,
        });
    }

    Ok(Conversion::Converted {
        source: mtx,
        output,
    })
}
