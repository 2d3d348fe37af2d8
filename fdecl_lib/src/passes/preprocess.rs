use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// Environment variable naming the preprocessor binary, `cpp` when unset.
pub const CPP_ENV_VAR: &str = "FDECL_CPP";

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("failed to start the preprocessor `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("the preprocessor failed on `{}` ({status}):\n{stderr}", .path.display())]
    Failed {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("the preprocessed output of `{}` is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },
}

/// Runs the C preprocessor over `path`, returning the preprocessed translation unit without line
/// markers.
pub fn preprocess(path: &Path, include_dirs: &[PathBuf]) -> Result<String, PreprocessError> {
    let program = std::env::var_os(CPP_ENV_VAR).unwrap_or_else(|| OsString::from("cpp"));
    preprocess_with(&program, path, include_dirs)
}

pub(crate) fn preprocess_with(
    program: &OsStr,
    path: &Path,
    include_dirs: &[PathBuf],
) -> Result<String, PreprocessError> {
    let mut command = Command::new(program);
    command
        .arg("-P")
        .args(include_dirs.iter().map(|dir| include_arg(dir)))
        .arg(path);

    log::debug!("running preprocessor: {command:?}");

    let output = command.output().map_err(|source| PreprocessError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    })?;

    if !output.status.success() {
        return Err(PreprocessError::Failed {
            path: path.to_owned(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| PreprocessError::NotUtf8 {
        path: path.to_owned(),
    })
}

fn include_arg(dir: &Path) -> OsString {
    let mut arg = OsString::from("-I");
    arg.push(dir);
    arg
}
