//! Building the OS command for a wrapped process.
//!
//! Every wrapped process is spawned:
//! - directly, without a shell in between
//! - with stdout and stderr piped back to the wrapper
//! - with stdin connected to null
//! - without a console window on Windows
//!
//! On Unix the argument string is split into argv with shell-style quoting.
//! On Windows it is handed to the OS command line unchanged, since the child
//! parses its own command line there.

use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::{Error, Result};

/// Exit code reported when the OS gives neither a code nor a signal.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Split an argument string into words, the way a POSIX shell would.
///
/// Only quoting and escaping are interpreted; there is no expansion of
/// variables, globs or substitutions.
pub fn split_args(args: &str) -> Result<Vec<String>> {
    shell_words::split(args).map_err(|source| Error::InvalidArguments {
        args: args.to_string(),
        source,
    })
}

/// Build the command for `program` run with `args` inside `working_dir`.
///
/// # Errors
///
/// [`Error::InvalidArguments`] when `args` cannot be split (Unix only).
pub(crate) fn build_command(
    program: &str,
    args: &str,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> Result<Command> {
    let mut cmd = Command::new(program);

    #[cfg(not(windows))]
    cmd.args(split_args(args)?);

    #[cfg(windows)]
    if !args.is_empty() {
        cmd.raw_arg(args);
    }

    cmd.current_dir(working_dir);

    for (key, value) in env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    Ok(cmd)
}

/// Reduce an exit status to a single integer.
///
/// On Unix a process killed by signal `n` reports `128 + n`, matching what
/// shells print for `$?`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_split_args_plain() {
        assert_eq!(split_args("-ver").unwrap(), vec!["-ver"]);
        assert_eq!(split_args("build  --release\t-v").unwrap(), vec!["build", "--release", "-v"]);
    }

    #[test]
    fn test_split_args_empty() {
        assert!(split_args("").unwrap().is_empty());
        assert!(split_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(
            split_args(r#"-c "echo hello world" 'single quoted' esc\ aped"#).unwrap(),
            vec!["-c", "echo hello world", "single quoted", "esc aped"]
        );
    }

    #[test]
    fn test_split_args_no_expansion() {
        assert_eq!(split_args("$HOME *.rs").unwrap(), vec!["$HOME", "*.rs"]);
    }

    #[test]
    fn test_split_args_unbalanced_quote() {
        let err = split_args(r#"-c "never closed"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_build_command_settings() {
        let mut env = HashMap::new();
        env.insert("MY_VAR".to_string(), "value".to_string());

        let cmd = build_command("msbuild", "-ver --flag", Path::new("./"), &env).unwrap();
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), OsStr::new("msbuild"));
        assert_eq!(
            std_cmd.get_args().collect::<Vec<_>>(),
            vec![OsStr::new("-ver"), OsStr::new("--flag")]
        );
        assert_eq!(std_cmd.get_current_dir(), Some(Path::new("./")));
        assert!(std_cmd
            .get_envs()
            .any(|(k, v)| k == OsStr::new("MY_VAR") && v == Some(OsStr::new("value"))));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_build_command_rejects_unbalanced_quote() {
        let err = build_command("sh", "-c 'oops", Path::new("."), &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[cfg(windows)]
    #[test]
    fn test_build_command_passes_args_verbatim() {
        let args = r#"C:\proj\app.sln /p:OutDir=C:\out\ "/p:Name=a b""#;
        let cmd = build_command("msbuild", args, Path::new("./"), &HashMap::new()).unwrap();
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), OsStr::new("msbuild"));
        assert_eq!(std_cmd.get_args().collect::<Vec<_>>(), vec![OsStr::new(args)]);
        assert_eq!(std_cmd.get_current_dir(), Some(Path::new("./")));
    }

    #[cfg(windows)]
    #[test]
    fn test_build_command_empty_args() {
        let cmd = build_command("msbuild", "", Path::new("./"), &HashMap::new()).unwrap();
        assert_eq!(cmd.as_std().get_args().count(), 0);
    }

    #[tokio::test]
    async fn test_exit_code_from_status() {
        let status = Command::new("sh").arg("-c").arg("exit 42").status().await.unwrap();
        assert_eq!(exit_code(status), 42);

        let status = Command::new("true").status().await.unwrap();
        assert_eq!(exit_code(status), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_from_signal() {
        let status = Command::new("sh")
            .arg("-c")
            .arg("kill -9 $$")
            .status()
            .await
            .unwrap();
        assert_eq!(exit_code(status), 128 + 9);
    }
}
