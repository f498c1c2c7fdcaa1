use std::{ffi::OsStr, io, process::Command};

use cfg_if::cfg_if;

/// Returns a std::process::Command from a given command and it's arguments
pub fn get_launch_command<'a>(
    command: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = &'a str>,
    env_vars: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Command {
    let mut command = Command::new(command);
    command.envs(env_vars).args(args);

    command
}

/// Returns a Command which hands a protocol URI (e.g. `steam://rungameid/730`) to the system opener
pub fn get_launch_command_protocol(uri: &str) -> Command {
    cfg_if! {
        if #[cfg(windows)] {
            get_launch_command("cmd", ["/C", "start", "", uri], [])
        } else if #[cfg(target_os = "macos")] {
            get_launch_command("open", [uri], [])
        } else {
            get_launch_command("xdg-open", [uri], [])
        }
    }
}

/// Runs a system command to completion and returns its standard output.
///
/// A non-zero exit status is reported as an [`io::Error`], so callers can treat the source as
/// unavailable.
pub fn get_command_stdout<'a>(
    command: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = &'a str>,
) -> Result<String, io::Error> {
    let output = get_launch_command(command, args, []).output()?;

    if !output.status.success() {
        return Err(io::Error::other(format!(
            "command exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
