//! Running shell commands on behalf of the user.
//!
//! `execute` runs a command line through `sh -c` and waits for the shell to
//! exit. While it waits, SIGINT and SIGQUIT are ignored in the manager so a
//! keyboard interrupt aimed at the child cannot take the manager down. The
//! child itself starts with default dispositions. Commands that should outlive
//! the call end in `&`.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, ExitStatus};
use std::ptr;

use anyhow::{Context, Result};

/// Signals reset to their defaults in the child before exec
const CHILD_DEFAULT_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGQUIT, libc::SIGHUP];

/// Signals ignored by the manager while it waits for the shell
const IGNORED_WHILE_WAITING: [libc::c_int; 2] = [libc::SIGINT, libc::SIGQUIT];

/// Run `command` with `/bin/sh -c` and wait for it.
///
/// Returns the shell's exit status. A command the shell cannot find shows up
/// as status 127 from the shell itself. If `/bin/sh` cannot be executed at
/// all, no status exists: the failed exec is reported back to this process
/// and returned as `Err`, which callers treat as the launch-failure signal.
/// The manager keeps running either way.
pub fn execute(command: &str) -> Result<ExitStatus> {
    execute_with_shell("/bin/sh", command)
}

fn execute_with_shell(shell: &str, command: &str) -> Result<ExitStatus> {
    log::info!("Executing '{}'", command);

    let mut cmd = Command::new(shell);
    cmd.arg("-c").arg(command);

    // Only async-signal-safe calls between fork and exec
    unsafe {
        cmd.pre_exec(|| {
            for sig in CHILD_DEFAULT_SIGNALS {
                if libc::signal(sig, libc::SIG_DFL) == libc::SIG_ERR {
                    return Err(io::Error::last_os_error());
                }
            }
            Ok(())
        });
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", command))?;

    let _guard = SignalGuard::ignore(&IGNORED_WHILE_WAITING)
        .context("Failed to ignore interrupt signals")?;

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for '{}'", command))?;

    log::debug!("'{}' (pid {}) exited with {}", command, child.id(), status);
    Ok(status)
}

/// Ignores a set of signals until dropped, then restores what was there
pub struct SignalGuard {
    saved: Vec<(libc::c_int, libc::sigaction)>,
}

impl SignalGuard {
    pub fn ignore(signals: &[libc::c_int]) -> io::Result<Self> {
        let mut guard = Self { saved: Vec::new() };

        for &sig in signals {
            // SAFETY: both structs are fully initialised before use
            unsafe {
                let mut ignore: libc::sigaction = std::mem::zeroed();
                ignore.sa_sigaction = libc::SIG_IGN;
                libc::sigemptyset(&mut ignore.sa_mask);

                let mut previous: libc::sigaction = std::mem::zeroed();
                if libc::sigaction(sig, &ignore, &mut previous) != 0 {
                    // Dropping the guard restores the ones already changed
                    return Err(io::Error::last_os_error());
                }
                guard.saved.push((sig, previous));
            }
        }

        Ok(guard)
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for (sig, previous) in self.saved.iter().rev() {
            // SAFETY: `previous` came from a successful sigaction call
            unsafe {
                if libc::sigaction(*sig, previous, ptr::null_mut()) != 0 {
                    log::warn!(
                        "Failed to restore handler for signal {}: {}",
                        sig,
                        io::Error::last_os_error()
                    );
                }
            }
        }
    }
}
