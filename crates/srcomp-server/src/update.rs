//! `srcomp-http update`: move a compstate checkout to a new revision.
//!
//! Remotes are listed and fetched without the lock. Only the checkout
//! itself runs under [`with_update_lock`], so a running server is kept
//! out of the directory for as short a time as possible. The new revision
//! is loaded before the lock is released; if it does not load, the
//! previous revision is checked out again and the server is not
//! signalled.

use std::path::Path;
use std::process::Command;

use srcomp_core::compstate::load_compstate;
use srcomp_core::with_update_lock;
use tracing::{info, warn};

use crate::error::UpdateError;

/// Revision checked out when none is given.
pub const DEFAULT_REVISION: &str = "origin/master";

/// Update the compstate at `compstate` to `revision`.
///
/// # Errors
///
/// Returns [`UpdateError`] if any git step fails, if the new revision
/// does not load, or if the update lock cannot be taken.
pub fn run(compstate: &Path, revision: &str) -> Result<(), UpdateError> {
    let remotes = git(compstate, &["remote", "-v"])?;
    for line in remotes.lines() {
        info!(remote = line, "Compstate remote");
    }

    info!(compstate = %compstate.display(), "Fetching origin");
    git(compstate, &["fetch", "origin"])?;

    let target = git(compstate, &["rev-parse", "--verify", revision])?;
    let previous = git(compstate, &["rev-parse", "HEAD"])?;
    info!(%revision, %target, %previous, "Updating compstate");

    with_update_lock(compstate, || {
        git(compstate, &["checkout", "--quiet", &target])?;
        if let Err(e) = load_compstate(compstate) {
            warn!(error = %e, %previous, "New revision does not load; restoring previous");
            git(compstate, &["checkout", "--quiet", &previous])?;
            return Err(UpdateError::from(e));
        }
        Ok(())
    })?;

    info!(%target, "Compstate updated");
    Ok(())
}

/// Run git in `dir` and return its trimmed stdout.
fn git(dir: &Path, args: &[&str]) -> Result<String, UpdateError> {
    let joined = args.join(" ");
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| UpdateError::Spawn {
            args: joined.clone(),
            dir: dir.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(UpdateError::Git {
            args: joined,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use srcomp_core::sentinel::sentinel_path;

    use super::*;

    #[test]
    fn failed_update_leaves_no_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let compstate = dir.path().join("not-a-repo");
        std::fs::create_dir(&compstate).unwrap();

        assert!(run(&compstate, DEFAULT_REVISION).is_err());
        assert!(!sentinel_path(&compstate).exists());
    }
}
