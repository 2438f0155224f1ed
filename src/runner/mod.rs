//! Suite execution: one shell child per suite, fed a concatenated
//! script over stdin, with stdout and stderr interleaved through a
//! single pipe so output order is preserved.

mod context;
mod script;

pub use context::{TestContext, DEFAULT_ENVIRONMENT};

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::errors::GrillError;
use crate::suite::TestSuite;

/// Runs every test in the suite within one shell child, attributes the
/// combined output back to the tests, and reports the suite's status to
/// the progress sink.
///
/// Commands from consecutive tests share that one shell, so shell state
/// (working directory, variables) deliberately carries across the tests
/// of a suite.
pub fn run_suite<W: Write>(
    ctx: &TestContext,
    suite: &mut TestSuite,
    progress: &mut W,
    verbose: bool,
) -> Result<(), GrillError> {
    let parent = match suite.name.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let test_dir = std::path::absolute(parent)?;

    // Each suite works in its own sub-directory named after the test
    // file, so suites never trample each other inside the shared root.
    let rel = suite.name.strip_prefix("/").unwrap_or(&suite.name);
    let work_dir = ctx.work_dir().join(rel);
    fs::create_dir_all(&work_dir)?;

    let mut environ = ctx.environ.clone();
    environ.insert(
        "TESTFILE".into(),
        suite.name.file_name().map(OsString::from).unwrap_or_default(),
    );
    environ.insert("TESTDIR".into(), test_dir.into_os_string());

    let test_break = script::make_test_break();
    let shell_script = script::build_script(&suite.tests, &test_break);
    tracing::debug!(
        suite = %suite.name.display(),
        work_dir = %work_dir.display(),
        tests = suite.tests.len(),
        "running suite"
    );

    let output = run_script(ctx, &work_dir, &environ, &shell_script)?;
    script::attribute_output(&output, &test_break, &mut suite.tests)?;

    if verbose {
        writeln!(progress, "{}: {}", suite.name.display(), suite.status())?;
    } else {
        write!(progress, "{}", suite.status_glyph())?;
    }
    progress.flush()?;
    Ok(())
}

/// Feeds the script to a fresh shell over stdin and collects stdout and
/// stderr through one shared pipe.
fn run_script(
    ctx: &TestContext,
    work_dir: &Path,
    environ: &BTreeMap<OsString, OsString>,
    shell_script: &[u8],
) -> Result<Vec<u8>, GrillError> {
    let (mut reader, writer) = io::pipe()?;

    let mut child = {
        let mut cmd = Command::new(&ctx.shell[0]);
        cmd.args(&ctx.shell[1..])
            .current_dir(work_dir)
            .env_clear()
            .envs(environ)
            .stdin(Stdio::piped())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        cmd.spawn()
            .map_err(|source| GrillError::SpawnShell { source })?
        // The command object and its copies of the pipe writer drop
        // here; the read below sees EOF once the shell exits.
    };

    let mut stdin = child.stdin.take();
    let mut output = Vec::new();
    let read = thread::scope(|s| {
        s.spawn(move || {
            if let Some(stdin) = stdin.as_mut() {
                // The shell may legitimately exit without draining the
                // whole script.
                let _ = stdin.write_all(shell_script);
            }
        });
        reader.read_to_end(&mut output)
    });
    read.map_err(|e| GrillError::Shell(format!("could not read test output: {e}")))?;

    let status = child
        .wait()
        .map_err(|source| GrillError::SpawnShell { source })?;
    tracing::debug!(?status, bytes = output.len(), "shell finished");
    if !status.success() {
        // The script always ends by echoing a test break, so a healthy
        // run exits zero. Anything else means the shell died early,
        // e.g. a `set -e` script or a missing shell binary.
        return Err(GrillError::Shell(format!(
            "test exited with unexpected error: {status}"
        )));
    }
    Ok(output)
}
