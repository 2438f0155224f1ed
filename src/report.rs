//! The end-of-run report: per-suite diffs and the status summary.

use std::io::Write;

use crate::errors::GrillError;
use crate::suite::TestSuite;

/// Writes a report on the overall grill run.
///
/// Every failed suite gets its unified diff, in order, unless `quiet`
/// is set; the final summary line counts suites.
pub fn write_report<W: Write>(
    w: &mut W,
    suites: &[TestSuite],
    ctx_len: usize,
    quiet: bool,
) -> Result<(), GrillError> {
    let (mut tests, mut failed, mut skipped) = (0, 0, 0);

    for suite in suites {
        if suite.failed() {
            failed += 1;
            if !quiet {
                suite
                    .write_diff(w, ctx_len)
                    .map_err(|source| GrillError::WriteErr {
                        path: format!("{}.err", suite.name.display()),
                        source,
                    })?;
            }
        } else if suite.skipped() {
            skipped += 1;
        }
        tests += 1;
    }

    let plural = if tests == 1 { "" } else { "s" };
    writeln!(
        w,
        "# Ran {tests} test{plural}, {skipped} skipped, {failed} failed."
    )?;
    Ok(())
}
