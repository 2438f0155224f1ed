//! Per-file suite state: status aggregation, the `.err` artifact, and
//! the suite-level unified diff.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::diff::Change;
use crate::errors::GrillError;
use crate::hunk::create_hunks;
use crate::matcher::escape;
use crate::test::Test;

/// A single grill test file and the tests parsed out of it.
#[derive(Debug, Default)]
pub struct TestSuite {
    /// Path of the source `.t` file; the `.err` artifact lives beside
    /// it.
    pub name: PathBuf,
    pub tests: Vec<Test>,
}

impl TestSuite {
    /// True if any test in the suite failed.
    pub fn failed(&self) -> bool {
        self.tests.iter().any(Test::failed)
    }

    /// True if every test in the suite was skipped.
    pub fn skipped(&self) -> bool {
        self.tests.iter().all(Test::skipped)
    }

    /// The suite's overall status, as reported in verbose mode.
    pub fn status(&self) -> &'static str {
        if self.failed() {
            "failed"
        } else if self.skipped() {
            "skipped"
        } else {
            "passed"
        }
    }

    /// One-character status used for run progress.
    pub fn status_glyph(&self) -> &'static str {
        if self.failed() {
            "!"
        } else if self.skipped() {
            "s"
        } else {
            "."
        }
    }

    /// Path of the sibling `.err` artifact.
    pub fn err_path(&self) -> PathBuf {
        let mut path = self.name.clone().into_os_string();
        path.push(".err");
        PathBuf::from(path)
    }

    /// Rewrites the test file with observed output in place of expected
    /// output, next to the source file.
    pub fn write_err(&self) -> Result<(), GrillError> {
        let path = self.err_path();
        self.write_err_file(&path).map_err(|source| GrillError::WriteErr {
            path: path.display().to_string(),
            source,
        })
    }

    fn write_err_file(&self, path: &Path) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for t in &self.tests {
            for line in &t.doc {
                w.write_all(line)?;
                w.write_all(b"\n")?;
            }
            for (i, line) in t.command.iter().enumerate() {
                w.write_all(if i == 0 { b"  $ " } else { b"  > " })?;
                w.write_all(line)?;
                w.write_all(b"\n")?;
            }
            for line in &t.observed {
                writeln!(w, "  {}", escape(line))?;
            }
        }
        w.flush()
    }

    /// Removes the matching `.err` file, if it exists.
    pub fn remove_err(&self) -> Result<(), GrillError> {
        match fs::remove_file(self.err_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GrillError::WriteErr {
                path: self.err_path().display().to_string(),
                source,
            }),
        }
    }

    /// Writes the suite diff in unified format.
    ///
    /// Line numbers in the hunk headers are absolute positions in the
    /// source file and the would-be `.err` file, counting documentation
    /// and command lines, so the output applies cleanly with `patch`.
    pub fn write_diff<W: Write>(&self, w: &mut W, ctx_len: usize) -> io::Result<()> {
        let mut exp_lines: Vec<Vec<u8>> = Vec::new();
        let mut obs_lines: Vec<Vec<u8>> = Vec::new();
        let mut changes: Vec<Change> = Vec::new();

        for t in &self.tests {
            let mut cmd_lines: Vec<Vec<u8>> = Vec::new();
            for (i, line) in t.command.iter().enumerate() {
                let mut cmd = if i == 0 {
                    b"  $ ".to_vec()
                } else {
                    b"  > ".to_vec()
                };
                cmd.extend_from_slice(line);
                cmd_lines.push(cmd);
            }

            exp_lines.extend(t.doc.iter().cloned());
            exp_lines.extend(cmd_lines.iter().cloned());
            obs_lines.extend(t.doc.iter().cloned());
            obs_lines.extend(cmd_lines);

            // Doc and command lines are identical on both sides, so the
            // test-local change offsets shift by the lines accumulated
            // so far.
            for c in &t.changes {
                changes.push(Change {
                    a: c.a + exp_lines.len(),
                    b: c.b + obs_lines.len(),
                    del: c.del,
                    ins: c.ins,
                    same: c.same,
                });
            }

            for line in &t.expected {
                let mut exp = b"  ".to_vec();
                exp.extend_from_slice(line);
                exp_lines.push(exp);
            }
            for line in &t.observed {
                let mut obs = b"  ".to_vec();
                obs.extend_from_slice(line);
                obs_lines.push(obs);
            }
        }

        let hunks = create_hunks(&changes, exp_lines.len(), ctx_len);

        writeln!(w, "--- {}", self.name.display())?;
        writeln!(w, "+++ {}.err", self.name.display())?;
        for h in &hunks {
            h.write(w, &exp_lines, &obs_lines)?;
        }
        Ok(())
    }
}
