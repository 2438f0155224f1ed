//! Grill is a functional test runner for command-line applications.
//!
//! A grill test file interleaves prose, shell commands, and the output
//! those commands are expected to produce. Grill runs the commands in a
//! controlled shell environment, compares what it observed against what
//! the file expects, and reports the differences as a unified diff.
//!
//! ## Test format
//!
//! Anything not indented is documentation. A command starts with two
//! spaces, a dollar sign, and a space; continuation lines start with
//! two spaces, a `>`, and a space. Expected output is indented by two
//! spaces. A blank line after a command's output ends the test.
//!
//! ```text
//! Here is an example grill test:
//!
//!   $ echo foobar
//!   foobar
//!
//! Commands can span lines and expected output can assert the exit
//! code:
//!
//!   $ echo foo \
//!   > bar
//!   foo bar
//!   $ false
//!   [1]
//! ```
//!
//! All commands of one file run in a single shell, so working-directory
//! changes and variables carry over from test to test. A file with no
//! commands is skipped.
//!
//! ## Matchers
//!
//! Expected lines can end in a keyword selecting a fuzzy comparison:
//!
//! ```text
//!   $ echo "There are 37 like it"
//!   There are \d+ like it (re)
//!   $ echo "tons like it"
//!   to* like it (glob)
//!   $ printf 'tab\there\n'
//!   tab\there (esc)
//! ```
//!
//! `(re)` matches a regular expression anywhere in the line, `(glob)`
//! matches a shell-style glob, and `(esc)` compares against a
//! double-quoted escape literal. Output without a trailing newline is
//! marked with ` (no-eol)`, and a non-zero exit code shows up as a
//! `[code]` line.
//!
//! ## Running
//!
//! ```text
//! $ grill tests/*.t
//! .s!.
//! --- tests/fail.t
//! +++ tests/fail.t.err
//! @@ -4,1 +4,1 @@
//! -  foobaz
//! +  foobar
//! # Ran 4 tests, 1 skipped, 1 failed.
//! ```
//!
//! One glyph is printed per suite: `.` passed, `s` skipped, `!` failed.
//! For every failed suite grill writes a sibling `.err` file containing
//! the file rewritten with the observed output; accept the new output
//! with `mv file.t.err file.t`, or make the expected output match and
//! re-run. The `.err` file is removed once the suite passes again.
//!
//! Grill exits 0 when everything passed, 1 when anything failed, and 2
//! on usage errors.

pub mod cli;
pub mod diff;
pub mod errors;
pub mod hunk;
pub mod matcher;
pub mod parser;
pub mod report;
pub mod runner;
pub mod suite;
