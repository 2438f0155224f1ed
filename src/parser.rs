//! Reading `.t` files into test suites.
//!
//! A test file interleaves free-form documentation, `  $ ` command
//! lines with `  > ` continuations, and two-space-indented expected
//! output. The reader is a line scanner with exactly one line of
//! push-back, driven by a four-state machine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::GrillError;
use crate::suite::TestSuite;
use crate::test::Test;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Doc,
    CmdStart,
    CmdCont,
    Exp,
}

/// A line scanner holding at most one pushed-back line.
///
/// Lines are raw bytes with the trailing `\n` (and a preceding `\r`, if
/// any) stripped. The current line number counts returned lines and is
/// not advanced again when a pushed-back line is re-read.
struct LookaheadLines<R> {
    reader: R,
    pushed: Option<Vec<u8>>,
    line: usize,
}

impl<R: BufRead> LookaheadLines<R> {
    fn new(reader: R) -> Self {
        LookaheadLines {
            reader,
            pushed: None,
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>, GrillError> {
        if let Some(line) = self.pushed.take() {
            return Ok(Some(line));
        }
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| GrillError::ReadTest { source })?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        self.line += 1;
        Ok(Some(buf))
    }

    fn unread(&mut self, line: Vec<u8>) {
        debug_assert!(self.pushed.is_none(), "double unread");
        self.pushed = Some(line);
    }
}

/// Reads tests out of a `.t` file one at a time.
pub struct TestReader<R> {
    lines: LookaheadLines<R>,
    state: State,
}

impl<R: BufRead> TestReader<R> {
    pub fn new(reader: R) -> Self {
        TestReader {
            lines: LookaheadLines::new(reader),
            state: State::Doc,
        }
    }

    /// Reads the next test into `test`, replacing its contents.
    ///
    /// Returns `Ok(true)` when a test boundary was found with input
    /// remaining, and `Ok(false)` at end of input. A file need not end
    /// on a test boundary, so the final test may still carry data; the
    /// caller keeps it either way.
    pub fn read(&mut self, test: &mut Test) -> Result<bool, GrillError> {
        *test = Test::default();

        while let Some(line) = self.lines.next_line()? {
            if line.is_empty() {
                if self.state == State::Doc {
                    test.doc.push(line);
                    continue;
                }
                self.state = State::Doc;
                if !test.command.is_empty() {
                    self.lines.unread(line);
                    return Ok(true);
                }
                continue;
            }
            loop {
                match self.state {
                    State::Doc => {
                        if line.starts_with(b"  ") {
                            if line.starts_with(b"  $ ") {
                                self.state = State::CmdStart;
                                continue;
                            }
                            return Err(self.syntax_error("expected '$ ' after two spaces"));
                        }
                        test.doc.push(line);
                    }
                    State::CmdStart => {
                        if line.len() < 5 {
                            return Err(self.syntax_error("line too short"));
                        }
                        // Assume the next line is a continuation; the
                        // next state moves straight on to expected
                        // output if it is not.
                        self.state = State::CmdCont;
                        test.command.push(line[4..].to_vec());
                    }
                    State::CmdCont => {
                        if !line.starts_with(b"  > ") {
                            self.state = State::Exp;
                            continue;
                        }
                        test.command.push(line[4..].to_vec());
                    }
                    State::Exp => {
                        if line.starts_with(b"  $ ") {
                            self.state = State::CmdStart;
                            self.lines.unread(line);
                            return Ok(true);
                        }
                        if line.starts_with(b"  ") {
                            test.expected.push(line[2..].to_vec());
                        } else {
                            self.state = State::Doc;
                            self.lines.unread(line);
                            return Ok(true);
                        }
                    }
                }
                break;
            }
        }
        Ok(false)
    }

    fn syntax_error(&self, message: &str) -> GrillError {
        GrillError::syntax(self.lines.line, message)
    }
}

/// Parses a whole test file into a suite.
pub fn read_suite(path: &Path) -> Result<TestSuite, GrillError> {
    let file = File::open(path).map_err(|source| GrillError::ReadTest { source })?;
    let mut reader = TestReader::new(BufReader::new(file));

    let mut tests = Vec::new();
    let mut test = Test::default();
    loop {
        let more = reader.read(&mut test)?;
        tests.push(std::mem::take(&mut test));
        if !more {
            break;
        }
    }

    Ok(TestSuite {
        name: path.to_path_buf(),
        tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Result<Vec<Test>, GrillError> {
        let mut reader = TestReader::new(input.as_bytes());
        let mut tests = Vec::new();
        let mut test = Test::default();
        loop {
            let more = reader.read(&mut test)?;
            tests.push(std::mem::take(&mut test));
            if !more {
                break;
            }
        }
        Ok(tests)
    }

    fn join(lines: &[Vec<u8>]) -> String {
        let strs: Vec<_> = lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect();
        strs.join("\n")
    }

    #[test]
    fn splits_a_file_into_tests() {
        let input = "\
Run the examples:

  $ grill -q examples examples/fail.t
  .s.!.s.
  # Ran 7 tests, 2 skipped, 1 failed.
  [1]
  $ md5 examples/fail.t examples/fail.t.err
  .*\\b0f598c2b7b8ca5bcb8880e492ff6b452\\b.* (re)
  .*\\b7a23dfa85773c77648f619ad0f9df554\\b.* (re)
  $ rm examples/fail.t.err";

        let tests = read_all(input).unwrap();
        assert_eq!(tests.len(), 3);

        assert_eq!(join(&tests[0].doc), "Run the examples:\n");
        assert_eq!(join(&tests[0].command), "grill -q examples examples/fail.t");
        assert_eq!(
            join(&tests[0].expected),
            ".s.!.s.\n# Ran 7 tests, 2 skipped, 1 failed.\n[1]"
        );

        assert_eq!(join(&tests[1].doc), "");
        assert_eq!(
            join(&tests[1].command),
            "md5 examples/fail.t examples/fail.t.err"
        );
        assert_eq!(
            join(&tests[1].expected),
            ".*\\b0f598c2b7b8ca5bcb8880e492ff6b452\\b.* (re)\n.*\\b7a23dfa85773c77648f619ad0f9df554\\b.* (re)"
        );

        assert_eq!(join(&tests[2].command), "rm examples/fail.t.err");
        assert!(tests[2].expected.is_empty());
    }

    #[test]
    fn continuation_lines_extend_the_command() {
        let tests = read_all("  $ echo foo \\\n  > bar\n  foo bar\n").unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(join(&tests[0].command), "echo foo \\\nbar");
        assert_eq!(join(&tests[0].expected), "foo bar");
    }

    #[test]
    fn command_whitespace_is_preserved_verbatim() {
        let tests = read_all("  $ echo  'two  spaces'\n").unwrap();
        assert_eq!(join(&tests[0].command), "echo  'two  spaces'");
    }

    #[test]
    fn blank_line_ends_a_test_once_a_command_was_seen() {
        let input = "  $ echo one\n  one\n\ndoc for the next test\n\n  $ echo two\n  two\n";
        let tests = read_all(input).unwrap();
        assert_eq!(tests.len(), 2);
        assert_eq!(join(&tests[0].command), "echo one");
        // The separating blank line and the prose belong to the next
        // test's documentation.
        assert_eq!(join(&tests[1].doc), "\ndoc for the next test\n");
        assert_eq!(join(&tests[1].command), "echo two");
    }

    #[test]
    fn expected_lines_lose_only_the_indent() {
        let tests = read_all("  $ echo\n    deeply indented\n").unwrap();
        assert_eq!(join(&tests[0].expected), "  deeply indented");
    }

    #[test]
    fn doc_only_file_yields_one_skipped_test() {
        let tests = read_all("no commands here\njust prose\n").unwrap();
        assert_eq!(tests.len(), 1);
        assert!(tests[0].skipped());
        assert_eq!(join(&tests[0].doc), "no commands here\njust prose");
    }

    #[test]
    fn empty_input_yields_one_empty_test() {
        let tests = read_all("").unwrap();
        assert_eq!(tests.len(), 1);
        assert!(tests[0].skipped());
        assert!(tests[0].doc.is_empty());
    }

    #[test]
    fn trailing_blank_line_becomes_a_doc_only_test() {
        let tests = read_all("  $ echo one\n  one\n\n").unwrap();
        assert_eq!(tests.len(), 2);
        assert_eq!(join(&tests[1].doc), "");
        assert!(tests[1].skipped());
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let tests = read_all("  $ echo hi\r\n  hi\r\n").unwrap();
        assert_eq!(join(&tests[0].command), "echo hi");
        assert_eq!(join(&tests[0].expected), "hi");
    }

    #[test]
    fn two_spaces_without_dollar_is_a_syntax_error() {
        let err = read_all("some doc\n  not a command\n").unwrap_err();
        match err {
            GrillError::Syntax { line, message } => {
                assert_eq!(line, 2);
                assert_eq!(message, "expected '$ ' after two spaces");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bare_prompt_is_a_syntax_error() {
        let err = read_all("  $ \n").unwrap_err();
        match err {
            GrillError::Syntax { line, message } => {
                assert_eq!(line, 1);
                assert_eq!(message, "line too short");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn continuation_without_a_command_is_a_syntax_error() {
        let err = read_all("  > orphan continuation\n").unwrap_err();
        match err {
            GrillError::Syntax { line, message } => {
                assert_eq!(line, 1);
                assert_eq!(message, "expected '$ ' after two spaces");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn late_continuation_reads_as_expected_output() {
        // Continuations are only recognized directly after the command;
        // anywhere else the line is expected output.
        let tests = read_all("  $ echo a\n  a\n  > b\n").unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(join(&tests[0].command), "echo a");
        assert_eq!(join(&tests[0].expected), "a\n> b");
    }

    #[test]
    fn syntax_errors_count_lines_across_tests() {
        let input = "  $ echo one\n  one\n\n  bad indent line\n";
        let err = read_all(input).unwrap_err();
        match err {
            GrillError::Syntax { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
