use rand::Rng;

use crate::errors::GrillError;
use crate::test::Test;

/// Generates the randomized marker echoed between tests so the runner
/// can split one shell run's combined output back into per-test
/// results. The random digits make the marker unlikely to appear in
/// real output; if it does anyway, attribution fails hard instead of
/// guessing.
pub(crate) fn make_test_break() -> String {
    let mut rng = rand::thread_rng();
    let mut brk = String::from("GRILL");
    for _ in 0..8 {
        brk.push(char::from(b'0' + rng.gen_range(0..10)));
    }
    brk.push(':');
    brk
}

/// Concatenates every test's command into one script, echoing the test
/// break and the exit status after each test.
pub(crate) fn build_script(tests: &[Test], test_break: &str) -> Vec<u8> {
    let mut script = Vec::new();
    for t in tests {
        for line in &t.command {
            script.extend_from_slice(line);
            script.push(b'\n');
        }
        script.extend_from_slice(format!("echo {test_break}$?\n").as_bytes());
    }
    script
}

/// Splits the shell's combined output on test-break lines, assigning
/// observed lines and exit codes back to their tests and diffing each
/// test as its break arrives.
///
/// A break line carrying a prefix means the previous output line had no
/// trailing newline; the prefix becomes the last observed line with a
/// ` (no-eol)` marker. A non-zero exit code is appended as a `[code]`
/// line.
pub(crate) fn attribute_output(
    output: &[u8],
    test_break: &str,
    tests: &mut [Test],
) -> Result<(), GrillError> {
    let mut i = 0;
    for line in split_lines(output) {
        let parts = split_on(line, test_break.as_bytes());
        match parts.len() {
            1 => {
                let t = tests.get_mut(i).ok_or_else(|| {
                    GrillError::Shell(format!(
                        "output after the final test break: {}",
                        String::from_utf8_lossy(line)
                    ))
                })?;
                t.observed.push(line.to_vec());
            }
            2 => {
                let t = tests.get_mut(i).ok_or_else(|| {
                    GrillError::Shell("more test breaks than tests".to_string())
                })?;
                if !parts[0].is_empty() {
                    let mut last = parts[0].to_vec();
                    last.extend_from_slice(b" (no-eol)");
                    t.observed.push(last);
                }
                let code = parts[1];
                if code.is_empty() || !code.iter().all(u8::is_ascii_digit) {
                    return Err(GrillError::Shell(format!(
                        "garbled test break: {}",
                        String::from_utf8_lossy(line)
                    )));
                }
                if code != b"0" {
                    t.observed
                        .push(format!("[{}]", String::from_utf8_lossy(code)).into_bytes());
                }
                t.diff();
                i += 1;
            }
            _ => {
                return Err(GrillError::Shell(format!(
                    "more than one test break found: {}",
                    String::from_utf8_lossy(line)
                )))
            }
        }
    }
    if i != tests.len() {
        // The shell exited zero without echoing every break, e.g. an
        // `exit 0` in the middle of a test file.
        return Err(GrillError::Shell(format!(
            "shell exited before finishing the tests: got {} of {} test breaks",
            i,
            tests.len()
        )));
    }
    Ok(())
}

/// Yields output lines the way a line scanner would: the trailing
/// newline does not produce an empty final line.
fn split_lines(output: &[u8]) -> Vec<&[u8]> {
    if output.is_empty() {
        return Vec::new();
    }
    let data = output.strip_suffix(b"\n").unwrap_or(output);
    data.split(|&b| b == b'\n').collect()
}

fn split_on<'a>(line: &'a [u8], pat: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = line;
    while let Some(pos) = find(rest, pat) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + pat.len()..];
    }
    parts.push(rest);
    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
