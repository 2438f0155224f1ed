use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::matcher::quote;

/// Environment defaults applied over the inherited environment so test
/// output does not depend on the invoking user's locale or terminal.
pub const DEFAULT_ENVIRONMENT: &[(&str, &str)] = &[
    ("LANG", "C"),
    ("LC_ALL", "C"),
    ("LANGUAGE", "C"),
    ("TZ", "GMT"),
    ("COLUMNS", "80"),
    ("CDPATH", ""),
    ("GREP_OPTIONS", ""),
];

/// The shared execution environment for one grill invocation: the work
/// root, the child environment, and the shell command.
///
/// Suites later run in named sub-directories of the work root; the
/// single `<root>/tmp` directory backs `TMPDIR` and friends for all of
/// them.
pub struct TestContext {
    root: TempDir,
    pub(crate) environ: BTreeMap<OsString, OsString>,
    pub(crate) shell: Vec<String>,
}

impl TestContext {
    /// Creates the work root and assembles the child environment.
    ///
    /// Meant to be called once per grill invocation.
    pub fn new(shell: &str, preserve_env: bool) -> io::Result<TestContext> {
        let root = tempfile::Builder::new().prefix("grilltests").tempdir()?;
        let tmp = root.path().join("tmp");
        fs::create_dir(&tmp)?;

        let mut environ: BTreeMap<OsString, OsString> = env::vars_os().collect();
        if !preserve_env {
            for (key, value) in DEFAULT_ENVIRONMENT {
                environ.insert(key.into(), value.into());
            }
        }
        for key in ["TMPDIR", "TEMP", "TMP", "GRILLTMP", "CRAMTMP"] {
            environ.insert(key.into(), tmp.clone().into_os_string());
        }
        environ.insert(
            "TESTSHELL".into(),
            format!("\"{}\"", quote(shell.as_bytes())).into(),
        );

        Ok(TestContext {
            root,
            environ,
            shell: shell.split(' ').map(str::to_string).collect(),
        })
    }

    /// The work root shared by all suites of this invocation.
    pub fn work_dir(&self) -> &Path {
        self.root.path()
    }

    /// Removes the work root.
    pub fn cleanup(self) -> io::Result<()> {
        self.root.close()
    }

    /// Disarms removal and returns the work root path.
    pub fn keep(self) -> PathBuf {
        self.root.keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn default_environment_overrides_the_parent() {
        let ctx = TestContext::new("/bin/sh", false).unwrap();
        assert_eq!(ctx.environ.get(OsStr::new("LANG")), Some(&OsString::from("C")));
        assert_eq!(ctx.environ.get(OsStr::new("TZ")), Some(&OsString::from("GMT")));
        assert_eq!(
            ctx.environ.get(OsStr::new("TESTSHELL")),
            Some(&OsString::from("\"/bin/sh\""))
        );
        ctx.cleanup().unwrap();
    }

    #[test]
    fn tmp_vars_point_into_the_work_root() {
        let ctx = TestContext::new("/bin/sh", false).unwrap();
        let tmp = ctx.work_dir().join("tmp");
        assert!(tmp.is_dir());
        for key in ["TMPDIR", "TEMP", "TMP", "GRILLTMP", "CRAMTMP"] {
            assert_eq!(
                ctx.environ.get(OsStr::new(key)),
                Some(&tmp.clone().into_os_string()),
                "{key}"
            );
        }
        ctx.cleanup().unwrap();
    }

    #[test]
    fn preserve_env_keeps_the_parent_locale() {
        env::set_var("GRILL_TEST_SENTINEL_VAR", "kept");
        let ctx = TestContext::new("/bin/sh", true).unwrap();
        assert_eq!(
            ctx.environ.get(OsStr::new("GRILL_TEST_SENTINEL_VAR")),
            Some(&OsString::from("kept"))
        );
        // The locale defaults are skipped, so whatever the parent had
        // (possibly nothing) survives.
        if let Some(parent_lang) = env::var_os("LANG") {
            assert_eq!(ctx.environ.get(OsStr::new("LANG")), Some(&parent_lang));
        }
        ctx.cleanup().unwrap();
    }

    #[test]
    fn work_root_uses_the_grilltests_prefix() {
        let ctx = TestContext::new("/bin/sh", false).unwrap();
        let name = ctx.work_dir().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("grilltests"), "{name}");
        ctx.cleanup().unwrap();
    }
}
