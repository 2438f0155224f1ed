use std::path::PathBuf;
use structopt::StructOpt;

/// Options for the CLI.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "grill",
    about = "Functional testing for command-line applications."
)]
pub struct Opts {
    /// Test files to run.
    #[structopt(name = "TESTS", parse(from_os_str), required = true)]
    pub tests: Vec<PathBuf>,

    /// Shell to use for running tests.
    #[structopt(long, default_value = "/bin/sh")]
    pub shell: String,

    /// Don't reset common environment variables.
    #[structopt(long)]
    pub preserve_env: bool,

    /// Keep temporary directories.
    #[structopt(long)]
    pub keep_tmpdir: bool,

    /// Don't print diffs.
    #[structopt(short, long)]
    pub quiet: bool,

    /// Show file names and test status instead of progress glyphs.
    #[structopt(short, long)]
    pub verbose: bool,

    /// Number of spaces to use for indentation.
    #[structopt(long, default_value = "2")]
    pub indent: usize,

    /// Answer yes to all questions.
    #[structopt(long)]
    pub yes: bool,

    /// Answer no to all questions.
    #[structopt(long, conflicts_with = "yes")]
    pub no: bool,
}

impl Opts {
    /// Checks constraints the derive cannot express. Violations are
    /// usage errors.
    pub fn validate(&self) -> Result<(), String> {
        if self.indent < 1 {
            return Err("--indent must be >= 1".to_string());
        }
        if self.shell.is_empty() {
            return Err("--shell must not be empty".to_string());
        }
        Ok(())
    }
}
