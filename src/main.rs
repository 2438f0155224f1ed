use std::io::{self, Write};

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use grill::cli::Opts;
use grill::parser;
use grill::report;
use grill::runner::{self, TestContext};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
    std::process::exit(run());
}

fn run() -> i32 {
    let opts = match Opts::from_iter_safe(std::env::args_os()) {
        Ok(opts) => opts,
        Err(e) => {
            use structopt::clap::ErrorKind::{HelpDisplayed, VersionDisplayed};
            if matches!(e.kind, HelpDisplayed | VersionDisplayed) {
                println!("{}", e.message);
                return 0;
            }
            eprintln!("{}", e.message);
            return 2;
        }
    };
    if let Err(msg) = opts.validate() {
        eprintln!("{msg}");
        return 2;
    }

    let ctx = match TestContext::new(&opts.shell, opts.preserve_env) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("couldn't set up the test environment: {e}");
            return 1;
        }
    };

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut rc = 0;
    let mut suites = Vec::new();

    for path in &opts.tests {
        let mut suite = match parser::read_suite(path) {
            Ok(suite) => suite,
            Err(e) => {
                rc = 1;
                tracing::error!("{}: {e}", path.display());
                continue;
            }
        };

        match runner::run_suite(&ctx, &mut suite, &mut stdout, opts.verbose) {
            Ok(()) => {
                if suite.failed() {
                    rc = 1;
                    if let Err(e) = suite.write_err() {
                        tracing::error!("{e}");
                    }
                } else if let Err(e) = suite.remove_err() {
                    tracing::error!("{e}");
                }
            }
            Err(e) => {
                rc = 1;
                tracing::error!("{}: {e}", path.display());
            }
        }
        suites.push(suite);
    }

    if !opts.verbose {
        let _ = writeln!(stdout);
    }
    if let Err(e) = report::write_report(&mut stdout, &suites, 0, opts.quiet) {
        tracing::error!("{e}");
    }
    let _ = stdout.flush();

    if opts.keep_tmpdir {
        eprintln!("# Kept temporary directory: {}", ctx.keep().display());
    } else if let Err(e) = ctx.cleanup() {
        tracing::error!("couldn't remove the temporary directory: {e}");
    }

    rc
}
