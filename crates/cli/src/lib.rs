#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Command-line front end for the NBD client.
//!
//! The crate wires argument parsing and logging around the session
//! engine: it connects to the given server, selects an export, reads
//! one block range, and writes the payload to stdout or a file. The
//! protocol engine itself lives in `nbd_client`; this layer only
//! constructs it and reports outcomes.

mod args;

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Once;

use nbd_client::Session;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use args::{Options, command, parse};

static INIT_TRACING: Once = Once::new();

/// Exit status for a usage error, mirroring common CLI conventions.
const EXIT_USAGE: u8 = 2;

/// Runs the client with explicit argument and output handles.
///
/// The handles are parameters rather than globals so tests can drive
/// the full entry point against in-memory buffers.
pub fn run_with<I, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    init_tracing();

    let options = match args::parse(arguments) {
        Ok(options) => options,
        Err(err) => {
            let _ = write!(stderr, "{err}");
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                // --help and --version render through the error path
                // but are successful invocations.
                ExitCode::SUCCESS
            };
        }
    };

    match execute(&options, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let _ = writeln!(stderr, "nbd-cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute<Out: Write>(options: &Options, stdout: &mut Out) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Session::builder(options.addr.clone(), options.export.clone());
    if options.insecure_skip_verify {
        builder = builder.danger_disable_peer_verification();
    }

    let mut session = builder.connect()?;
    let payload = session.read(options.offset, options.length)?;
    info!(
        addr = %options.addr,
        offset = options.offset,
        length = payload.len(),
        "read completed"
    );

    if options.output == "-" {
        stdout.write_all(&payload)?;
        stdout.flush()?;
    } else {
        fs::write(&options.output, &payload)?;
    }

    session.close()?;
    Ok(())
}

fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_with_status_two() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run_with(["nbd-cli"], &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::from(EXIT_USAGE));
        assert!(!stderr.is_empty());
        assert!(stdout.is_empty());
    }

    #[test]
    fn help_is_a_successful_invocation() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run_with(["nbd-cli", "--help"], &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::SUCCESS);
        let rendered = String::from_utf8(stderr).expect("help is UTF-8");
        assert!(rendered.contains("--export"), "{rendered}");
    }
}
