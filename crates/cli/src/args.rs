//! Argument parsing for the `nbd-cli` binary.

use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, value_parser};
use nbd_protocol::DEFAULT_PORT;

/// Parsed invocation options.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Options {
    /// Server address with the default port applied if absent.
    pub addr: String,
    /// Export to select, as raw bytes.
    pub export: Vec<u8>,
    /// Byte offset of the read.
    pub offset: u64,
    /// Number of bytes to read.
    pub length: u32,
    /// Destination path, or `-` for stdout.
    pub output: String,
    /// Skip verification of the server's TLS certificate.
    pub insecure_skip_verify: bool,
}

/// Builds the clap command definition.
#[must_use]
pub fn command() -> Command {
    Command::new("nbd-cli")
        .about("Read a block range from an NBD export over STARTTLS")
        .arg(
            Arg::new("addr")
                .required(true)
                .value_name("HOST[:PORT]")
                .help("Server address; port defaults to 10809"),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .short('e')
                .required(true)
                .value_name("NAME")
                .help("Name of the export to select"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_name("BYTES")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Byte offset to read from"),
        )
        .arg(
            Arg::new("length")
                .long("length")
                .short('l')
                .required(true)
                .value_name("BYTES")
                .value_parser(value_parser!(u32))
                .help("Number of bytes to read"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .default_value("-")
                .help("Write the payload to FILE instead of stdout"),
        )
        .arg(
            Arg::new("insecure-skip-verify")
                .long("insecure-skip-verify")
                .action(ArgAction::SetTrue)
                .help("Do not verify the server's TLS certificate"),
        )
}

/// Parses `args`, returning usage errors as formatted clap output.
pub fn parse<I>(args: I) -> Result<Options, clap::Error>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;

    let addr = matches
        .get_one::<String>("addr")
        .expect("addr is required")
        .clone();
    Ok(Options {
        addr: with_default_port(&addr),
        export: matches
            .get_one::<String>("export")
            .expect("export is required")
            .clone()
            .into_bytes(),
        offset: *matches.get_one::<u64>("offset").expect("offset has a default"),
        length: *matches.get_one::<u32>("length").expect("length is required"),
        output: matches
            .get_one::<String>("output")
            .expect("output has a default")
            .clone(),
        insecure_skip_verify: matches.get_flag("insecure-skip-verify"),
    })
}

/// Appends the well-known NBD port when `addr` does not carry one.
fn with_default_port(addr: &str) -> String {
    if let Some(rest) = addr.strip_prefix('[') {
        // Bracketed IPv6: a port follows the closing bracket.
        if rest
            .split_once(']')
            .is_some_and(|(_, tail)| tail.starts_with(':'))
        {
            addr.to_string()
        } else {
            format!("{addr}:{DEFAULT_PORT}")
        }
    } else if addr.chars().filter(|&c| c == ':').count() == 1 {
        // Exactly one colon means host:port is already present.
        addr.to_string()
    } else if addr.contains(':') {
        // A bare IPv6 literal needs brackets before a port can follow.
        format!("[{addr}]:{DEFAULT_PORT}")
    } else {
        format!("{addr}:{DEFAULT_PORT}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_parses_with_defaults() {
        let options = parse([
            "nbd-cli",
            "storage.example",
            "--export",
            "vm-disk",
            "--length",
            "4096",
        ])
        .expect("valid invocation");
        assert_eq!(options.addr, "storage.example:10809");
        assert_eq!(options.export, b"vm-disk");
        assert_eq!(options.offset, 0);
        assert_eq!(options.length, 4096);
        assert_eq!(options.output, "-");
        assert!(!options.insecure_skip_verify);
    }

    #[test]
    fn explicit_port_is_preserved() {
        let options = parse([
            "nbd-cli",
            "storage.example:12000",
            "-e",
            "x",
            "-l",
            "1",
        ])
        .expect("valid invocation");
        assert_eq!(options.addr, "storage.example:12000");
    }

    #[test]
    fn ipv6_literals_gain_brackets_and_the_default_port() {
        assert_eq!(with_default_port("::1"), "[::1]:10809");
        assert_eq!(with_default_port("[::1]:12000"), "[::1]:12000");
        assert_eq!(with_default_port("[::1]"), "[::1]:10809");
    }

    #[test]
    fn missing_length_is_a_usage_error() {
        let err = parse(["nbd-cli", "host", "--export", "x"]).expect_err("length is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn non_numeric_offset_is_rejected() {
        let err = parse([
            "nbd-cli",
            "host",
            "-e",
            "x",
            "-l",
            "1",
            "--offset",
            "twelve",
        ])
        .expect_err("offset must parse");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn insecure_flag_is_recognized() {
        let options = parse([
            "nbd-cli",
            "host",
            "-e",
            "x",
            "-l",
            "1",
            "--insecure-skip-verify",
        ])
        .expect("valid invocation");
        assert!(options.insecure_skip_verify);
    }
}
