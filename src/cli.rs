//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use clap::{Arg, ArgAction, ArgMatches, Command};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::value::Value;

pub struct Cli;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum OutputFormat {
    Xml1,
    Binary1,
    Binary15,
}

impl OutputFormat {
    fn parse(name: &str) -> OutputFormat {
        match name {
            "xml1" => OutputFormat::Xml1,
            "binary1" => OutputFormat::Binary1,
            "binary15" => OutputFormat::Binary15,
            _ => unreachable!("clap validates the format name"),
        }
    }
}

#[derive(Debug)]
enum Mode {
    Lint,
    Convert {
        format: OutputFormat,
        output: Option<String>,
        extension: Option<String>,
    },
}

impl Cli {
    pub fn build_command() -> Command {
        Command::new("proplist")
            .about("Validates and converts property list files")
            .long_about(
                "Validates property list files or converts them between the XML, \
                 binary v00 and binary v15 encodings.\n\nWithout --convert every \
                 input is lint-checked only. Conversion rewrites each input in \
                 place unless an output path or an alternate extension is given. \
                 The exit status is zero only when every input succeeds.",
            )
            .arg(
                Arg::new("lint")
                    .long("lint")
                    .help("Check syntax only, produce no output (default)")
                    .action(ArgAction::SetTrue)
                    .conflicts_with("convert"),
            )
            .arg(
                Arg::new("convert")
                    .short('c')
                    .long("convert")
                    .value_name("FORMAT")
                    .value_parser(["xml1", "binary1", "binary15"])
                    .help("Rewrite each input in the given format"),
            )
            .arg(
                Arg::new("silent")
                    .short('s')
                    .long("silent")
                    .help("Suppress success output")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("PATH")
                    .requires("convert")
                    .conflicts_with("extension")
                    .help("Output path for a single converted file ('-' for stdout)"),
            )
            .arg(
                Arg::new("extension")
                    .short('e')
                    .long("extension")
                    .value_name("EXT")
                    .requires("convert")
                    .help("Write each converted file next to its input with this extension"),
            )
            .arg(
                Arg::new("files")
                    .value_name("FILE")
                    .help("Input property list files")
                    .required(true)
                    .num_args(1..),
            )
    }

    pub fn run() -> std::process::ExitCode {
        let matches = Self::build_command().get_matches();
        if Self::run_with_matches(matches) {
            std::process::ExitCode::SUCCESS
        } else {
            std::process::ExitCode::FAILURE
        }
    }

    /// Processes every input file, printing one diagnostic line per
    /// failure. Returns true only when every input succeeded.
    pub fn run_with_matches(matches: ArgMatches) -> bool {
        let files: Vec<String> = matches
            .get_many::<String>("files")
            .expect("files are required")
            .cloned()
            .collect();

        let mode = match matches.get_one::<String>("convert") {
            Some(format) => Mode::Convert {
                format: OutputFormat::parse(format),
                output: matches.get_one::<String>("output").cloned(),
                extension: matches.get_one::<String>("extension").cloned(),
            },
            None => Mode::Lint,
        };
        let silent = matches.get_flag("silent");

        if let Mode::Convert {
            output: Some(_), ..
        } = &mode
        {
            if files.len() != 1 {
                eprintln!("proplist: -o requires exactly one input file");
                return false;
            }
        }

        let mut all_succeeded = true;
        for file in &files {
            match Self::process_file(file, &mode) {
                Ok(()) => {
                    if !silent {
                        println!("{}: OK", file);
                    }
                }
                Err(error) => {
                    all_succeeded = false;
                    eprintln!("{}: {}", file, error);
                }
            }
        }
        all_succeeded
    }

    fn process_file(file: &str, mode: &Mode) -> Result<()> {
        let data = fs::read(file)?;
        let value = crate::de::from_bytes(&data)?;

        match mode {
            Mode::Lint => Ok(()),
            Mode::Convert {
                format,
                output,
                extension,
            } => {
                let encoded = Self::encode(&value, *format)?;
                let destination = match (output, extension) {
                    (Some(path), _) if path == "-" => {
                        let stdout = std::io::stdout();
                        stdout.lock().write_all(&encoded)?;
                        return Ok(());
                    }
                    (Some(path), _) => PathBuf::from(path),
                    (None, Some(extension)) => {
                        Path::new(file).with_extension(extension.trim_start_matches('.'))
                    }
                    (None, None) => PathBuf::from(file),
                };
                tracing::debug!(
                    input = %file,
                    output = %destination.display(),
                    "converting property list"
                );
                fs::write(destination, encoded)?;
                Ok(())
            }
        }
    }

    fn encode(value: &Value, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Xml1 => crate::xml::to_string(value).map(String::into_bytes),
            OutputFormat::Binary1 => crate::ser::to_bytes_v00(value),
            OutputFormat::Binary15 => crate::ser::to_bytes_v15(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command() {
        let cmd = Cli::build_command();
        assert_eq!(cmd.get_name(), "proplist");
    }

    #[test]
    fn test_lint_conflicts_with_convert() {
        let result = Cli::build_command().try_get_matches_from(vec![
            "proplist", "--lint", "--convert", "xml1", "a.plist",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_requires_convert() {
        let result = Cli::build_command()
            .try_get_matches_from(vec!["proplist", "-o", "out.plist", "a.plist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_conflicts_with_extension() {
        let result = Cli::build_command().try_get_matches_from(vec![
            "proplist", "--convert", "xml1", "-o", "out.plist", "-e", "bin", "a.plist",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Cli::build_command()
            .try_get_matches_from(vec!["proplist", "--convert", "json", "a.plist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_input_rejected() {
        let result = Cli::build_command().try_get_matches_from(vec!["proplist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_demands_single_input() {
        let matches = Cli::build_command()
            .try_get_matches_from(vec![
                "proplist", "--convert", "xml1", "-o", "out.plist", "a.plist", "b.plist",
            ])
            .unwrap();
        assert!(!Cli::run_with_matches(matches));
    }

    #[test]
    fn test_nonexistent_input_fails() {
        let matches = Cli::build_command()
            .try_get_matches_from(vec!["proplist", "-s", "/no/such/file.plist"])
            .unwrap();
        assert!(!Cli::run_with_matches(matches));
    }
}
