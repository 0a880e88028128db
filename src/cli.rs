//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::backends::search::Verbosity;
use crate::core::file_reader::EncodingStrategy;
use crate::core::model::ScanOptions;

/// substrscan - report whitespace-delimited tokens containing a substring.
#[derive(Parser, Debug)]
#[command(name = "substrscan")]
#[command(
    author,
    version,
    about,
    long_about = r#"substrscan walks every file under DIR, splits its text on whitespace and
prints each token that contains SUBSTRING (literal, case-sensitive).

Results follow walk order, then line order, then token order within a line.

Examples:
    substrscan --dir src --substring "dbo_" --print_path
    substrscan --dir src --substring "dbo_" --deduplicate --write_to_file result.txt
"#
)]
pub struct Cli {
    /// Directory to search.
    #[arg(
        long,
        value_name = "DIR",
        long_help = "Root directory to scan recursively.\n\n\
Every regular file below it is read, including hidden files. The scan fails\n\
before producing any output if DIR does not exist or is not a directory."
    )]
    pub dir: PathBuf,

    /// Substring to search for.
    #[arg(
        long,
        value_name = "SUBSTRING",
        allow_hyphen_values = true,
        long_help = "Literal substring to search for inside each token.\n\n\
Matching is case-sensitive and has no wildcard or regex semantics. An empty\n\
substring matches every token, including the empty tokens produced by\n\
adjacent whitespace."
    )]
    pub substring: String,

    /// Print the file path of each match.
    #[arg(
        long = "print_path",
        long_help = "Prefix each result with the path of the file it was found in.\n\n\
The path is padded to 100 columns and followed by ` | String: ` and the token."
    )]
    pub print_path: bool,

    /// Deduplicate results within each file.
    #[arg(
        long = "deduplicate",
        long_help = "Emit each distinct token at most once per file (first occurrence wins).\n\n\
The same token found in two different files is still reported twice."
    )]
    pub deduplicate: bool,

    /// Write the results to a file.
    #[arg(
        long = "write_to_file",
        value_name = "FILE",
        long_help = "Write results to FILE instead of stdout, joined by newlines with no\n\
trailing newline. An existing FILE is replaced once the scan has finished."
    )]
    pub write_to_file: Option<PathBuf>,

    /// How to handle invalid UTF-8 (ignore/replace/skip).
    #[arg(
        long = "encoding_errors",
        default_value = "ignore",
        value_parser = ["ignore", "replace", "skip"],
        value_name = "MODE",
        long_help = "Select how invalid UTF-8 content is handled.\n\n\
Supported values:\n\
- ignore (default): drop invalid byte sequences\n\
- replace: substitute U+FFFD for invalid sequences\n\
- skip: skip the whole file and report it"
    )]
    pub encoding_errors: String,

    /// Print scan statistics as JSON on stderr.
    #[arg(
        long,
        long_help = "Print a JSON object with files scanned, files skipped, lossy files and\n\
match count to stderr after the scan."
    )]
    pub stats: bool,

    /// Disable colored output.
    #[arg(
        long = "no_color",
        long_help = "Disable colored diagnostics. This is useful when redirecting stderr."
    )]
    pub no_color: bool,

    /// Quiet mode (no skipped-file summary).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (report every skipped or lossily decoded file).
    #[arg(
        short,
        long,
        long_help = "Report each file that was skipped or decoded lossily on stderr.\n\
Results on stdout are unaffected."
    )]
    pub verbose: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        let encoding: EncodingStrategy = self.encoding_errors.parse().unwrap_or_default();
        ScanOptions::new(self.substring.clone())
            .with_print_path(self.print_path)
            .with_deduplicate(self.deduplicate)
            .with_encoding(encoding)
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let opts = cli.scan_options();
    let verbosity = cli.verbosity();

    crate::backends::search::run_search(&cli.dir, opts, cli.write_to_file, cli.stats, verbosity)
}
