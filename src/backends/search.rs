//! Substring search backend
//!
//! Walks the tree, tokenizes each file and streams matching tokens into a
//! [`ResultSink`]. Files are handled one at a time in walk order; a file
//! that cannot be read is recorded as a diagnostic and contributes nothing.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::backends::walk::{validate_root, FileWalker};
use crate::core::error::ScanError;
use crate::core::file_reader::read_file_with_strategy;
use crate::core::model::{format_result_line, Diagnostic, ScanOptions, ScanReport};
use crate::core::sink::{stdout_sink, FileSink, OutputTarget, ResultSink};
use crate::core::tokenizer::{lines, normalize_newlines, tokens};

/// Tokens already emitted for the file being processed
pub type SeenSet = HashSet<String>;

/// How much to report on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Call `f` for every token of `content` containing `substring`, in order.
///
/// With `seen`, a token already in the set is skipped and new matches are
/// added to it. Returns the number of tokens passed to `f`.
pub fn for_each_match<'a, E>(
    content: &'a str,
    substring: &str,
    mut seen: Option<&mut SeenSet>,
    mut f: impl FnMut(&'a str) -> Result<(), E>,
) -> Result<usize, E> {
    let mut count = 0;
    for line in lines(content) {
        for token in tokens(line) {
            if !token.contains(substring) {
                continue;
            }
            if let Some(seen) = seen.as_deref_mut() {
                if !seen.insert(token.to_string()) {
                    continue;
                }
            }
            f(token)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Outcome of one successfully read file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileOutcome {
    pub matches: usize,
    pub lossy: bool,
}

/// Search one file, streaming its result lines into `sink`.
///
/// Read failures are recoverable errors and happen before anything is
/// written; sink failures are not recoverable.
pub fn search_file(
    path: &Path,
    opts: &ScanOptions,
    sink: &mut dyn ResultSink,
) -> Result<FileOutcome, ScanError> {
    let read = read_file_with_strategy(path, opts.encoding)?;
    let content = normalize_newlines(&read.content);

    let mut seen = opts.deduplicate.then(SeenSet::new);
    let matches = for_each_match(&content, &opts.substring, seen.as_mut(), |token| {
        sink.write_line(&format_result_line(path, token, opts.print_path))
    })?;

    Ok(FileOutcome {
        matches,
        lossy: read.lossy_conversion,
    })
}

/// Search every file under `root`.
///
/// The sink is not finished here. Per-file problems end up in the report;
/// only a sink failure aborts the walk.
pub fn search_files(
    walker: FileWalker,
    opts: &ScanOptions,
    sink: &mut dyn ResultSink,
) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();

    for entry in walker {
        let path = match entry {
            Ok(p) => p,
            Err(err) => {
                report.record(err.into());
                continue;
            }
        };

        match search_file(&path, opts, sink) {
            Ok(outcome) => {
                report.stats.files_scanned += 1;
                report.stats.matches += outcome.matches;
                if outcome.lossy {
                    report.record(Diagnostic::lossy(&path));
                }
            }
            Err(err) if err.is_recoverable() => report.record(err.into()),
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

/// Validate the root, open the sink and run the whole scan
pub fn scan(
    root: &Path,
    opts: &ScanOptions,
    target: &OutputTarget,
) -> Result<ScanReport, ScanError> {
    validate_root(root)?;

    match target {
        OutputTarget::Stdout => {
            let mut sink = stdout_sink();
            let report = search_files(FileWalker::new(root), opts, &mut sink)?;
            sink.finish()?;
            Ok(report)
        }
        OutputTarget::File(destination) => {
            let mut sink = FileSink::create(destination)?;
            let walker = FileWalker::new(root).exclude(sink.temp_path());
            let report = search_files(walker, opts, &mut sink)?;
            sink.finish()?;
            Ok(report)
        }
    }
}

/// Run the search command
pub fn run_search(
    root: &Path,
    opts: ScanOptions,
    write_to_file: Option<PathBuf>,
    show_stats: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let target = OutputTarget::from_option(write_to_file);
    let report = scan(root, &opts, &target)?;

    print_diagnostics(&report, verbosity);

    if show_stats {
        let stats =
            serde_json::to_string(&report.stats).context("Failed to serialize scan stats")?;
        eprintln!("{}", stats);
    }

    Ok(())
}

fn print_diagnostics(report: &ScanReport, verbosity: Verbosity) {
    match verbosity {
        Verbosity::Quiet => {}
        Verbosity::Normal => {
            let skipped = report.skipped().count();
            if skipped > 0 {
                eprintln!(
                    "{} skipped {} file(s); rerun with --verbose for details",
                    "warning:".yellow().bold(),
                    skipped
                );
            }
        }
        Verbosity::Verbose => {
            for diagnostic in &report.diagnostics {
                let label = format!("warning[{}]:", diagnostic.code.as_str());
                eprintln!(
                    "{} {} ({})",
                    label.as_str().yellow().bold(),
                    diagnostic.message,
                    diagnostic.path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::WriterSink;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn example_tree() -> TempDir {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("a.txt"), "foo dbo_x bar\ndbo_x again");
        write_file(&temp.path().join("sub/b.txt"), "dbo_y");
        temp
    }

    fn run(root: &Path, opts: &ScanOptions) -> (Vec<String>, ScanReport) {
        let mut sink = WriterSink::new(Vec::new());
        let report = search_files(FileWalker::new(root), opts, &mut sink).unwrap();
        sink.finish().unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        (out.lines().map(str::to_string).collect(), report)
    }

    fn matches_of(content: &str, substring: &str, dedupe: bool) -> Vec<String> {
        let mut seen = dedupe.then(SeenSet::new);
        let mut out = Vec::new();
        for_each_match(content, substring, seen.as_mut(), |t| {
            out.push(t.to_string());
            Ok::<(), ()>(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_containment_is_case_sensitive_and_literal() {
        let content = "DBO_x dbo_x xdbo_y dbo db.o_ dbo_";
        assert_eq!(
            matches_of(content, "dbo_", false),
            vec!["dbo_x", "xdbo_y", "dbo_"]
        );
        assert_eq!(matches_of("a.b axb", ".", false), vec!["a.b"]);
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let content = "dbo_b dbo_a\ndbo_b dbo_c dbo_a";
        assert_eq!(
            matches_of(content, "dbo_", true),
            vec!["dbo_b", "dbo_a", "dbo_c"]
        );
    }

    #[test]
    fn test_empty_substring_matches_empty_tokens() {
        assert_eq!(matches_of("a  b\n", "", false), vec!["a", "", "b", ""]);
        assert_eq!(matches_of("a  b\n", "", true), vec!["a", "", "b"]);
    }

    #[test]
    fn test_example_scenario() {
        let temp = example_tree();
        let (lines, report) = run(temp.path(), &ScanOptions::new("dbo_"));
        assert_eq!(lines, vec!["dbo_x", "dbo_x", "dbo_y"]);
        assert_eq!(report.stats.files_scanned, 2);
        assert_eq!(report.stats.matches, 3);
    }

    #[test]
    fn test_example_scenario_deduplicated() {
        let temp = example_tree();
        let opts = ScanOptions::new("dbo_").with_deduplicate(true);
        let (lines, _) = run(temp.path(), &opts);
        assert_eq!(lines, vec!["dbo_x", "dbo_y"]);
    }

    #[test]
    fn test_dedupe_does_not_span_files() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("one.txt"), "dbo_x dbo_x");
        write_file(&temp.path().join("two.txt"), "dbo_x");
        write_file(&temp.path().join("nested/three.txt"), "dbo_x\ndbo_x");

        let opts = ScanOptions::new("dbo_").with_deduplicate(true);
        let (lines, _) = run(temp.path(), &opts);
        assert_eq!(lines, vec!["dbo_x"; 3]);
    }

    #[test]
    fn test_print_path_prefixes_every_line() {
        let temp = example_tree();
        let opts = ScanOptions::new("dbo_").with_print_path(true);
        let (lines, _) = run(temp.path(), &opts);

        let a = temp.path().join("a.txt").display().to_string();
        let b = temp.path().join("sub").join("b.txt").display().to_string();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(&a));
        assert!(lines[1].starts_with(&a));
        assert!(lines[2].starts_with(&b));
        assert!(lines[2].ends_with(" | String: dbo_y"));
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let temp = example_tree();
        let (lines, report) = run(temp.path(), &ScanOptions::new("zzz"));
        assert!(lines.is_empty());
        assert_eq!(report.stats.matches, 0);
        assert_eq!(report.stats.files_scanned, 2);
    }

    #[test]
    fn test_invalid_utf8_does_not_abort() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.bin"), [0x64, 0x62, 0x6F, 0x5F, 0xFF, 0x7A]).unwrap();
        write_file(&temp.path().join("b.txt"), "dbo_ok");

        let (lines, report) = run(temp.path(), &ScanOptions::new("dbo_"));
        assert_eq!(lines, vec!["dbo_z", "dbo_ok"]);
        assert_eq!(report.stats.lossy_files, 1);
        assert_eq!(report.stats.files_skipped, 0);
    }

    #[test]
    fn test_skip_encoding_records_diagnostic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.bin"), [0x64, 0x62, 0x6F, 0x5F, 0xFF]).unwrap();
        write_file(&temp.path().join("b.txt"), "dbo_ok");

        let opts = ScanOptions::new("dbo_")
            .with_encoding(crate::core::file_reader::EncodingStrategy::Skip);
        let (lines, report) = run(temp.path(), &opts);
        assert_eq!(lines, vec!["dbo_ok"]);
        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(report.stats.files_scanned, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_skipped() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("a.txt"), "dbo_a");
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("b.lnk"))
            .unwrap();
        write_file(&temp.path().join("c.txt"), "dbo_c");

        let (lines, report) = run(temp.path(), &ScanOptions::new("dbo_"));
        assert_eq!(lines, vec!["dbo_a", "dbo_c"]);
        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(
            report.diagnostics[0].code,
            crate::core::model::DiagnosticCode::FileUnreadable
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        write_file(&temp.path().join("a.txt"), "dbo_a");
        let locked = temp.path().join("locked");
        write_file(&locked.join("hidden.txt"), "dbo_hidden");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let (lines, report) = run(temp.path(), &ScanOptions::new("dbo_"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(lines, vec!["dbo_a"]);
        assert_eq!(report.stats.files_scanned, 1);
        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(
            report.diagnostics[0].code,
            crate::core::model::DiagnosticCode::EntryInaccessible
        );
    }

    #[test]
    fn test_scan_to_file_inside_root() {
        let temp = example_tree();
        let dest = temp.path().join("result.txt");

        let target = OutputTarget::File(dest.clone());
        let report = scan(temp.path(), &ScanOptions::new("dbo_"), &target).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "dbo_x\ndbo_x\ndbo_y");
        assert_eq!(report.stats.files_scanned, 2);
    }

    #[test]
    fn test_scan_missing_root_creates_no_output() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("result.txt");
        let target = OutputTarget::File(dest.clone());

        let err = scan(&temp.path().join("missing"), &ScanOptions::new("x"), &target)
            .unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
