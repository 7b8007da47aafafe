use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use editkit::{Command, EditOptions, Editor, VERSION};

/// Load a file into the editor core and report on it.
///
/// The target accepts an optional `:<line>` suffix to place the cursor.
#[derive(Parser, Debug)]
#[command(name = "editkit", version = VERSION)]
struct Args {
    /// File to open, optionally as <file>:<line>
    target: String,

    /// Settings file (.json or .toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Open files larger than the configured threshold without asking
    #[arg(long)]
    force: bool,
}

/// Split a trailing `:<line>` off the target when the suffix is numeric.
fn split_target(target: &str) -> (PathBuf, Option<i64>) {
    if let Some((path, line)) = target.rsplit_once(':') {
        if let Ok(line) = line.parse::<i64>() {
            if !path.is_empty() {
                return (PathBuf::from(path), Some(line));
            }
        }
    }
    (PathBuf::from(target), None)
}

fn run(args: &Args) -> anyhow::Result<Editor> {
    let opts = match &args.config {
        Some(path) => EditOptions::load_from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EditOptions::default(),
    };

    let (path, line) = split_target(&args.target);
    let mut editor = Editor::load_file(&path, &opts, args.force, &mut |_| true)?;

    if let Some(line) = line {
        // the CLI is 1-based
        editor.execute_key(&opts, Command::Goto((line - 1).max(0)));
    }

    println!(
        "{}: {} bytes, {} lines, cursor at line {}",
        path.display(),
        editor.buffer().size(),
        editor.buffer().lines(),
        editor.curs_line() + 1
    );
    Ok(editor)
}

fn main() -> ExitCode {
    if editkit::init_logging().is_err() {
        return ExitCode::FAILURE;
    }

    let args = Args::parse();
    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("editkit: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_target() {
        assert_eq!(
            split_target("notes.txt"),
            (PathBuf::from("notes.txt"), None)
        );
        assert_eq!(
            split_target("notes.txt:42"),
            (PathBuf::from("notes.txt"), Some(42))
        );
        // a non-numeric suffix is part of the file name
        assert_eq!(
            split_target("notes:final.txt"),
            (PathBuf::from("notes:final.txt"), None)
        );
    }
}
