//! Output formatting for repository listings, suggestions and plans

use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::workspace::{RepoSuggestion, RepositoryRecord};

fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print one repository path per line
pub fn print_repo_paths(repos: &[RepositoryRecord]) -> io::Result<()> {
    let mut stdout = stdout();
    write_repo_paths(&mut stdout, repos)
}

fn write_repo_paths(out: &mut impl WriteColor, repos: &[RepositoryRecord]) -> io::Result<()> {
    for repo in repos {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(out, "{}", repo.root_path.display())?;
        out.reset()?;
    }
    Ok(())
}

/// Print ranked suggestions as `name<TAB>path`
pub fn print_suggestions(suggestions: &[RepoSuggestion]) -> io::Result<()> {
    let mut stdout = stdout();
    write_suggestions(&mut stdout, suggestions)
}

fn write_suggestions(out: &mut impl WriteColor, suggestions: &[RepoSuggestion]) -> io::Result<()> {
    for s in suggestions {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        write!(out, "{}", s.name)?;
        out.reset()?;
        write!(out, "\t")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(out, "{}", s.path.display())?;
        out.reset()?;
    }
    Ok(())
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}
