//! User-facing terminal output.
//! Colored prefixes are used only when the stream is a TTY; plan lines are
//! plain so they can be piped into other tools.

use owo_colors::OwoColorize;

use crate::rename::{ActionDescription, ExecutionReport};

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// One planned action, e.g. `Rename directory: /m/a -> /m/b`.
pub fn print_action(action: &ActionDescription) {
    println!("{action}");
}

/// Error report of an execution run, one line per failed action.
pub fn print_report(report: &ExecutionReport) {
    for line in report.error_report().lines() {
        print_error(line);
    }
}
