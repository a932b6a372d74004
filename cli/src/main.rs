//! ember CLI: interactive lowering sessions and one-shot compilation.
//!
//! Usage:
//!   ember-cli                Interactive session (reads stdin line by line)
//!   ember-cli <SCRIPT>       Lower a source file
//!   ember-cli -e <CODE>      Lower an inline source string
//!
//! An interactive session ends at `=exit` (or end of input); the lowered
//! form of every statement is printed as it completes, failures are
//! reported as `Error: <message>`, and the whole accumulated module is
//! dumped when the session ends.

use clap::Parser;
use ember_lang::codegen::Session;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// ember SSA front end
#[derive(Parser, Debug)]
#[command(name = "ember-cli")]
#[command(version, about = "ember SSA front end", long_about = None)]
struct Args {
    /// Source file to lower (interactive session when omitted)
    script: Option<PathBuf>,

    /// Lower an inline source string
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(ref code) = args.eval {
        return run_source(code);
    }

    if let Some(ref path) = args.script {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("Error reading {:?}: {}", path, err);
                return ExitCode::from(1);
            }
        };
        return run_source(&source);
    }

    run_interactive()
}

/// Lower a complete source buffer, print each statement's lowered form,
/// and dump the module.
fn run_source(source: &str) -> ExitCode {
    let mut session = Session::new();
    let mut failed = false;

    for result in session.run_source(source) {
        match result {
            Ok(text) => print!("{text}"),
            Err(err) => {
                eprintln!("Error: {err}");
                failed = true;
            }
        }
    }

    if failed {
        return ExitCode::from(2);
    }
    print!("{}", session.module_text());
    ExitCode::SUCCESS
}

fn run_interactive() -> ExitCode {
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut session = Session::new();

    if interactive {
        prompt(&session);
    }

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("Error reading input: {err}");
                break;
            }
        };
        if line.trim() == "=exit" {
            break;
        }

        for result in session.feed_line(&line) {
            match result {
                Ok(text) => print!("{text}"),
                Err(err) => println!("Error: {err}"),
            }
        }

        if interactive {
            prompt(&session);
        }
    }

    // End of session: emit the whole accumulated module.
    print!("{}", session.module_text());
    ExitCode::SUCCESS
}

fn prompt(session: &Session) {
    // A continuation marker while a statement is still incomplete.
    if session.has_pending_input() {
        print!("   ...> ");
    } else {
        print!("ember> ");
    }
    io::stdout().flush().ok();
}
