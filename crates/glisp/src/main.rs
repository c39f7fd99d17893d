use std::path::PathBuf;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use glisp::{GlispError, Interpreter, Value};

#[derive(Parser)]
#[command(name = "glisp", about = "glisp: a small Lisp with a tail-calling evaluator")]
struct Cli {
    /// File to execute
    file: Option<PathBuf>,

    /// Evaluate an expression
    #[arg(short, long)]
    eval: Option<String>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let interpreter = Interpreter::new();

    if let Some(expr) = &cli.eval {
        match interpreter.eval_str(expr) {
            Ok(val) => print_result(&val),
            Err(e) => {
                report(&e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(file) = &cli.file {
        tracing::debug!(file = %file.display(), "running file");
        match std::fs::read_to_string(file) {
            Ok(content) => {
                if let Err(e) = interpreter.eval_str(&content) {
                    eprintln!("in {}:", file.display());
                    report(&e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error reading {}: {e}", file.display());
                std::process::exit(1);
            }
        }
        return;
    }

    repl(interpreter);
}

/// `GLISP_LOG` takes precedence over `RUST_LOG`; warnings only by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GLISP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(val: &Value) {
    if !val.is_nil() {
        println!("{val}");
    }
}

fn stage(e: &GlispError) -> &'static str {
    match e.inner() {
        GlispError::Read(_) => "READ ERROR",
        GlispError::Parse(_) => "PARSE ERROR",
        _ => "EVAL ERROR",
    }
}

fn report(e: &GlispError) {
    eprintln!("{}: {e}", stage(e));
    if let Some(hint) = e.hint() {
        eprintln!("  hint: {hint}");
    }
}

fn repl(interpreter: Interpreter) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to create line editor: {e}");
            std::process::exit(1);
        }
    };
    let history_path = dirs_path().join("history.txt");
    let _ = rl.load_history(&history_path);

    println!("glisp v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ,help for help, ,quit to exit\n");

    // Text typed so far that does not yet end a datum.
    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() { "glisp> " } else { "  ... " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) if !pending.is_empty() => {
                pending.clear();
                println!("^C");
                continue;
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if pending.is_empty() && trimmed.starts_with(',') {
            match trimmed {
                ",quit" | ",exit" | ",q" => break,
                ",help" | ",h" => print_help(),
                ",env" => print_env(&interpreter),
                other => eprintln!("Unknown command {other}; try ,help"),
            }
            continue;
        }
        if !trimmed.is_empty() {
            let _ = rl.add_history_entry(trimmed);
        }

        pending.push_str(&line);
        pending.push('\n');
        pending = eval_complete_forms(&interpreter, &pending);
    }

    let _ = std::fs::create_dir_all(dirs_path());
    let _ = rl.save_history(&history_path);
}

/// Evaluate every complete datum at the front of `input`, printing results,
/// and return the unfinished remainder. Errors discard the rest of the input.
fn eval_complete_forms(interpreter: &Interpreter, input: &str) -> String {
    let mut rest = input;
    while !rest.trim().is_empty() {
        match glisp_reader::read_partial(rest) {
            Ok(Some((form, after))) => {
                match interpreter.eval(&form) {
                    Ok(val) => print_result(&val),
                    Err(e) => {
                        report(&e);
                        return String::new();
                    }
                }
                rest = after;
            }
            Ok(None) => return rest.to_string(),
            Err(e) => {
                report(&e);
                return String::new();
            }
        }
    }
    String::new()
}

fn print_help() {
    println!("glisp REPL Commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show defined variables");
    println!();
    println!("Forms:");
    println!("  (def name expr)  (def (name params...) body)");
    println!("  (fn (params...) body)  (fn name (params...) body)");
    println!("  if, let, let*, letrec, do, quote / 'x");
}

fn print_env(interpreter: &Interpreter) {
    let bindings = interpreter.global_env().bindings.borrow();
    let mut user_bindings: Vec<(String, String)> = bindings
        .iter()
        .filter(|(_, v)| !matches!(v, Value::Primitive(_)))
        .map(|(k, v)| (glisp::resolve(*k), v.to_string()))
        .collect();
    user_bindings.sort();
    if user_bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user_bindings {
            println!("  {name} = {val}");
        }
    }
}

fn dirs_path() -> PathBuf {
    dirs_home().join(".glisp")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
