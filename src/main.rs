//! pseudoasm: run and debug PseudoAsm programs

use std::collections::VecDeque;
use std::env;
use std::io::{self, Write};

use anyhow::{bail, Context};
use pseudoasm::config::Config;
use pseudoasm::debugger::Session;
use pseudoasm::interpreter::{NumberIo, OutputSink, StepResult, StopReason};

const USAGE: &str = "Usage: pseudoasm <program.asm> [--run] [--trace-stack] [--input N,N,...]";

/// Commands and their help text. Synonyms follow the entry that carries the help.
const COMMANDS: &[(&str, Option<&str>)] = &[
    ("i", Some("Display registers and next instruction")),
    ("status", None),
    ("r", Some("Run the program")),
    ("run", None),
    ("s", Some("Execute the next instruction")),
    ("step", None),
    ("exec", Some("Execute an instruction: exec instruction")),
    ("e", None),
    ("bp", Some("Set a breakpoint: bp address")),
    ("bpl", Some("List all breakpoints")),
    ("bpd", Some("Delete a breakpoint: bpd address")),
    ("a", Some("Assemble an instruction and save it to memory: a address instruction")),
    ("asm", None),
    ("stack", Some("Manipulate the stack: stack, stack address, stack trace on/off")),
    ("exit", Some("Exit the debugger")),
    ("quit", None),
    ("help", Some("Display all commands")),
    ("h", None),
];

/// Debug output straight to the console.
struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// `INP` from `--input` values first, then from stdin. `OUT` to stdout.
struct ConsoleIo {
    queued: VecDeque<i32>,
}

impl NumberIo for ConsoleIo {
    fn read_number(&mut self) -> i32 {
        if let Some(value) = self.queued.pop_front() {
            return value;
        }

        loop {
            print!("Give a number: ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    log::warn!("No more input, reading 0");
                    return 0;
                }
                Ok(_) => match line.trim().parse() {
                    Ok(value) => return value,
                    Err(_) => println!("Invalid number, try again."),
                },
            }
        }
    }

    fn write_number(&mut self, value: i32) {
        println!("Output: {}", value);
    }
}

/// One parsed shell command.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Status,
    Run,
    Step,
    Exec(&'a str),
    SetBreakpoint(u32),
    ListBreakpoints,
    DeleteBreakpoint(u32),
    Assemble(u32, &'a str),
    ShowStack,
    SetStack(u32),
    StackTrace(bool),
    Help,
    Exit,
    Empty,
    /// Known command with bad arguments; carries the message to show.
    Usage(&'static str),
    Unknown,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let (name, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(name, rest)| (name, rest.trim()));
    let name = name.to_ascii_lowercase();

    match name.as_str() {
        "" => Command::Empty,
        "i" | "status" => Command::Status,
        "r" | "run" => Command::Run,
        "s" | "step" => Command::Step,
        "e" | "exec" if !rest.is_empty() => Command::Exec(rest),
        "e" | "exec" => Command::Usage("Usage: exec instruction"),
        "bp" => rest
            .parse()
            .map_or(Command::Usage("Usage: bp address"), Command::SetBreakpoint),
        "bpl" => Command::ListBreakpoints,
        "bpd" => rest
            .parse()
            .map_or(Command::Usage("Usage: bpd address"), Command::DeleteBreakpoint),
        "a" | "asm" => match rest.split_once(char::is_whitespace) {
            Some((addr, instr)) => addr.parse().map_or(
                Command::Usage("Usage: asm address instruction"),
                |addr| Command::Assemble(addr, instr.trim()),
            ),
            None => Command::Usage("Usage: asm address instruction"),
        },
        "stack" => {
            let words: Vec<String> = rest.split_whitespace().map(str::to_ascii_lowercase).collect();
            match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                [] => Command::ShowStack,
                ["trace", "on"] => Command::StackTrace(true),
                ["trace", "off"] => Command::StackTrace(false),
                [sp] => sp
                    .parse()
                    .map_or(Command::Usage("Invalid use of command"), Command::SetStack),
                _ => Command::Usage("Invalid use of command"),
            }
        }
        "help" | "h" => Command::Help,
        "exit" | "quit" => Command::Exit,
        _ => Command::Unknown,
    }
}

fn print_help() {
    println!("  Command List:");
    let mut i = 0;
    while i < COMMANDS.len() {
        let (name, help) = COMMANDS[i];
        let mut names = vec![name];
        i += 1;
        while i < COMMANDS.len() && COMMANDS[i].1.is_none() {
            names.push(COMMANDS[i].0);
            i += 1;
        }
        println!("{}: {}", names.join(", "), help.unwrap_or(""));
    }
}

/// Read commands until the program ends or the user leaves.
fn shell<IO: NumberIo, S: OutputSink>(session: &mut Session<IO, S>) -> anyhow::Result<()> {
    loop {
        print!(":> ");
        io::stdout().flush().context("flushing stdout")?;

        // INP reads stdin too, so no lock is held across commands.
        let mut line = String::new();
        if io::stdin().read_line(&mut line).context("reading command")? == 0 {
            break;
        }

        match parse_command(&line) {
            Command::Status => session.status(),
            Command::Run => match session.run() {
                Ok(StopReason::Breakpoint { .. }) => {}
                Ok(StopReason::Halt) | Err(_) => break,
            },
            Command::Step => {
                println!();
                match session.step() {
                    Ok(StepResult::Continue) | Ok(StepResult::Breakpoint { .. }) => {}
                    Ok(StepResult::Halt) | Err(_) => break,
                }
            }
            Command::Exec(text) => {
                let _ = session.exec(text);
            }
            Command::SetBreakpoint(address) => session.set_breakpoint(address),
            Command::ListBreakpoints => session.list_breakpoints(),
            Command::DeleteBreakpoint(address) => {
                let _ = session.delete_breakpoint(address);
            }
            Command::Assemble(address, text) => {
                let _ = session.assemble(address, text);
            }
            Command::ShowStack => session.show_stack_pointer(),
            Command::SetStack(sp) => session.set_stack_pointer(sp),
            Command::StackTrace(enabled) => session.set_stack_trace(enabled),
            Command::Help => print_help(),
            Command::Exit => break,
            Command::Empty => {}
            Command::Usage(message) => println!("{}", message),
            Command::Unknown => println!("Invalid command. Type \"help\" for a list of commands."),
        }
    }

    log::debug!(
        "Session ended after {} instructions",
        session.processor().instructions()
    );
    Ok(())
}

fn parse_inputs(list: &str) -> anyhow::Result<VecDeque<i32>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<i32>()
                .with_context(|| format!("invalid --input value '{}'", s.trim()))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut run_only = false;
    let mut trace_stack = false;
    let mut inputs = VecDeque::new();
    let mut path = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--run" => run_only = true,
            "--trace-stack" => trace_stack = true,
            "--input" => {
                let list = iter.next().context("--input needs a comma separated list")?;
                inputs = parse_inputs(list)?;
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other if other.starts_with('-') => bail!("unknown option '{}'\n{}", other, USAGE),
            other => path = Some(other),
        }
    }

    let Some(path) = path else {
        bail!("{}", USAGE);
    };

    let mut config = Config::get().clone();
    if trace_stack {
        config.trace_stack = Some(true);
    }

    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;

    println!("Initializing runtime ...");
    let io = ConsoleIo { queued: inputs };
    let mut session = Session::from_source(&source, io, ConsoleSink, &config)
        .with_context(|| format!("loading {}", path))?;

    if run_only {
        return match session.run() {
            Ok(_) => Ok(()),
            Err(e) => Err(e).with_context(|| format!("running {}", path)),
        };
    }

    shell(&mut session)
}
