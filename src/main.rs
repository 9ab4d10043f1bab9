use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use clic::{config::{self, Config}, exec, exec_args, stdio, State, Store};

const HELPMSG: &str = r##"Commands (separate several with ';'):

push VALUE...          push numbers, constants or variables
pop [VAR]              pop and print the top, optionally storing it in VAR
swap | dup             exchange / duplicate the top items
stack | vars           list the stack (top first) / all variables
clear [-s] [-v]        clear the stack and/or the variables
del VAR                delete a variable
load | save            reload from / write to disk immediately
+ - * / mod pow [A] [B]   binary operations, inline operands are pushed first
sqrt log abs sin cos tan  unary operations
cube neg peek rec square  macros
print VALUE            print a constant, variable or number
e pi tau π τ           push a constant

help                   this message
exit | quit            leave (state is saved)"##;

#[derive(Parser, Debug)]
#[command(name = "clic", version, about = "clic, the CLI Stack Calculator")]
struct Cli {
	///Directory holding the stack, variables and config.json [default: ~/.clic]
	#[arg(long, env = "CLIC_HOME", value_name = "DIR")]
	home: Option<PathBuf>,

	///Command to execute with its arguments, interactive mode if omitted
	#[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
	command: Vec<String>
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let Some(home) = cli.home.or_else(config::default_home) else {
		eprintln!("! Unable to locate home directory, use --home or CLIC_HOME");
		return ExitCode::FAILURE;
	};

	let cfg = Config::load(&home);
	init_tracing(cfg.as_ref().ok().and_then(|c| c.log.as_deref()));
	let cfg = cfg.unwrap_or_else(|e| {
		warn!("{e}, using defaults");
		Config::default()
	});

	let store = match Store::open(&home) {
		Ok(s) => s,
		Err(e) => {
			warn!(dir = %home.display(), "unable to create data directory: {e}");
			Store::at(&home)	//saves become no-ops
		}
	};

	let mut st = match State::load(&store) {
		Ok(s) => s,
		Err(e) => {
			eprintln!("! Unable to load state from {}: {e}", home.display());
			return ExitCode::FAILURE;
		}
	};

	let ok = if cli.command.is_empty() {
		match interactive_mode(&mut st, &store, &cfg.prompt) {
			Ok(()) => true,
			Err(e) => {
				eprintln!("! {e}");
				false
			}
		}
	}
	else {
		exec_args(&mut st, &store, &mut stdio!(), &cli.command).unwrap_or_else(|e| {
			eprintln!("! {e}");
			false
		})
	};

	//always written back, last writer wins
	if let Err(e) = st.save(&store) {
		eprintln!("! Unable to save state to {}: {e}", home.display());
		return ExitCode::FAILURE;
	}
	debug!(ok, "exiting");
	if ok {ExitCode::SUCCESS} else {ExitCode::FAILURE}
}

///`RUST_LOG` first, then the config's directive, warnings only otherwise
fn init_tracing(directive: Option<&str>) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(directive.unwrap_or("warn")))
		.unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn interactive_mode(st: &mut State, store: &Store, prompt: &str) -> Result<(), ReadlineError> {
	let mut rl = DefaultEditor::new()?;
	println!("clic, the CLI Stack Calculator v{}", env!("CARGO_PKG_VERSION"));
	println!("Type 'help' for a list of commands, 'exit' to quit");
	loop {
		match rl.readline(prompt) {
			Ok(line) => {
				let line = line.trim();
				if line.is_empty() {continue;}
				let _ = rl.add_history_entry(line);
				match line {
					"exit" | "quit" => {break;},
					"help" => {println!("{HELPMSG}");},
					_ => {exec(st, store, &mut stdio!(), line)?;}	//failures are already reported
				}
			},
			Err(ReadlineError::Interrupted | ReadlineError::Eof) => {break;},
			Err(e) => {return Err(e);}
		}
	}
	Ok(())
}
