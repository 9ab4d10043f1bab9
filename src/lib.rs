//! clic, the CLI Stack Calculator
//!
//! Evaluation engine: a persistent stack of `f64`, named variables, a small set of constants,
//! arithmetic/trigonometric operators and a handful of macros built from them.

use std::io::Write;
use std::collections::HashMap;
use phf::phf_map;
use tracing::debug;
#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod error;
pub mod persist;

pub use error::{CalcError, NameFault, Result};
pub use persist::Store;

///built-in constants, never persisted
static CONSTANTS: phf::Map<&'static str, f64> = phf_map! {
	"e" => std::f64::consts::E,
	"pi" => std::f64::consts::PI,
	"π" => std::f64::consts::PI,
	"tau" => std::f64::consts::TAU,
	"τ" => std::f64::consts::TAU,
};

#[inline(always)]
///look up a built-in constant
pub fn constant(name: &str) -> Option<f64> {
	CONSTANTS.get(name).copied()
}

#[inline(always)]
///locale-invariant decimal literal, also accepts `inf` and `NaN` as printed by [fmt_num]
pub fn parse_num(s: &str) -> Option<f64> {
	s.parse::<f64>().ok()
}

///number printing shared by command output and the stack/variable files:
///shortest round-trip decimal, exponent form for very large or very small magnitudes
pub fn fmt_num(n: f64) -> String {
	let a = n.abs();
	if n.is_finite() && a != 0.0 && !(1e-5..1e16).contains(&a) {
		format!("{n:e}")
	}
	else {n.to_string()}
}

///binary stack operations, `a` is the deeper operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Pow
}
impl BinOp {
	#[inline(always)]
	pub fn apply(self, a: f64, b: f64) -> f64 {
		match self {
			BinOp::Add => a + b,
			BinOp::Sub => a - b,
			BinOp::Mul => a * b,
			BinOp::Div => a / b,
			BinOp::Mod => a % b,	//sign follows the dividend
			BinOp::Pow => a.powf(b)
		}
	}
}

///unary math functions applied to the top of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
	Sqrt,
	Log,
	Abs,
	Sin,
	Cos,
	Tan
}
impl UnOp {
	#[inline(always)]
	pub fn apply(self, x: f64) -> f64 {
		match self {
			UnOp::Sqrt => x.sqrt(),
			UnOp::Log => x.ln(),
			UnOp::Abs => x.abs(),
			UnOp::Sin => x.sin(),
			UnOp::Cos => x.cos(),
			UnOp::Tan => x.tan()
		}
	}
}

///every primitive command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
	Binary(BinOp),
	Unary(UnOp),
	Push,
	Pop,
	Swap,
	Dup,
	Clear,
	Del,
	Stack,
	Vars,
	Load,
	Save
}

static COMMANDS: phf::Map<&'static str, Op> = phf_map! {
	"+" => Op::Binary(BinOp::Add),
	"-" => Op::Binary(BinOp::Sub),
	"*" => Op::Binary(BinOp::Mul),
	"/" => Op::Binary(BinOp::Div),
	"mod" => Op::Binary(BinOp::Mod),
	"pow" => Op::Binary(BinOp::Pow),
	"sqrt" => Op::Unary(UnOp::Sqrt),
	"log" => Op::Unary(UnOp::Log),
	"abs" => Op::Unary(UnOp::Abs),
	"sin" => Op::Unary(UnOp::Sin),
	"cos" => Op::Unary(UnOp::Cos),
	"tan" => Op::Unary(UnOp::Tan),
	"push" => Op::Push,
	"pop" => Op::Pop,
	"swap" => Op::Swap,
	"dup" => Op::Dup,
	"clear" => Op::Clear,
	"del" => Op::Del,
	"stack" => Op::Stack,
	"vars" => Op::Vars,
	"load" => Op::Load,
	"save" => Op::Save,
};

///look up a primitive command by name
pub fn command(name: &str) -> Option<Op> {
	COMMANDS.get(name).copied()
}

///macro bodies, `;`-separated primitive commands, `{0}` is replaced by the first argument
static MACROS: phf::Map<&'static str, &'static str> = phf_map! {
	"cube" => "pow 3",
	"neg" => "* -1",
	"peek" => "dup;pop",
	"rec" => "push 1;swap;/",
	"square" => "pow 2",
	"print" => "push {0};pop",
};

///expand a macro invocation into its command sequence, `Ok(None)` if `name` isn't a macro
pub fn expand(name: &str, args: &[&str]) -> Result<Option<String>> {
	let Some(body) = MACROS.get(name) else {return Ok(None);};
	let wants = usize::from(body.contains("{0}"));
	if args.len() > wants {
		return Err(CalcError::too_many(name, wants));
	}
	let body = if wants == 1 {
		let arg = args.first().ok_or_else(|| CalcError::MissingArgument(name.into()))?;
		if arg.contains(|c: char| c == ';' || c.is_whitespace()) {	//must stay a single operand
			return Err(CalcError::InvalidOperand(arg.to_string()));
		}
		body.replace("{0}", arg)
	}
	else {body.to_string()};
	debug!(cmd = name, expansion = %body, "macro expanded");
	Ok(Some(body))
}

///check a name before it's used as a variable
pub fn check_var_name(name: &str) -> Result<()> {
	let fault = if name.is_empty() {Some(NameFault::Empty)}
		else if name.starts_with(char::is_numeric) {Some(NameFault::LeadingDigit)}
		else if !name.chars().all(char::is_alphanumeric) {Some(NameFault::NotAlphanumeric)}
		else if CONSTANTS.contains_key(name) {Some(NameFault::Constant)}
		else {None};
	match fault {
		Some(fault) => Err(CalcError::InvalidVariableName {name: name.into(), fault}),
		None => Ok(())
	}
}

///stack and variables of one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
	///bottom to top
	stk: Vec<f64>,
	vars: HashMap<String, f64>
}
impl State {
	pub fn new(stk: Vec<f64>, vars: HashMap<String, f64>) -> Self {
		Self {stk, vars}
	}

	///read both stores from disk
	pub fn load(store: &Store) -> std::io::Result<Self> {
		Ok(Self::new(store.load_stack()?, store.load_vars()?))
	}

	///write both stores to disk
	pub fn save(&self, store: &Store) -> std::io::Result<()> {
		store.save_stack(&self.stk)?;
		store.save_vars(&self.vars)
	}

	///stack contents, bottom to top
	pub fn stack(&self) -> &[f64] {&self.stk}

	pub fn vars(&self) -> &HashMap<String, f64> {&self.vars}

	pub fn depth(&self) -> usize {self.stk.len()}

	pub fn replace(&mut self, stk: Vec<f64>, vars: HashMap<String, f64>) {
		self.stk = stk;
		self.vars = vars;
	}

	///constant, then variable, then numeric literal
	pub fn resolve(&self, token: &str) -> Result<f64> {
		constant(token)
			.or_else(|| self.vars.get(token).copied())
			.or_else(|| parse_num(token))
			.ok_or_else(|| CalcError::InvalidOperand(token.into()))
	}

	#[inline(always)]
	///pop (second, top), only if both exist
	fn take2(&mut self) -> Option<(f64, f64)> {
		if self.stk.len() < 2 {return None;}
		let b = self.stk.pop()?;
		let a = self.stk.pop()?;
		Some((a, b))
	}
}

#[inline(always)]
fn no_args(cmd: &str, args: &[&str]) -> Result<()> {
	if args.is_empty() {Ok(())} else {Err(CalcError::too_many(cmd, 0))}
}

#[inline(always)]
fn report(out: &mut dyn Write, n: f64) -> Result<()> {
	writeln!(out, "{}", fmt_num(n))?;
	Ok(())
}

///execute one primitive command or constant push, results are written to `out`
pub fn run(st: &mut State, store: &Store, out: &mut dyn Write, name: &str, args: &[&str]) -> Result<()> {
	let Some(op) = command(name) else {
		if let Some(c) = constant(name) {	//bare constant name pushes it
			no_args(name, args)?;
			st.stk.push(c);
			return report(out, c);
		}
		return Err(CalcError::UnknownCommand(name.into()));
	};
	debug!(cmd = name, ?args, depth = st.stk.len(), "dispatch");

	match op {
		Op::Binary(f) => {
			if args.len() > 2 {
				return Err(CalcError::too_many(name, 2));
			}
			for arg in args {	//inline operands are pushed as they resolve, a failure keeps the earlier ones
				let n = st.resolve(arg)?;
				st.stk.push(n);
			}
			let (a, b) = st.take2().ok_or_else(|| CalcError::depth(name, 2))?;
			let r = f.apply(a, b);
			st.stk.push(r);
			report(out, r)
		},

		Op::Unary(f) => {
			no_args(name, args)?;
			if st.stk.len() < 2 {	//same depth requirement as the binary ops
				return Err(CalcError::depth(name, 2));
			}
			let x = st.stk.pop().ok_or(CalcError::EmptyStack)?;
			let r = f.apply(x);
			st.stk.push(r);
			report(out, r)
		},

		Op::Push => {
			if args.is_empty() {
				return Err(CalcError::MissingArgument(name.into()));
			}
			let vals = args.iter().map(|a| st.resolve(a)).collect::<Result<Vec<f64>>>()?;
			st.stk.extend(vals);
			Ok(())
		},

		Op::Pop => {
			if args.len() > 1 {
				return Err(CalcError::too_many(name, 1));
			}
			let var = args.first().copied().filter(|v| !v.is_empty());
			if let Some(v) = var {check_var_name(v)?;}
			let n = st.stk.pop().ok_or(CalcError::EmptyStack)?;
			if let Some(v) = var {st.vars.insert(v.to_string(), n);}
			report(out, n)
		},

		Op::Swap => {
			no_args(name, args)?;
			let (a, b) = st.take2().ok_or_else(|| CalcError::depth(name, 2))?;
			st.stk.push(b);
			st.stk.push(a);
			Ok(())
		},

		Op::Dup => {
			no_args(name, args)?;
			let n = *st.stk.last().ok_or(CalcError::EmptyStack)?;
			st.stk.push(n);
			Ok(())
		},

		Op::Clear => {
			let (mut s, mut v) = (false, false);
			for arg in args {
				match *arg {
					"--stack" | "-s" => {s = true;},
					"--vars" | "-v" => {v = true;},
					"-sv" | "-vs" => {(s, v) = (true, true);},
					_ => {return Err(CalcError::UnknownOption {cmd: name.into(), option: arg.to_string()});}
				}
			}
			if !s && !v {
				return Err(CalcError::MissingAction(name.into()));
			}
			if s {st.stk.clear();}
			if v {st.vars.clear();}
			Ok(())
		},

		Op::Del => {
			let var = match args {
				[] => {return Err(CalcError::MissingArgument(name.into()));},
				[v] => *v,
				_ => {return Err(CalcError::too_many(name, 1));}
			};
			if var.is_empty() {
				return Err(CalcError::InvalidVariableName {name: String::new(), fault: NameFault::Empty});
			}
			st.vars.remove(var).map(|_| ()).ok_or_else(|| CalcError::VariableNotFound(var.into()))
		},

		Op::Stack => {
			no_args(name, args)?;
			for n in st.stk.iter().rev() {
				writeln!(out, "{}", fmt_num(*n))?;
			}
			Ok(())
		},

		Op::Vars => {
			no_args(name, args)?;
			let mut names: Vec<&String> = st.vars.keys().collect();
			names.sort();
			for k in names {
				writeln!(out, "{k} = {}", fmt_num(st.vars[k]))?;
			}
			Ok(())
		},

		Op::Load => {
			no_args(name, args)?;
			let stk = store.load_stack().map_err(CalcError::Persistence)?;	//read both before touching memory
			let vars = store.load_vars().map_err(CalcError::Persistence)?;
			st.replace(stk, vars);
			Ok(())
		},

		Op::Save => {
			no_args(name, args)?;
			st.save(store).map_err(CalcError::Persistence)
		}
	}
}

///execute a command word with its arguments, expanding macros
pub fn dispatch(st: &mut State, store: &Store, out: &mut dyn Write, name: &str, args: &[&str]) -> Result<()> {
	match expand(name, args)? {
		Some(body) => {
			for cmd in body.split(';') {	//expansions are primitives only
				let words: Vec<&str> = cmd.split_whitespace().collect();
				if let Some((n, a)) = words.split_first() {
					run(st, store, out, n, a)?;
				}
			}
			Ok(())
		},
		None => run(st, store, out, name, args)
	}
}

///Bundle of output streams, for brevity.
pub struct IOPair<'a> {
	pub output: &'a mut dyn Write,
	pub error: &'a mut dyn Write
}
#[macro_export]
///Default IO pair using stdout, stderr
macro_rules! stdio {
	() => {
		$crate::IOPair {
			output: &mut ::std::io::stdout(),
			error: &mut ::std::io::stderr()
		}
	}
}

///print a failure to the error stream, only stream errors pass through
fn settle(io: &mut IOPair, res: Result<()>) -> std::io::Result<bool> {
	match res {
		Ok(()) => Ok(true),
		Err(CalcError::Io(e)) => Err(e),
		Err(e) => {
			writeln!(io.error, "! {e}")?;
			Ok(false)
		}
	}
}

///Executes one already split command (word followed by arguments), as delivered by a shell.
///
///Failures are written to `io.error` prefixed with `! `, the return value tells whether the command succeeded.
///Terminates with `Err` only if a write on an IO stream fails.
pub fn exec_args<S: AsRef<str>>(st: &mut State, store: &Store, io: &mut IOPair, words: &[S]) -> std::io::Result<bool> {
	let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
	let Some((name, args)) = words.split_first() else {return Ok(true);};
	let res = dispatch(st, store, io.output, name, args);
	settle(io, res)
}

///Executes a line of `;`-separated commands on given state.
///
///Stops at the first failing command, which is reported on `io.error`.
///Returns whether every command succeeded, `Err` only if a write on an IO stream fails.
pub fn exec(st: &mut State, store: &Store, io: &mut IOPair, line: &str) -> std::io::Result<bool> {
	for cmd in line.split(';') {
		let words: Vec<&str> = cmd.split_whitespace().collect();
		if words.is_empty() {continue;}
		if !exec_args(st, store, io, &words)? {
			return Ok(false);
		}
	}
	Ok(true)
}
