//! Stack and variable files, serialized across every process on the machine
//!
//! All reads and writes happen under an exclusive advisory lock on one fixed-name lock file
//! in the system temp directory. The lock is held by an RAII guard, so it's released on
//! every exit path.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::collections::HashMap;
use fd_lock::RwLock;
use regex::Regex;
use tracing::{debug, info};
use crate::{fmt_num, parse_num};

pub const STACK_FILE: &str = "stack.txt";
pub const VARS_FILE: &str = "variables.txt";
///machine-wide lock name
pub const LOCK_NAME: &str = "clic.lock";

lazy_static! {
	///`key=value`, exactly one '=' and both sides present
	static ref VAR_LINE: Regex = Regex::new(r"^([^=]+)=([^=]+)$").unwrap();
}

///handle on the data directory
#[derive(Debug, Clone)]
pub struct Store {
	dir: PathBuf,
	lock: PathBuf
}
impl Store {
	///use `dir` as is, saves are skipped while it doesn't exist
	pub fn at(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			lock: std::env::temp_dir().join(LOCK_NAME)
		}
	}

	///create `dir` if necessary, done once at startup
	pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
		let store = Self::at(dir);
		fs::create_dir_all(&store.dir)?;
		Ok(store)
	}

	///use a different lock file, mostly for isolated tests
	pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.lock = path.into();
		self
	}

	pub fn dir(&self) -> &Path {&self.dir}

	fn lock_file(&self) -> io::Result<RwLock<File>> {
		let file = match OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&self.lock) {
			Ok(f) => f,
			Err(e) if e.kind() == io::ErrorKind::PermissionDenied => File::open(&self.lock)?,	//owned by another user, read access can still lock
			Err(e) => {return Err(e);}
		};
		Ok(RwLock::new(file))
	}

	///open a data file for reading, `None` if it doesn't exist yet
	fn reader(&self, name: &str) -> io::Result<Option<BufReader<File>>> {
		match File::open(self.dir.join(name)) {
			Ok(f) => Ok(Some(BufReader::new(f))),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e)
		}
	}

	///stack from disk, bottom to top, unparseable lines are skipped
	pub fn load_stack(&self) -> io::Result<Vec<f64>> {
		let mut lock = self.lock_file()?;
		let _guard = lock.write()?;
		let mut stk = Vec::new();
		let Some(rd) = self.reader(STACK_FILE)? else {return Ok(stk);};
		for (i, raw) in rd.split(b'\n').enumerate() {
			let raw = raw?;	//only read errors end the load, undecodable lines are skipped
			match std::str::from_utf8(&raw).ok().and_then(|l| parse_num(l.trim())) {
				Some(n) => {stk.push(n);},
				None => {debug!(line = i + 1, content = %String::from_utf8_lossy(&raw), "skipping malformed stack entry");}
			}
		}
		info!(depth = stk.len(), "stack loaded");
		Ok(stk)
	}

	///write the stack bottom to top, one number per line
	pub fn save_stack(&self, stk: &[f64]) -> io::Result<()> {
		if !self.dir.is_dir() {
			debug!(dir = %self.dir.display(), "data directory missing, stack not saved");
			return Ok(());
		}
		let mut lock = self.lock_file()?;
		let _guard = lock.write()?;
		let mut wr = BufWriter::new(File::create(self.dir.join(STACK_FILE))?);
		for n in stk {
			writeln!(wr, "{}", fmt_num(*n))?;
		}
		wr.flush()?;
		info!(depth = stk.len(), "stack saved");
		Ok(())
	}

	///variables from disk, lines that aren't `name=number` are skipped
	pub fn load_vars(&self) -> io::Result<HashMap<String, f64>> {
		let mut lock = self.lock_file()?;
		let _guard = lock.write()?;
		let mut vars = HashMap::new();
		let Some(rd) = self.reader(VARS_FILE)? else {return Ok(vars);};
		for (i, raw) in rd.split(b'\n').enumerate() {
			let raw = raw?;
			let parsed = std::str::from_utf8(&raw).ok()
				.and_then(|l| VAR_LINE.captures(l.trim_end_matches('\r')))
				.and_then(|c| Some((c.get(1)?.as_str().to_string(), parse_num(c.get(2)?.as_str().trim())?)));
			match parsed {
				Some((k, v)) => {vars.insert(k, v);},
				None => {debug!(line = i + 1, content = %String::from_utf8_lossy(&raw), "skipping malformed variable entry");}
			}
		}
		info!(count = vars.len(), "variables loaded");
		Ok(vars)
	}

	///write one `name=value` line per variable, sorted by name
	pub fn save_vars(&self, vars: &HashMap<String, f64>) -> io::Result<()> {
		if !self.dir.is_dir() {
			debug!(dir = %self.dir.display(), "data directory missing, variables not saved");
			return Ok(());
		}
		let mut entries: Vec<(&String, &f64)> = vars.iter().collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));
		let mut lock = self.lock_file()?;
		let _guard = lock.write()?;
		let mut wr = BufWriter::new(File::create(self.dir.join(VARS_FILE))?);
		for (k, v) in entries {
			writeln!(wr, "{k}={}", fmt_num(*v))?;
		}
		wr.flush()?;
		info!(count = vars.len(), "variables saved");
		Ok(())
	}
}
