//! Error types for command execution

use thiserror::Error;

///why a variable name was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFault {
	Empty,
	LeadingDigit,
	NotAlphanumeric,
	Constant
}
impl std::fmt::Display for NameFault {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			NameFault::Empty => "cannot be empty",
			NameFault::LeadingDigit => "cannot start with a digit",
			NameFault::NotAlphanumeric => "must be alphanumeric",
			NameFault::Constant => "cannot be a constant name"
		})
	}
}

///everything a command can fail with
#[derive(Debug, Error)]
pub enum CalcError {
	#[error("Invalid number or constant '{0}'")]
	InvalidOperand(String),

	#[error("Command '{cmd}' needs at least {needed} items on the stack")]
	InsufficientStackDepth { cmd: String, needed: usize },

	#[error("Stack empty")]
	EmptyStack,

	#[error("Variable name '{name}' {fault}")]
	InvalidVariableName { name: String, fault: NameFault },

	#[error("Variable '{0}' not found")]
	VariableNotFound(String),

	#[error("Command '{0}' needs an action, none specified")]
	MissingAction(String),

	#[error("Command '{0}' is missing its argument")]
	MissingArgument(String),

	#[error("Command '{cmd}' takes at most {max} argument(s)")]
	TooManyArguments { cmd: String, max: usize },

	#[error("Unknown command '{0}'")]
	UnknownCommand(String),

	#[error("Command '{cmd}' has no option '{option}'")]
	UnknownOption { cmd: String, option: String },

	#[error("Persistent storage: {0}")]
	Persistence(std::io::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl CalcError {
	pub fn depth(cmd: impl Into<String>, needed: usize) -> Self {
		Self::InsufficientStackDepth { cmd: cmd.into(), needed }
	}

	pub fn too_many(cmd: impl Into<String>, max: usize) -> Self {
		Self::TooManyArguments { cmd: cmd.into(), max }
	}
}

pub type Result<T> = std::result::Result<T, CalcError>;
