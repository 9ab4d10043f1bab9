use std::process::{Command, Output};
use tempfile::TempDir;

fn clic(home: &TempDir, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_clic"))
		.env("CLIC_HOME", home.path())
		.env_remove("RUST_LOG")
		.args(args)
		.output()
		.unwrap()
}

fn stdout(o: &Output) -> String {
	String::from_utf8_lossy(&o.stdout).into_owned()
}

#[test]
fn state_persists_between_invocations() {
	let home = TempDir::new().unwrap();
	assert!(clic(&home, &["push", "3"]).status.success());
	assert!(clic(&home, &["push", "4"]).status.success());
	let sum = clic(&home, &["+"]);
	assert!(sum.status.success());
	assert_eq!(stdout(&sum), "7\n");
	assert_eq!(stdout(&clic(&home, &["stack"])), "7\n");
	assert_eq!(std::fs::read_to_string(home.path().join("stack.txt")).unwrap(), "7\n");
}

#[test]
fn failures_exit_nonzero() {
	let home = TempDir::new().unwrap();
	clic(&home, &["push", "9"]);
	let sqrt = clic(&home, &["sqrt"]);
	assert_eq!(sqrt.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&sqrt.stderr).starts_with("! "));
	assert_eq!(clic(&home, &["clear"]).status.code(), Some(1));
	assert_eq!(clic(&home, &["del", "nothing"]).status.code(), Some(1));
	assert_eq!(stdout(&clic(&home, &["stack"])), "9\n");
}

#[test]
fn hyphen_arguments_reach_the_engine() {
	let home = TempDir::new().unwrap();
	assert_eq!(stdout(&clic(&home, &["-", "10", "-4"])), "14\n");
	assert!(clic(&home, &["clear", "-s"]).status.success());
	assert_eq!(stdout(&clic(&home, &["stack"])), "");
}

#[test]
fn variables_across_invocations() {
	let home = TempDir::new().unwrap();
	clic(&home, &["push", "pi"]);
	clic(&home, &["pop", "x"]);
	let printed = clic(&home, &["print", "x"]);
	assert_eq!(stdout(&printed), format!("{}\n", std::f64::consts::PI));
	assert_eq!(stdout(&clic(&home, &["vars"])), format!("x = {}\n", std::f64::consts::PI));
}
