//! Command: print version information.

/// Print the driftcheck version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    let version = option_env!("DRIFTCHECK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    println!("driftcheck {version}");
}
