//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    println!(
        "{} {}",
        style("grani").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("automatic construction and training of variational quantum networks");
}
