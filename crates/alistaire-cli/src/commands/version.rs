//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - terminal launcher with remote job dispatch",
        style("Alistaire").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  alistaire-ir              Job description model");
    println!("  alistaire-hal             Backend abstraction and job dispatcher");
    println!("  alistaire-adapter-sim     Local statevector simulator");
    println!("  alistaire-adapter-remote  Remote job service client");
    println!("  alistaire-cli             Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
