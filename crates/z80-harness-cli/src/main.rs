//! Thin binary entry point: construct the menu and hand control to stdin.
//!
//! No `clap` — the crate's only flag is optional and parsed by hand, the
//! way the teacher's runner binaries parse their handful of flags.

use z80_harness_cli::Menu;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("z80-harness-cli: interactive demo over a simulated Z80 bus");
        println!("usage: z80-harness-cli");
        println!("       (no arguments; run it and type `help` at the prompt)");
        return;
    }

    Menu::new().run();
}
