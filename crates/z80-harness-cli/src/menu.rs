//! Interactive text menu.
//!
//! A `std`-based REPL over stdin/stdout, the host-side stand-in for the UART
//! menu the original firmware drove from the same core operations. Built the
//! way the teacher's binary crates are built — manual argv/line parsing, no
//! `clap`, status printed with `println!`/`eprintln!` (`emu-nes`'s
//! `main.rs` is the closest analogue in the pack).

use std::io::{self, BufRead, Write};

use z80_harness_core::{CaptureMode, CoreState, Observable};
use z80_harness_sim::{play, BusCycle, SimPlatform};

use crate::benchmark;

/// Which catalogue program is currently loaded, and the scripted bus
/// traffic it implies — stepped through one cycle at a time by `step`.
struct Loaded {
    name: &'static str,
    script: Vec<BusCycle>,
    cursor: usize,
}

/// Owns the engine and its simulated platform for the lifetime of an
/// interactive session.
pub struct Menu {
    core: CoreState,
    platform: SimPlatform,
    loaded: Option<Loaded>,
}

impl Menu {
    #[must_use]
    pub fn new() -> Self {
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.init_pins(&mut platform);
        core.init_memory_handler();
        Self { core, platform, loaded: None }
    }

    /// Run the REPL until stdin closes or `quit` is entered.
    pub fn run(&mut self) {
        println!("z80-harness-cli — type `help` for commands");
        let stdin = io::stdin();
        loop {
            print!("> ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !self.dispatch(line) {
                break;
            }
        }
    }

    /// Handle one line of input. Returns `false` to end the session.
    fn dispatch(&mut self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return true;
        };
        let rest: Vec<&str> = words.collect();

        match command {
            "help" => self.print_help(),
            "load" => self.cmd_load(rest.first().copied()),
            "freq" => self.cmd_freq(rest.first().copied()),
            "mode" => self.cmd_mode(rest.first().copied()),
            "step" => self.cmd_step(),
            "reset" => self.cmd_reset(rest.first().copied()),
            "dump" => self.cmd_dump(),
            "bench" => self.cmd_bench(),
            "quit" | "exit" => return false,
            other => eprintln!("unrecognised command: {other} (try `help`)"),
        }
        true
    }

    fn print_help(&self) {
        println!("commands:");
        println!("  load <halt|single|multi|alt>   load a catalogue program");
        println!("  freq <hz>                      set the Z80 clock frequency");
        println!("  mode <off|buffered|immediate>  set the capture mode");
        println!("  step                           advance one scripted bus cycle");
        println!("  reset [ms]                     pulse reset, holding WAIT until released");
        println!("  dump                           print every observable counter");
        println!("  bench                          run the performance self-test");
        println!("  quit                           end the session");
    }

    fn cmd_load(&mut self, name: Option<&str>) {
        let Some(name) = name else {
            eprintln!("usage: load <halt|single|multi|alt>");
            return;
        };
        let (bytes, script): (&[u8], Vec<BusCycle>) = match name {
            "halt" => (z80_harness_core::programs::HALT_ONLY, z80_harness_sim::scenario::halt_only(0x0000)),
            "single" => {
                (z80_harness_core::programs::SINGLE_WRITE, z80_harness_sim::scenario::single_write(0x0000))
            }
            "multi" => {
                (z80_harness_core::programs::MULTI_WRITE, z80_harness_sim::scenario::multi_write(0x0000))
            }
            "alt" => (
                z80_harness_core::programs::ALTERNATING_PATTERN,
                z80_harness_sim::scenario::alternating_pattern(8),
            ),
            other => {
                eprintln!("unknown program: {other} (try halt, single, multi, or alt)");
                return;
            }
        };
        match self.core.load_program_to_cache(bytes, bytes.len() as u16) {
            Ok(()) => {
                self.core.reset_isr_state();
                self.loaded = Some(Loaded { name: program_label(name), script, cursor: 0 });
                println!("loaded {name} ({} bytes)", bytes.len());
            }
            Err(e) => eprintln!("load failed: {e}"),
        }
    }

    fn cmd_freq(&mut self, hz: Option<&str>) {
        let Some(hz) = hz.and_then(|s| s.parse::<u32>().ok()) else {
            eprintln!("usage: freq <hz>");
            return;
        };
        let result = if self.core.is_running() || self.core.frequency() > 0 {
            self.core.set_frequency(&mut self.platform, hz)
        } else {
            self.core.init_clock(&mut self.platform, hz)
        };
        match result {
            Ok(()) => println!("clock set to {hz} Hz"),
            Err(e) => eprintln!("frequency rejected: {e}"),
        }
    }

    fn cmd_mode(&mut self, mode: Option<&str>) {
        let mode = match mode {
            Some("off") => CaptureMode::Off,
            Some("buffered") => CaptureMode::Buffered,
            Some("immediate") => CaptureMode::Immediate,
            _ => {
                eprintln!("usage: mode <off|buffered|immediate>");
                return;
            }
        };
        self.core.set_mode(&mut self.platform, mode);
        println!("capture mode set to {mode:?}");
    }

    fn cmd_step(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            eprintln!("no program loaded; use `load` first");
            return;
        };
        let Some(&cycle) = loaded.script.get(loaded.cursor) else {
            println!("{} script exhausted", loaded.name);
            return;
        };
        loaded.cursor += 1;
        play(&mut self.core, &mut self.platform, &[cycle]);
        self.core.process(&mut self.platform);
        println!("stepped cycle {}/{}", loaded.cursor, loaded.script.len());
    }

    /// `reset_z80(duration_ms)`: hold reset low for `duration_ms` (default
    /// 50 ms), asserting WAIT first so the Z80 halts on its first fetch
    /// after release, then release WAIT so it starts running.
    fn cmd_reset(&mut self, duration_ms: Option<&str>) {
        let duration_ms = duration_ms.and_then(|s| s.parse::<u64>().ok()).unwrap_or(50);
        self.core.begin_reset(&mut self.platform);
        std::thread::sleep(std::time::Duration::from_millis(duration_ms));
        self.core.end_reset(&mut self.platform);
        self.core.release_wait(&mut self.platform);
        println!("reset pulsed for {duration_ms} ms; WAIT released, Z80 running");
    }

    fn cmd_dump(&mut self) {
        for path in self.core.query_paths() {
            if let Some(value) = self.core.query(path) {
                println!("{path} = {value}");
            }
        }
    }

    fn cmd_bench(&mut self) {
        let report = benchmark::run(&mut self.core, &mut self.platform);
        benchmark::print_report(&report);
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

fn program_label(name: &str) -> &'static str {
    match name {
        "halt" => "HALT_ONLY",
        "single" => "SINGLE_WRITE",
        "multi" => "MULTI_WRITE",
        "alt" => "ALTERNATING_PATTERN",
        _ => "UNKNOWN",
    }
}
