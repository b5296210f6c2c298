use std::io::Write;
use tracing::Level;

/// Line writer for the fmt layer: browser console on wasm32, stderr elsewhere.
struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        let line = line.trim_end();
        if !line.is_empty() {
            emit(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    web_sys::console::log_1(&line.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    eprintln!("{line}");
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(max_level: Level) {
    // No clock on wasm32-unknown-unknown, and the console has no ANSI support.
    let _ = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(|| ConsoleWriter)
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .try_init();
}
