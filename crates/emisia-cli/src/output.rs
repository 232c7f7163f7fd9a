use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

/// A colored status line on stdout; suppressed in JSON mode.
pub fn status(ok: bool, msg: &str) {
    if is_json() {
        return;
    }
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let color = if ok { Color::Green } else { Color::Red };
    let _ = out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write_prefix(&mut out, ok);
    let _ = out.reset();
    println!(" {msg}");
}

fn write_prefix(out: &mut StandardStream, ok: bool) -> std::io::Result<()> {
    use std::io::Write;
    write!(out, "{}", if ok { "ok" } else { "failed" })
}
