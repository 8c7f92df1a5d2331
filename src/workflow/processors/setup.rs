//! Setup module - logger initialization
//!
//! Lambda ships stdout to CloudWatch, so output is plain text without ANSI.

use env_logger::{Builder, Env, WriteStyle};
use log::kv::Key;
use std::io::Write;

/// Format the `duration` key-value as `"{:.2} {unit}"`, right-aligned to 10.
fn format_duration(raw: Option<String>) -> String {
    let dur_raw = raw
        .map(|s| {
            if let Some(idx) = s.find(|c: char| c.is_alphabetic()) {
                let (num, unit) = (&s[..idx], &s[idx..]);
                if let Ok(val) = num.parse::<f32>() {
                    return format!("{:.2} {}", val, unit);
                }
            }
            s
        })
        .unwrap_or_default();

    if dur_raw.is_empty() {
        " ".repeat(10)
    } else {
        format!("{:>10}", dur_raw)
    }
}

/// Initialize the global logger. `RUST_LOG` overrides the default `info`.
pub fn initialize_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .write_style(WriteStyle::Never)
        .format(|buf, record| {
            let dur = format_duration(
                record
                    .key_values()
                    .get(Key::from("duration"))
                    .map(|v| format!("{}", v)),
            );

            writeln!(
                buf,
                "{} {:<5} {} {} {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                dur,
                record.args()
            )
        })
        // AWS SDK internals are noisy at info
        .filter(Some("aws_config"), log::LevelFilter::Warn)
        .filter(Some("aws_smithy_runtime"), log::LevelFilter::Warn)
        .filter(Some("hyper"), log::LevelFilter::Warn)
        .try_init();
}
