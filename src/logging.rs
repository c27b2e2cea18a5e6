// Logger setup
use std::io::Write;

use env_logger::Env;

/// Initializes `env_logger` at `info` unless `RUST_LOG` says otherwise.
/// Timestamps are rendered with `date_format` in local time.
pub fn init(date_format: &str) {
    let date_format = date_format.to_string();
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                chrono::Local::now().format(&date_format),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
