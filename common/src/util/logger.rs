use std::io::Write;

/// Installs the global logger. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{style}{}{style:#}: {}",
                record.level(),
                record.args()
            )
        })
        .try_init();
}
