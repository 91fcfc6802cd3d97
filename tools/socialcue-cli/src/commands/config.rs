//! Print the effective configuration.

use socialcue_common::config::AppConfig;

pub fn run(config: AppConfig, default: bool) -> anyhow::Result<()> {
    let config = if default { AppConfig::default() } else { config };
    println!("{}", serde_json::to_string_pretty(&config)?);

    for warning in config.lint() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
