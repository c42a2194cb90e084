//! `kubeclaw config`: Print the effective configuration.

use kubeclaw_config::AppConfig;

pub async fn run(path: bool, defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path {
        println!("{}", AppConfig::config_dir().join("config.toml").display());
        return Ok(());
    }
    if defaults {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");
    if !config.has_api_key() {
        eprintln!("warning: no API key set (DASHSCOPE_API_KEY, OPENAI_API_KEY or KUBECLAW_API_KEY)");
    }
    Ok(())
}
