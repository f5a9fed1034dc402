//! Configuration display command.

use console::style;

use crate::config::Settings;

/// Print the effective settings as TOML, with any API key masked.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    match &settings.source_path {
        Some(path) => eprintln!("{} {}", style("# Loaded from").dim(), path.display()),
        None => eprintln!("{}", style("# No config file; defaults and environment").dim()),
    }
    println!("{}", toml::to_string_pretty(&masked(settings))?);
    Ok(())
}

fn masked(settings: &Settings) -> Settings {
    let mut shown = settings.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("********".to_string());
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_masked() {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("sk-secret".into());
        let shown = masked(&settings);
        assert_eq!(shown.llm.api_key.as_deref(), Some("********"));

        let rendered = toml::to_string_pretty(&shown).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[retry]"));
    }
}
