//! Configuration de l'application : styles d'export et paramètres d'exécution

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use lotplan::{to_export_color, ResolveOptions, ServiceConfig, StyleConfig};

/// Adresse d'écoute par défaut du serveur HTTP
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Nombre de requêtes simultanées par défaut
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Presets de style embarqués
pub const PRESETS: [&str; 3] = ["default", "survey", "highlight"];

/// Configuration d'exécution (services, concurrence, écoute)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub concurrency: usize,
    pub bind: SocketAddr,
}

impl AppConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self> {
        let concurrency = match std::env::var("LOTPLAN_CONCURRENCY") {
            Ok(s) => s
                .parse::<usize>()
                .context(format!("Invalid LOTPLAN_CONCURRENCY: {}", s))?,
            Err(_) => DEFAULT_CONCURRENCY,
        };
        let bind = std::env::var("LOTPLAN_BIND").unwrap_or_else(|_| DEFAULT_BIND.into());

        Ok(Self {
            service: ServiceConfig::from_env(),
            concurrency: concurrency.max(1),
            bind: bind
                .parse()
                .context(format!("Invalid LOTPLAN_BIND address: {}", bind))?,
        })
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            concurrency: self.concurrency,
        }
    }
}

/// Style depuis un nom de preset ou un chemin vers un fichier JSON
pub fn load_style(name_or_path: &str) -> Result<StyleConfig> {
    if PRESETS.contains(&name_or_path) {
        return style_from_preset(name_or_path);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return load_style_file(path);
    }
    anyhow::bail!(
        "Unknown style: {}. Use a preset ({}) or a JSON file",
        name_or_path,
        PRESETS.join(", ")
    )
}

/// Style depuis un preset embarqué
pub fn style_from_preset(preset: &str) -> Result<StyleConfig> {
    match preset {
        "default" => load_embedded(include_str!("presets/default.json")),
        "survey" => load_embedded(include_str!("presets/survey.json")),
        "highlight" => load_embedded(include_str!("presets/highlight.json")),
        _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
    }
}

/// Style depuis un fichier JSON (champs absents = valeurs par défaut)
pub fn load_style_file(path: &Path) -> Result<StyleConfig> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read style file: {}", path.display()))?;
    let style: StyleConfig =
        serde_json::from_str(&content).context("Failed to parse style JSON")?;
    validate_style(&style)?;
    Ok(style)
}

fn load_embedded(json: &str) -> Result<StyleConfig> {
    serde_json::from_str(json).context("Failed to parse embedded style")
}

/// Vérifie les couleurs et l'opacité d'un style
pub fn validate_style(style: &StyleConfig) -> Result<()> {
    if style.fill_opacity > 100 {
        anyhow::bail!("fill_opacity must be between 0 and 100, got {}", style.fill_opacity);
    }
    to_export_color(&style.fill_color, style.fill_opacity)?;
    to_export_color(&style.outline_color, 100)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse_and_validate() {
        for preset in PRESETS {
            let style = style_from_preset(preset).unwrap();
            validate_style(&style).unwrap();
        }
    }

    #[test]
    fn test_default_preset_matches_builtin_default() {
        assert_eq!(style_from_preset("default").unwrap(), StyleConfig::default());
    }

    #[test]
    fn test_unknown_preset() {
        assert!(style_from_preset("neon").is_err());
        assert!(load_style("does/not/exist.json").is_err());
    }

    #[test]
    fn test_partial_style_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.json");
        std::fs::write(&path, r##"{"fill_color":"#00ff00","folder_name":"Farm"}"##).unwrap();

        let style = load_style(path.to_str().unwrap()).unwrap();
        assert_eq!(style.fill_color, "#00ff00");
        assert_eq!(style.folder_name, "Farm");
        assert_eq!(style.fill_opacity, StyleConfig::default().fill_opacity);
    }

    #[test]
    fn test_invalid_style_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.json");
        std::fs::write(&path, r#"{"outline_color":"black"}"#).unwrap();
        assert!(load_style_file(&path).is_err());
    }
}
