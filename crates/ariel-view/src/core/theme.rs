//! Light/dark theme selection

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Environment variable forcing the initial theme
pub const THEME_ENV: &str = "ARIEL_VIEW_THEME";

/// Process-wide color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// Map a host "prefers light color scheme" signal
    pub fn from_preference(prefers_light: bool) -> Self {
        if prefers_light {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        }
    }

    /// Read the preferred theme from the environment.
    ///
    /// `ARIEL_VIEW_THEME` wins, then the terminal's `COLORFGBG` background,
    /// then dark.
    pub fn from_environment() -> Self {
        if let Some(theme) = std::env::var(THEME_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
        {
            return theme;
        }

        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| Self::from_colorfgbg(&value))
            .unwrap_or_default()
    }

    /// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); backgrounds 7 and
    /// 15 are the light ANSI colors.
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(Self::from_preference(matches!(background, 7 | 15)))
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    /// Theme name understood by the Mermaid engine
    pub fn engine_theme(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "default",
        }
    }

    /// Label of the toolbar button that switches away from this theme
    pub fn toggle_label(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "Switch to light theme",
            ThemeMode::Light => "Switch to dark theme",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Dark.toggled().toggled(), ThemeMode::Dark);
    }

    #[test]
    fn test_engine_theme_names() {
        assert_eq!(ThemeMode::Dark.engine_theme(), "dark");
        assert_eq!(ThemeMode::Light.engine_theme(), "default");
    }

    #[test]
    fn test_parse() {
        assert_eq!("LIGHT".parse::<ThemeMode>().unwrap(), ThemeMode::Light);
        assert_eq!(" dark ".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(ThemeMode::from_colorfgbg("0;15"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::from_colorfgbg("0;default;7"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::from_colorfgbg("15;0"), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_toggle_label_names_other_theme() {
        assert_eq!(ThemeMode::Dark.toggle_label(), "Switch to light theme");
        assert_eq!(ThemeMode::Light.toggle_label(), "Switch to dark theme");
    }
}
