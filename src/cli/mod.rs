use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "finanzas",
    about = "Summarize a personal-finance spreadsheet into charts and an HTML report."
)]
pub struct Cli {
    /// Spreadsheet or CSV with the movements (default: FinanzasPersonalesIA2025.xlsx)
    #[arg(long)]
    pub input: Option<String>,
    /// Worksheet name (default: Movements)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Folder for reporte.html and its graficas/ images (default: reporte)
    #[arg(long = "output-dir")]
    pub output_dir: Option<String>,
    /// Settings file (default: ./finanzas.json, then ~/.config/finanzas/settings.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Skip the per-column histograms and bar charts.
    #[arg(long = "no-overview")]
    pub no_overview: bool,
    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags override the settings file, which overrides the defaults.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(input) = &self.input {
            settings.input = input.clone();
        }
        if let Some(sheet) = &self.sheet {
            settings.sheet = sheet.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.no_overview {
            settings.overview_charts = false;
        }
        settings
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.apply(load_settings(self.config.as_deref())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "finanzas",
            "--input",
            "datos.csv",
            "--output-dir",
            "salida",
            "--no-overview",
        ]);
        let s = cli.apply(Settings::default());
        assert_eq!(s.input, "datos.csv");
        assert_eq!(s.sheet, "Movements");
        assert_eq!(s.output_dir, "salida");
        assert!(!s.overview_charts);
    }

    #[test]
    fn test_no_flags_keeps_settings() {
        let cli = Cli::parse_from(["finanzas"]);
        assert_eq!(cli.apply(Settings::default()), Settings::default());
        assert!(!cli.verbose);
    }
}
