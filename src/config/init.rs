use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, validate_config, Config, DataConfig, ScoringConfig};
use crate::model::Indicator;
use crate::scoring::{weight_errors, Weights};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn prompt_weight(indicator: Indicator, default: f64) -> Result<f64> {
    loop {
        let message = format!("  {} weight", indicator.label());
        let input = prompt_with_default(&message, &default.to_string())?;
        match parse_weight(&input) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

fn parse_weight(input: &str) -> Result<f64, String> {
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Ok(_) => Err("must be a non-negative number".to_string()),
        Err(_) => Err(format!("'{}' is not a number", input)),
    }
}

fn prompt_path(message: &str, default: &Path) -> Result<PathBuf> {
    let input = prompt_with_default(message, &default.display().to_string())?;
    if !Path::new(&input).exists() {
        println!("  Note: {} does not exist yet.", input);
    }
    Ok(PathBuf::from(input))
}

/// Write a config file atomically, creating parent directories.
pub(crate) fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    Ok(())
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Muni Compass Configuration Wizard");
    println!("=================================");
    println!();

    // 1. Data files
    let defaults = Config::default();
    println!("Where are the source tables? Paths may be relative to the directory you run from.");
    let data = DataConfig {
        municipalities: prompt_path("Municipality indicators CSV", &defaults.data.municipalities)?,
        centers: prompt_path("Educational centers CSV", &defaults.data.centers)?,
    };

    // 2. Weights
    println!();
    println!("The opportunity index blends education, housing and employment.");
    println!("Weights must be non-negative and add up to 1.0.");
    let configure_weights =
        prompt_yes_no("Configure weights? (n accepts 0.40 / 0.30 / 0.30)", false)?;
    let weights = if configure_weights {
        loop {
            let candidate = Weights {
                education: prompt_weight(Indicator::Education, defaults.scoring.weights.education)?,
                housing: prompt_weight(Indicator::Housing, defaults.scoring.weights.housing)?,
                employment: prompt_weight(
                    Indicator::Employment,
                    defaults.scoring.weights.employment,
                )?,
            };
            let errors = weight_errors(&candidate);
            if errors.is_empty() {
                break candidate;
            }
            for e in errors {
                println!("  Invalid: {}", e);
            }
            println!("  Let's try again.");
        }
    } else {
        Weights::default()
    };

    // 3. Config path
    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 4. Write config
    let config = Config {
        data,
        scoring: ScoringConfig { weights },
        ..defaults
    };
    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Refusing to write an invalid config:\n  {}", errors.join("\n  "));
    }
    write_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `muni-compass` to open the dashboard.");

    Ok(())
}
