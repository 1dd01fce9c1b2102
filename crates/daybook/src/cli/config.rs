//! Config command handlers

use std::path::Path;

use daybook_core::{Config, ConfigStore, RootHandle, RootSettings, ThemeMode};

/// Handle the init command
/// Returns true on success, false on error
pub async fn handle_init(settings: &ConfigStore, root: &Path) -> bool {
    if let Err(e) = tokio::fs::create_dir_all(root).await {
        eprintln!("✗ Could not create {}: {}", root.display(), e);
        return false;
    }
    let root = match tokio::fs::canonicalize(root).await {
        Ok(path) => path,
        Err(e) => {
            eprintln!("✗ Could not resolve {}: {}", root.display(), e);
            return false;
        }
    };

    match settings
        .set_root(Some(RootHandle::new(root.display().to_string())))
        .await
    {
        Ok(()) => {
            println!("✓ Journal folder set to {}", root.display());
            if let Some(path) = settings.path() {
                println!("  Config file: {}", path.display());
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Could not save config: {}", e);
            false
        }
    }
}

/// Handle the root command
/// Returns true on success, false on error
pub async fn handle_root(settings: &ConfigStore, clear: bool) -> bool {
    if clear {
        return match settings.set_root(None).await {
            Ok(()) => {
                println!("✓ Journal folder cleared");
                true
            }
            Err(e) => {
                eprintln!("✗ Could not save config: {}", e);
                false
            }
        };
    }

    match settings.current_root().await {
        Some(root) => {
            println!("{}", root);
            true
        }
        None => {
            eprintln!("No journal folder selected. Run 'daybook init <folder>' first.");
            if let Some(path) = Config::config_path() {
                eprintln!("Config file: {}", path.display());
            }
            false
        }
    }
}

/// Handle the theme command
/// Returns true on success, false on error
pub async fn handle_theme(settings: &ConfigStore, mode: Option<String>) -> bool {
    let Some(mode) = mode else {
        println!("{}", settings.theme());
        return true;
    };

    let Some(theme) = ThemeMode::parse(&mode) else {
        let known: Vec<&str> = ThemeMode::ALL.iter().map(ThemeMode::as_storage).collect();
        eprintln!("✗ Unknown theme '{}'. Use one of: {}", mode, known.join(", "));
        return false;
    };

    match settings.set_theme(theme).await {
        Ok(()) => {
            println!("✓ Theme set to {}", theme);
            true
        }
        Err(e) => {
            eprintln!("✗ Could not save config: {}", e);
            false
        }
    }
}
