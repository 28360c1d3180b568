use crate::cli;
use color_eyre::eyre::{eyre, Result};
use duct::cmd;
use std::env;
use std::path::{Path, PathBuf};

const BINARY: &str = "admintable";

pub fn install(args: &cli::InstallArgs) -> Result<()> {
    println!("Building {BINARY} in release mode...");
    cmd!("cargo", "build", "--bin", BINARY, "--release").run()?;

    let install_dir = match &args.path {
        Some(path) => path.clone(),
        None => default_install_dir()?,
    };

    if !install_dir.exists() {
        println!("Creating directory: {}", install_dir.display());
        std::fs::create_dir_all(&install_dir)?;
    }

    let source_path = PathBuf::from("target").join("release").join(BINARY);
    let dest_path = install_dir.join(BINARY);

    println!("Installing {BINARY} to {}", dest_path.display());
    std::fs::copy(&source_path, &dest_path)?;
    make_executable(&dest_path)?;

    println!("✓ Installed {BINARY} to {}", dest_path.display());

    if let Ok(path_var) = env::var("PATH") {
        if !in_path(&path_var, &install_dir) {
            println!("\nNote: {} is not in your PATH.", install_dir.display());
            println!("Add it by putting this line in your shell config:");
            println!("  export PATH=\"{}:$PATH\"", install_dir.display());
        }
    }

    Ok(())
}

fn default_install_dir() -> Result<PathBuf> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map_err(|_| eyre!("Could not determine home directory"))?;
    Ok(PathBuf::from(home).join(".local").join("bin"))
}

fn in_path(path_var: &str, dir: &Path) -> bool {
    env::split_paths(path_var).any(|entry| entry == dir)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
