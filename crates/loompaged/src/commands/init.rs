//! Module for writing a starter configuration file.

use super::*;

/// Commented default configuration written by `loompage init`.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config/loompage.toml");

/// Options for [`Commands::Init`].
#[derive(Args, Clone)]
pub struct InitOptions {
  /// Overwrite an existing configuration file
  #[arg(long)]
  pub force: bool,
}

/// Function for the [`Commands::Init`] in the CLI.
pub fn init(path: &Path, options: InitOptions) -> Result<()> {
  if path.exists() && !options.force {
    println!(
      "{} Configuration already exists at {}, pass --force to overwrite it",
      style(WARNING_PREFIX).yellow(),
      path.display()
    );
    return Ok(());
  }

  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, CONFIG_TEMPLATE)?;
  info!("Wrote configuration template to {}", path.display());

  println!("{} Configuration written to {}", style(SUCCESS_PREFIX).green(), path.display());
  println!(
    "{} Set UNSPLASH_ACCESS_KEY, PIXABAY_API_KEY and PEXELS_API_KEY, or add keys to the file",
    style(INFO_PREFIX).cyan()
  );
  Ok(())
}
