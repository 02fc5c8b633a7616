//! Module for reporting provider configuration.

use super::*;

/// Function for the [`Commands::Providers`] in the CLI.
///
/// Lists providers in default priority order with whether each would be queried. Landmark
/// queries move Wikimedia Commons to the front.
pub fn providers(config: &Config) -> Result<()> {
  let built = loompage::provider::build_providers(config, &config.credentials())?;
  let arranged = ProviderPriority::default().arrange(&built);

  println!("{} Providers in priority order:", style(INFO_PREFIX).cyan());
  for (index, provider) in arranged.iter().enumerate() {
    let branch = if index + 1 == arranged.len() { TREE_LEAF } else { TREE_BRANCH };
    let status =
      if provider.is_available() { style("available").green() } else { style("unavailable").red() };
    println!("   {} {:<20} {}", branch, provider.kind().display_name(), status);
  }

  if arranged.iter().all(|provider| !provider.is_available()) {
    println!(
      "{} No provider can be queried, searches will find nothing",
      style(WARNING_PREFIX).yellow()
    );
  }
  Ok(())
}
