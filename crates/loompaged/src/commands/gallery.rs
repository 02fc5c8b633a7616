//! Module for browsing gallery results in the terminal.

use super::*;

/// Options for [`Commands::Gallery`].
#[derive(Args, Clone)]
pub struct GalleryOptions {
  /// What the images should show
  pub query: String,

  /// Maximum number of images
  #[arg(long, short, default_value_t = 20)]
  pub limit: usize,

  /// Requested orientation (landscape or portrait)
  #[arg(long, short, default_value = "landscape")]
  pub orientation: Orientation,

  /// Book topic used to anchor the query
  #[arg(long, short)]
  pub topic: Option<String>,

  /// Apply the stricter cover rules
  #[arg(long)]
  pub cover: bool,

  /// Print the gallery as JSON
  #[arg(long)]
  pub json: bool,
}

/// Function for the [`Commands::Gallery`] in the CLI.
pub async fn gallery(config: &Config, options: GalleryOptions) -> Result<()> {
  loompage::query::validate_raw_query(&options.query)?;

  let usage = if options.cover { ImageUsage::Cover } else { ImageUsage::Inline };
  let mut query = ImageQuery::new(options.query.as_str())
    .with_orientation(options.orientation)
    .with_usage(usage);
  if let Some(topic) = &options.topic {
    query = query.with_topic(topic.as_str());
  }

  let result = Gallery::from_config(config)?.search(&query, options.limit).await;
  if options.json {
    println!("{}", serde_json::to_string_pretty(&result)?);
    return Ok(());
  }

  if result.is_empty() {
    println!("{} No images found for \"{}\"", style(WARNING_PREFIX).yellow(), options.query);
    return Ok(());
  }

  println!(
    "{} {} image(s), {} print-ready",
    style(SUCCESS_PREFIX).green(),
    result.images.len(),
    result.print_ready_count
  );
  let sources: Vec<String> =
    result.sources.iter().map(|(kind, count)| format!("{} {count}", kind.display_name())).collect();
  println!("{} {}", style(INFO_PREFIX).cyan(), sources.join(", "));
  for (index, image) in result.images.iter().enumerate() {
    println!("{:>3}. {}", index + 1, style(image.provider.display_name()).bold());
    print_candidate(image);
  }
  Ok(())
}
