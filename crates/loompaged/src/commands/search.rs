//! Module for one-off single-image searches.

use super::*;

/// Options for [`Commands::Search`].
#[derive(Args, Clone)]
pub struct SearchOptions {
  /// What the image should show, in plain language
  pub query: String,

  /// Requested orientation (landscape or portrait)
  #[arg(long, short, default_value = "landscape")]
  pub orientation: Orientation,

  /// Book topic used to anchor the query, e.g. "Aspen Colorado"
  #[arg(long, short)]
  pub topic: Option<String>,

  /// Image URL already used in the book; may be repeated
  #[arg(long = "exclude", short = 'x')]
  pub exclude: Vec<String>,

  /// Apply the stricter cover rules
  #[arg(long)]
  pub cover: bool,

  /// Print the result as JSON instead of a tree
  #[arg(long)]
  pub json: bool,
}

impl SearchOptions {
  /// Builds the library query these options describe.
  fn to_query(&self) -> ImageQuery {
    let usage = if self.cover { ImageUsage::Cover } else { ImageUsage::Inline };
    let mut query = ImageQuery::new(self.query.as_str())
      .with_orientation(self.orientation)
      .with_usage(usage)
      .with_excluded(ExclusionSet::from_urls(&self.exclude));
    if let Some(topic) = &self.topic {
      query = query.with_topic(topic.as_str());
    }
    query
  }
}

/// Function for the [`Commands::Search`] in the CLI.
pub async fn search(config: &Config, options: SearchOptions) -> Result<()> {
  if let Err(e) = loompage::query::validate_raw_query(&options.query) {
    eprintln!("{} {}", style(ERROR_PREFIX).red(), style(&e).red());
    return Err(e.into());
  }

  let waterfall = Waterfall::from_config(config)?;
  if !options.json {
    println!("{} Searching for \"{}\"", style(INFO_PREFIX).cyan(), style(&options.query).bold());
  }
  let resolution = waterfall.resolve(&options.to_query()).await;

  if options.json {
    let output = match &resolution {
      Resolution::Found(candidate) => serde_json::to_string_pretty(candidate)?,
      other => serde_json::to_string_pretty(&serde_json::json!({ "message": other.message() }))?,
    };
    println!("{output}");
    return Ok(());
  }

  match resolution {
    Resolution::Found(candidate) => {
      println!(
        "{} Found image via {}",
        style(SUCCESS_PREFIX).green(),
        style(candidate.provider.display_name()).bold()
      );
      print_candidate(&candidate);
    },
    other => println!("{} {}", style(WARNING_PREFIX).yellow(), other.message()),
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn options_become_a_query() {
    let options = SearchOptions {
      query:       "ridge trail".into(),
      orientation: Orientation::Portrait,
      topic:       Some("Hiking the Dolomites".into()),
      exclude:     vec!["https://images.example/a.jpg?w=10".into()],
      cover:       true,
      json:        false,
    };
    let query = options.to_query();
    assert_eq!(query.orientation(), Orientation::Portrait);
    assert_eq!(query.usage(), ImageUsage::Cover);
    assert_eq!(query.topic(), Some("Hiking the Dolomites"));
    assert!(query.excluded().contains("https://images.example/a.jpg"));
  }
}
