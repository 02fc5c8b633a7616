//! Query normalization for image searches.
//!
//! Book chapters describe what they want illustrated in loose natural language, frequently
//! with negative prompts lifted from image-generation habits ("no people", "no text"). Stock
//! photo APIs treat every word as a positive match, so those phrases actively pull in the
//! wrong photographs. This module turns such text into something a search API can use:
//!
//! - [`clean_query`] removes noise phrases and punctuation
//! - [`anchor_query_to_topic`] grounds the query in the book's subject ("Aspen", "Kyoto")
//! - [`generate_fallback_queries`] derives shorter queries that keep the subject
//! - [`is_landmark_query`] and [`is_visual_topic`] are keyword heuristics used for routing
//!
//! # Examples
//!
//! ```
//! use loompage::query::{anchor_query_to_topic, clean_query, generate_fallback_queries};
//!
//! let cleaned = clean_query("No people, mountain cabin");
//! assert_eq!(cleaned, "mountain cabin");
//!
//! let anchored = anchor_query_to_topic(&cleaned, "Aspen Colorado");
//! assert_eq!(anchored, "Aspen mountain cabin");
//!
//! assert_eq!(generate_fallback_queries(&anchored), vec!["Aspen mountain", "Aspen"]);
//! ```

use super::*;

/// Minimum number of characters a cleaned query needs before it is worth sending anywhere.
pub const MIN_QUERY_CHARS: usize = 2;

/// Longest raw query accepted from callers, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

/// Longest fallback query, in words.
const MAX_FALLBACK_WORDS: usize = 3;

/// Shortest token considered significant for relevance and fallback locking.
const SIGNIFICANT_TOKEN_CHARS: usize = 4;

lazy_static! {
  /// Anything that is not a letter, digit, whitespace, apostrophe or hyphen.
  static ref PUNCTUATION: Regex = Regex::new(r"[^\p{L}\p{N}\s'\-]+").unwrap();

  /// Noise phrases as token sequences, longest first so that "no people" wins over "people".
  static ref NOISE_PHRASES: Vec<Vec<&'static str>> = {
    let mut phrases: Vec<Vec<&'static str>> = [
      "no people", "no person", "no persons", "no human", "no humans", "no faces", "no face",
      "no crowd", "no crowds", "without people", "without humans", "without person",
      "empty of people", "no text", "no watermark", "no watermarks", "no logo", "no logos",
      "nobody", "people", "person", "persons", "human", "humans", "crowd", "crowds", "crowded",
      "portrait", "portraits", "selfie", "selfies", "tourist", "tourists", "face", "faces",
      "man", "men", "woman", "women",
    ]
    .into_iter()
    .map(|phrase| phrase.split_whitespace().collect())
    .collect();
    phrases.sort_by(|a, b| b.len().cmp(&a.len()));
    phrases
  };

  /// Words that never carry the subject of an image query.
  static ref GENERIC_TOKENS: HashSet<&'static str> = [
    "with", "from", "that", "this", "into", "over", "near", "view", "views", "image", "images",
    "photo", "photos", "photograph", "picture", "pictures", "beautiful", "best", "guide",
    "travel", "scenic", "background", "stock", "free", "high", "quality", "some", "their",
    "about", "your", "landscape", "portrait", "style", "shot", "wide", "angle", "closeup",
    "detail", "details", "scene", "showing", "featuring", "during", "under", "above",
  ]
  .into_iter()
  .collect();

  /// Words in a book topic that never make a good anchor.
  static ref TOPIC_STOPWORDS: HashSet<&'static str> = [
    "a", "an", "the", "of", "to", "in", "for", "and", "on", "at", "with", "your", "my", "our",
    "how", "what", "why", "guide", "guides", "travel", "traveler", "travelers", "best", "top",
    "ultimate", "complete", "essential", "essentials", "beginner", "beginners", "handbook",
    "introduction", "intro", "book", "edition", "tips", "things", "visit", "visiting",
    "explore", "exploring", "discover", "discovering", "trip", "vacation", "weekend", "days",
  ]
  .into_iter()
  .collect();

  // Tuned keyword heuristics. They are intentionally plain word lists.
  static ref LANDMARK_PATTERN: Regex = Regex::new(
    r"(?i)\b(hotels?|resorts?|museums?|monuments?|memorials?|national park|parks?|cathedrals?|churche?s?|basilicas?|mosques?|temples?|shrines?|palaces?|castles?|fortress|forts?|towers?|bridges?|squares?|plazas?|statues?|landmarks?|lighthouses?|abbeys?|chateaux?|ruins|opera house|stadiums?|pyramids?|colosseum|acropolis|cathedral)\b"
  )
  .unwrap();

  static ref VISUAL_TOPIC_PATTERN: Regex = Regex::new(
    r"(?i)\b(travel|trips?|destinations?|city|cities|hiking|hikes?|trails?|beach(es)?|mountains?|national parks?|islands?|food|cuisine|recipes?|cooking|baking|gardens?|gardening|architecture|photography|nature|wildlife|camping|road trip|ski|skiing|vacations?|tours?|itinerary|outdoors?|landscapes?|interior design|decor)\b"
  )
  .unwrap();
}

/// Requested image orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
  /// Wider than tall
  #[default]
  Landscape,
  /// Taller than wide
  Portrait,
}

impl Orientation {
  /// The lowercase name used by most provider APIs.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Landscape => "landscape",
      Self::Portrait => "portrait",
    }
  }

  /// Whether an image of the given dimensions has this orientation. Squares match both.
  pub fn matches(&self, width: u32, height: u32) -> bool {
    match self {
      Self::Landscape => width >= height,
      Self::Portrait => height >= width,
    }
  }
}

impl Display for Orientation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Orientation {
  type Err = LoompageError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "landscape" | "horizontal" => Ok(Self::Landscape),
      "portrait" | "vertical" => Ok(Self::Portrait),
      _ => Err(LoompageError::InvalidOrientation(s.to_string())),
    }
  }
}

/// Where the image will end up in the book.
///
/// Covers are printed full-bleed and sold commercially, so they get stricter resolution and
/// license treatment than inline chapter illustrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageUsage {
  /// An illustration inside a chapter
  #[default]
  Inline,
  /// The book cover
  Cover,
}

/// A request for an image, as received from the book-generation pipeline.
///
/// Values are immutable once built: every `with_*` method consumes the query and returns a new
/// one, and the cleaned or anchored forms are derived as fresh strings.
///
/// # Examples
///
/// ```
/// use loompage::{ImageQuery, ImageUsage, Orientation};
///
/// let query = ImageQuery::new("no people mountain cabin")
///   .with_orientation(Orientation::Landscape)
///   .with_topic("Aspen Colorado")
///   .with_usage(ImageUsage::Inline);
///
/// assert_eq!(query.prepared().as_deref(), Some("Aspen mountain cabin"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImageQuery {
  /// Text exactly as the caller supplied it
  raw:         String,
  /// Requested orientation
  orientation: Orientation,
  /// Book topic used for anchoring
  topic:       Option<String>,
  /// URLs that must not be returned
  excluded:    ExclusionSet,
  /// Intended placement
  usage:       ImageUsage,
}

impl ImageQuery {
  /// Creates a landscape, inline query with no topic and no exclusions.
  pub fn new(raw: impl Into<String>) -> Self { Self { raw: raw.into(), ..Self::default() } }

  /// Sets the requested orientation.
  pub fn with_orientation(self, orientation: Orientation) -> Self { Self { orientation, ..self } }

  /// Sets the book topic used to anchor the query. Blank topics are ignored.
  pub fn with_topic(self, topic: impl Into<String>) -> Self {
    let topic = topic.into();
    let topic = (!topic.trim().is_empty()).then_some(topic);
    Self { topic, ..self }
  }

  /// Sets the URLs that must not be returned.
  pub fn with_excluded(self, excluded: ExclusionSet) -> Self { Self { excluded, ..self } }

  /// Sets the intended placement.
  pub fn with_usage(self, usage: ImageUsage) -> Self { Self { usage, ..self } }

  /// The text as supplied.
  pub fn raw(&self) -> &str { &self.raw }

  /// The requested orientation.
  pub fn orientation(&self) -> Orientation { self.orientation }

  /// The anchoring topic, if any.
  pub fn topic(&self) -> Option<&str> { self.topic.as_deref() }

  /// The URLs that must not be returned.
  pub fn excluded(&self) -> &ExclusionSet { &self.excluded }

  /// The intended placement.
  pub fn usage(&self) -> ImageUsage { self.usage }

  /// Cleans and anchors the raw text.
  ///
  /// Returns `None` when cleaning leaves fewer than [`MIN_QUERY_CHARS`] characters, in which
  /// case no provider should be contacted at all.
  pub fn prepared(&self) -> Option<String> {
    let cleaned = clean_query(&self.raw);
    if cleaned.chars().count() < MIN_QUERY_CHARS {
      return None;
    }
    Some(match &self.topic {
      Some(topic) => anchor_query_to_topic(&cleaned, topic),
      None => cleaned,
    })
  }
}

/// Rejects caller input that is blank or longer than [`MAX_QUERY_CHARS`].
///
/// This guards the inbound edge only. A query that passes may still clean down to nothing,
/// which is an ordinary "no suitable query" outcome rather than an error.
pub fn validate_raw_query(raw: &str) -> Result<()> {
  if raw.trim().is_empty() {
    return Err(LoompageError::InvalidQuery("query must not be empty".into()));
  }
  let length = raw.chars().count();
  if length > MAX_QUERY_CHARS {
    return Err(LoompageError::InvalidQuery(format!(
      "query is {length} characters, the limit is {MAX_QUERY_CHARS}"
    )));
  }
  Ok(())
}

/// Case-folds a query, strips punctuation and noise phrases, and collapses whitespace.
///
/// Noise phrases are matched on whole words only, so "manhattan" survives while "man" does
/// not. Removal is repeated until nothing changes, which makes the function idempotent even
/// when stripping one phrase brings two halves of another together.
///
/// ```
/// use loompage::query::clean_query;
///
/// assert_eq!(clean_query("Sunset over Manhattan -- no people!"), "sunset over manhattan");
/// assert_eq!(clean_query("selfie at the beach"), "at the beach");
/// ```
pub fn clean_query(raw: &str) -> String {
  let mut current = raw.to_lowercase();
  loop {
    let next = clean_pass(&current);
    if next == current {
      return next;
    }
    current = next;
  }
}

/// One round of punctuation and noise-phrase removal.
fn clean_pass(text: &str) -> String {
  let text = PUNCTUATION.replace_all(text, " ");
  let tokens: Vec<&str> = text
    .split_whitespace()
    .map(|token| token.trim_matches(|c: char| c == '\'' || c == '-'))
    .filter(|token| !token.is_empty())
    .collect();

  let mut kept = Vec::with_capacity(tokens.len());
  let mut i = 0;
  'tokens: while i < tokens.len() {
    for phrase in NOISE_PHRASES.iter() {
      let rest = &tokens[i..];
      if rest.len() >= phrase.len() && phrase.iter().zip(rest).all(|(p, t)| p == t) {
        i += phrase.len();
        continue 'tokens;
      }
    }
    kept.push(tokens[i]);
    i += 1;
  }
  kept.join(" ")
}

/// Splits text into lowercase alphanumeric words.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
  text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).map(str::to_lowercase)
}

/// Picks the single word of a book topic that best identifies its subject.
///
/// The first capitalized word that is not a generic topic word wins ("Aspen" in "Aspen
/// Colorado", "Kyoto" in "The Ultimate Kyoto Travel Guide"). Topics with no capitalized
/// candidate fall back to their first non-generic word of three or more letters.
///
/// ```
/// use loompage::query::anchor_token;
///
/// assert_eq!(anchor_token("The Ultimate Kyoto Travel Guide").as_deref(), Some("Kyoto"));
/// assert_eq!(anchor_token("best sourdough baking").as_deref(), Some("sourdough"));
/// assert_eq!(anchor_token("The Best Guide"), None);
/// ```
pub fn anchor_token(topic: &str) -> Option<String> {
  let candidates: Vec<&str> = topic
    .split(|c: char| !c.is_alphanumeric() && c != '\'')
    .map(|w| w.trim_matches('\''))
    .filter(|w| w.chars().count() >= 3)
    .filter(|w| !TOPIC_STOPWORDS.contains(w.to_lowercase().as_str()))
    .collect();

  candidates
    .iter()
    .find(|w| w.chars().next().is_some_and(char::is_uppercase))
    .or_else(|| candidates.first())
    .map(|w| (*w).to_string())
}

/// Prepends the topic's anchor word unless the query already mentions it.
///
/// This keeps a chapter query like "mountain cabin" from returning cabins on the wrong
/// continent, without producing "Aspen Aspen mountain cabin" when the chapter already named
/// the place.
pub fn anchor_query_to_topic(cleaned: &str, topic: &str) -> String {
  let Some(anchor) = anchor_token(topic) else {
    return cleaned.to_string();
  };
  let anchor_lower = anchor.to_lowercase();
  if words(cleaned).any(|w| w == anchor_lower) {
    return cleaned.to_string();
  }
  if cleaned.is_empty() {
    anchor
  } else {
    format!("{anchor} {cleaned}")
  }
}

/// The subject-bearing words of a query: at least four characters and not generic.
///
/// Returned lowercase, in query order, without duplicates.
pub fn significant_tokens(query: &str) -> Vec<String> {
  let mut tokens: Vec<String> = Vec::new();
  for word in words(query) {
    if word.chars().count() >= SIGNIFICANT_TOKEN_CHARS
      && !GENERIC_TOKENS.contains(word.as_str())
      && !tokens.contains(&word)
    {
      tokens.push(word);
    }
  }
  tokens
}

/// Derives up to three shorter queries by keeping the leading three, two and one words.
///
/// A truncation is only produced when the query is longer than it. When the query has
/// significant tokens, every fallback must keep at least one of them; truncations that lose
/// them all are dropped, since "the old" is how a search for "the old Kyoto temples" drifts
/// into unrelated photographs. A fallback shorter than [`MIN_QUERY_CHARS`] is never produced.
///
/// ```
/// use loompage::query::generate_fallback_queries;
///
/// assert_eq!(
///   generate_fallback_queries("kyoto temple garden in autumn"),
///   vec!["kyoto temple garden", "kyoto temple", "kyoto"]
/// );
/// assert!(generate_fallback_queries("lake").is_empty());
/// ```
pub fn generate_fallback_queries(query: &str) -> Vec<String> {
  let all_words: Vec<&str> = query.split_whitespace().collect();
  let locked = significant_tokens(query);

  let mut fallbacks: Vec<String> = Vec::new();
  for n in (1..=MAX_FALLBACK_WORDS).rev() {
    if all_words.len() <= n {
      continue;
    }
    let candidate = all_words[..n].join(" ");
    if candidate.chars().count() < MIN_QUERY_CHARS {
      trace!("Dropping fallback \"{candidate}\": shorter than {MIN_QUERY_CHARS} characters");
      continue;
    }
    if !locked.is_empty() && !words(&candidate).any(|w| locked.contains(&w)) {
      trace!("Dropping fallback \"{candidate}\": no locked token from \"{query}\"");
      continue;
    }
    if !fallbacks.contains(&candidate) {
      fallbacks.push(candidate);
    }
  }
  fallbacks
}

/// Whether the query names a kind of place that public-domain archives cover best.
///
/// This is a tuned keyword heuristic (hotels, museums, monuments, parks, towers, ...), not a
/// classifier; it only decides whether Wikimedia Commons is tried first.
pub fn is_landmark_query(query: &str) -> bool { LANDMARK_PATTERN.is_match(query) }

/// Whether a book topic is inherently photographic (travel, food, nature, ...).
///
/// Like [`is_landmark_query`] this is a keyword heuristic. Topics naming a landmark also count.
pub fn is_visual_topic(topic: &str) -> bool {
  VISUAL_TOPIC_PATTERN.is_match(topic) || LANDMARK_PATTERN.is_match(topic)
}
