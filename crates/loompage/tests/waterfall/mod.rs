use loompage::waterfall::WaterfallSettings;

use super::*;

fn waterfall(providers: Vec<Arc<dyn ImageProvider>>) -> Waterfall {
  Waterfall::new(providers, WaterfallSettings::default())
}

#[traced_test]
#[tokio::test]
async fn aspen_cabin_anchors_and_takes_first_wide_landscape() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Unsplash, &log)
      .with_hit("Aspen mountain cabin", "https://un/narrow.jpg", 1200, 800)
      .with_hit("Aspen mountain cabin", "https://un/tall.jpg", 2000, 3000)
      .shared(),
    StubProvider::new(ProviderKind::Pixabay, &log)
      .with_hit("Aspen mountain cabin", "https://px/cabin.jpg", 1600, 1067)
      .with_hit("Aspen mountain cabin", "https://px/later.jpg", 5000, 3333)
      .shared(),
    StubProvider::new(ProviderKind::Pexels, &log)
      .with_hit("Aspen mountain cabin", "https://pe/cabin.jpg", 6000, 4000)
      .shared(),
  ]);

  let query = ImageQuery::new("no people mountain cabin")
    .with_orientation(Orientation::Landscape)
    .with_topic("Aspen Colorado");
  assert_eq!(query.prepared().as_deref(), Some("Aspen mountain cabin"));

  let Resolution::Found(image) = waterfall.resolve(&query).await else {
    panic!("expected an image");
  };
  assert_eq!(image.url, "https://px/cabin.jpg");
  assert_eq!(image.attribution, "Photo by Stub via Pixabay");
  assert!(!image.print_ready);

  assert_eq!(calls(&log), vec![
    (ProviderKind::Unsplash, "Aspen mountain cabin".to_string()),
    (ProviderKind::Unsplash, "Aspen mountain".to_string()),
    (ProviderKind::Unsplash, "Aspen".to_string()),
    (ProviderKind::Pixabay, "Aspen mountain cabin".to_string()),
  ]);
  Ok(())
}

#[tokio::test]
async fn eiffel_tower_tries_wikimedia_first_then_default_order() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Unsplash, &log).shared(),
    StubProvider::new(ProviderKind::Pixabay, &log).shared(),
    StubProvider::new(ProviderKind::Pexels, &log)
      .with_hit("eiffel tower", "https://pe/eiffel.jpg", 2400, 1600)
      .shared(),
    StubProvider::new(ProviderKind::Wikimedia, &log)
      .with_hit("eiffel tower", "https://wm/eiffel-small.jpg", 1700, 1100)
      .shared(),
  ]);

  let image = waterfall.resolve(&ImageQuery::new("Eiffel Tower")).await.into_candidate();
  assert_eq!(image.map(|i| i.url).as_deref(), Some("https://pe/eiffel.jpg"));
  assert_eq!(providers_called(&log), vec![
    ProviderKind::Wikimedia,
    ProviderKind::Unsplash,
    ProviderKind::Pixabay,
    ProviderKind::Pexels,
  ]);
  Ok(())
}

#[tokio::test]
async fn wide_wikimedia_landmark_wins_immediately() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Unsplash, &log)
      .with_hit("eiffel tower", "https://un/eiffel.jpg", 6000, 4000)
      .shared(),
    StubProvider::new(ProviderKind::Wikimedia, &log)
      .with_hit("eiffel tower", "https://wm/eiffel.jpg", 1800, 1200)
      .shared(),
  ]);

  let image = waterfall.resolve(&ImageQuery::new("Eiffel Tower")).await.into_candidate();
  assert_eq!(image.map(|i| i.provider), Some(ProviderKind::Wikimedia));
  assert_eq!(providers_called(&log), vec![ProviderKind::Wikimedia]);
  Ok(())
}

#[tokio::test]
async fn nothing_anywhere_is_a_value_not_an_error() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(
    ProviderKind::ALL.into_iter().map(|kind| StubProvider::new(kind, &log).shared()).collect(),
  );

  let query = ImageQuery::new("obscure subject rarely photographed").with_topic("Aspen Ski Trips");
  let resolution = waterfall.resolve(&query).await;
  assert_eq!(resolution, Resolution::NotFound);
  assert_eq!(resolution.message(), "No suitable image found from any provider");

  // Every provider saw the full query cycle and then the emergency query.
  let log = calls(&log);
  for kind in ProviderKind::ALL {
    assert!(log.contains(&(kind, "Aspen obscure subject rarely photographed".to_string())));
    assert!(log.contains(&(kind, "Aspen landscape".to_string())));
  }
  Ok(())
}

#[tokio::test]
async fn excluded_candidate_is_not_returned_even_when_it_is_the_only_match() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Unsplash, &log)
      .with_hit("red barn", "https://un/barn.jpg?ixid=abc", 4000, 2667)
      .shared(),
  ]);

  let fresh = waterfall.resolve(&ImageQuery::new("red barn")).await;
  assert!(fresh.is_found());

  let excluded = ExclusionSet::from_urls(["HTTPS://UN/barn.jpg?w=1080"]);
  let repeat = waterfall.resolve(&ImageQuery::new("red barn").with_excluded(excluded)).await;
  assert_eq!(repeat, Resolution::NotFound);
  Ok(())
}

#[tokio::test]
async fn primary_success_invokes_nothing_else() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Unsplash, &log)
      .with_hit("tuscan vineyard at sunset", "https://un/vineyard.jpg", 3000, 2000)
      .shared(),
    StubProvider::new(ProviderKind::Pixabay, &log)
      .with_hit("tuscan vineyard at sunset", "https://px/vineyard.jpg", 3000, 2000)
      .shared(),
  ]);

  let resolution = waterfall.resolve(&ImageQuery::new("Tuscan vineyard at sunset")).await;
  assert!(resolution.is_found());
  assert_eq!(calls(&log).len(), 1);
  Ok(())
}

#[tokio::test]
async fn wikimedia_covers_need_strict_width() -> TestResult<()> {
  let log = CallLog::default();
  let waterfall = waterfall(vec![
    StubProvider::new(ProviderKind::Wikimedia, &log)
      .with_hit("harbor lights", "https://wm/harbor-1700.jpg", 1700, 1100)
      .with_hit("harbor lights", "https://wm/harbor-2200.jpg", 2200, 1400)
      .shared(),
  ]);

  let inline = waterfall.resolve(&ImageQuery::new("harbor lights")).await.into_candidate();
  assert_eq!(inline.map(|i| i.width), Some(1700));

  let cover = ImageQuery::new("harbor lights").with_usage(ImageUsage::Cover);
  let cover = waterfall.resolve(&cover).await.into_candidate();
  assert_eq!(cover.map(|i| i.width), Some(2200));
  Ok(())
}
