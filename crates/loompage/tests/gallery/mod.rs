use super::*;

fn hits(provider: StubProvider, query: &str, prefix: &str, widths: &[u32]) -> StubProvider {
  widths.iter().enumerate().fold(provider, |provider, (i, width)| {
    provider.with_hit(query, &format!("{prefix}/{i}.jpg"), *width, width * 2 / 3)
  })
}

#[tokio::test]
async fn gallery_merges_providers_without_narrow_or_duplicate_images() -> TestResult<()> {
  let log = CallLog::default();
  let unsplash = StubProvider::new(ProviderKind::Unsplash, &log);
  let unsplash = hits(unsplash, "coral reef", "https://un", &[3000, 1100, 2400]);
  let pexels = StubProvider::new(ProviderKind::Pexels, &log);
  let pexels = hits(pexels, "coral reef", "https://pe", &[1250, 1900])
    .with_hit("coral reef", "https://un/0.jpg?cs=tinysrgb", 3000, 2000);

  let gallery = Gallery::new(vec![unsplash.shared(), pexels.shared()]);
  let result = gallery.search(&ImageQuery::new("coral reef"), 50).await;

  assert!(result.images.iter().all(|image| image.width >= 1200));
  let mut urls: Vec<_> =
    result.images.iter().map(|image| loompage::normalize_url(&image.url)).collect();
  let total = urls.len();
  urls.sort();
  urls.dedup();
  assert_eq!(urls.len(), total);
  assert_eq!(result.print_ready_count, result.images.iter().filter(|i| i.width >= 1800).count());
  assert_eq!(result.sources.values().sum::<usize>(), result.images.len());
  Ok(())
}

#[tokio::test]
async fn gallery_ignores_the_exclusion_set() -> TestResult<()> {
  let log = CallLog::default();
  let pexels =
    StubProvider::new(ProviderKind::Pexels, &log).with_hit("fjord", "https://pe/f.jpg", 2000, 1300);
  let gallery = Gallery::new(vec![pexels.shared()]);
  let query = ImageQuery::new("fjord").with_excluded(ExclusionSet::from_urls(["https://pe/f.jpg"]));
  assert_eq!(gallery.search(&query, 5).await.images.len(), 1);
  Ok(())
}

#[tokio::test]
async fn noise_only_gallery_is_empty() -> TestResult<()> {
  let log = CallLog::default();
  let gallery = Gallery::new(vec![StubProvider::new(ProviderKind::Pexels, &log).shared()]);
  assert!(gallery.search(&ImageQuery::new("no people"), 10).await.is_empty());
  assert!(calls(&log).is_empty());
  Ok(())
}
