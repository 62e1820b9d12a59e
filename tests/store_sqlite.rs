// tests/store_sqlite.rs
use chrono::{TimeZone, Utc};
use news_sentiment_ingest::ingest::types::{Category, DedupKey, FeedSource, IngestedArticle};
use news_sentiment_ingest::sentiment::SentimentLabel;
use news_sentiment_ingest::store::{ArticleFilter, ArticleStore, SourceDirectory, SqliteStore};

fn article(title: &str, day: u32, label: SentimentLabel) -> IngestedArticle {
    let published_at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
    let link = format!("https://x/{title}");
    IngestedArticle {
        id: DedupKey::new(title, &link, published_at).id(),
        title: title.to_string(),
        content: "<p>body</p>".into(),
        excerpt: "body...".into(),
        author: "Wire".into(),
        published_at,
        source_url: link,
        image_url: "/ph.png".into(),
        category: Category::ExclusiveSources,
        tags: vec!["rss".into(), "wire".into()],
        sentiment_label: label,
        sentiment_confidence: 0.75,
        source_name: "Wire".into(),
    }
}

#[tokio::test]
async fn insert_is_unique_on_dedup_key_and_never_overwrites() {
    let store = SqliteStore::in_memory().await.unwrap();
    let a = article("a", 1, SentimentLabel::Positive);
    assert!(!store.exists(&a.dedup_key()).await.unwrap());
    assert!(store.insert(&a).await.unwrap());
    assert!(store.exists(&a.dedup_key()).await.unwrap());

    let mut rescored = a.clone();
    rescored.sentiment_label = SentimentLabel::Negative;
    rescored.sentiment_confidence = 0.9;
    assert!(!store.insert(&rescored).await.unwrap());

    let all = store.list_articles(&ArticleFilter::default()).await.unwrap();
    assert_eq!(all, vec![a]);
}

#[tokio::test]
async fn same_title_and_link_at_another_time_is_a_new_article() {
    let store = SqliteStore::in_memory().await.unwrap();
    let a = article("a", 1, SentimentLabel::Neutral);
    let mut later = a.clone();
    later.published_at = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
    later.id = later.dedup_key().id();
    assert!(store.insert(&a).await.unwrap());
    assert!(store.insert(&later).await.unwrap());
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn listing_orders_newest_first_and_filters() {
    let store = SqliteStore::in_memory().await.unwrap();
    for (t, d, l) in [
        ("one", 1, SentimentLabel::Negative),
        ("three", 3, SentimentLabel::Positive),
        ("two", 2, SentimentLabel::Positive),
    ] {
        store.insert(&article(t, d, l)).await.unwrap();
    }
    let titles = |v: Vec<IngestedArticle>| v.into_iter().map(|a| a.title).collect::<Vec<_>>();

    let all = store.list_articles(&ArticleFilter::default()).await.unwrap();
    assert_eq!(titles(all), ["three", "two", "one"]);

    let pos = store
        .list_articles(&ArticleFilter {
            sentiment: Some(SentimentLabel::Positive),
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(titles(pos), ["three"]);

    let none = store
        .list_articles(&ArticleFilter {
            category: Some(Category::News),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn source_directory_management() {
    let store = SqliteStore::in_memory().await.unwrap();
    let defaults = vec![
        FeedSource::new("Zeta", "https://z.test/rss", Category::News),
        FeedSource::new("Alpha", "https://a.test/rss", Category::Investigations),
    ];
    assert_eq!(store.seed_sources_if_empty(&defaults).await.unwrap(), 2);
    assert_eq!(store.seed_sources_if_empty(&defaults).await.unwrap(), 0);

    let names: Vec<_> = store
        .list_sources()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, ["Alpha", "Zeta"]);

    let extra = FeedSource::new("Mid", "https://m.test/rss", Category::ExclusiveSources);
    assert!(store.add_source(&extra).await.unwrap());
    assert!(!store.add_source(&extra).await.unwrap());
    assert!(store.delete_source("https://z.test/rss").await.unwrap());
    assert!(!store.delete_source("https://z.test/rss").await.unwrap());

    let listed = store.list_sources().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1], extra);

    store.replace_sources(&[extra.clone()]).await.unwrap();
    assert_eq!(store.list_sources().await.unwrap(), vec![extra]);
}

#[tokio::test]
async fn file_backed_store_persists_across_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite:{}?mode=rwc",
        dir.path().join("nested/articles.db").display()
    );
    {
        let store = SqliteStore::connect(&url).await.unwrap();
        store.insert(&article("kept", 5, SentimentLabel::Positive)).await.unwrap();
    }
    let store = SqliteStore::connect(&url).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    let a = &store.list_articles(&ArticleFilter::default()).await.unwrap()[0];
    assert_eq!(a.category, Category::ExclusiveSources);
    assert_eq!(a.tags, vec!["rss", "wire"]);
}
