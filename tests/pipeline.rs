// tests/pipeline.rs
//
// End-to-end: discover + dispatch across two runs. The same posting must be
// stored once and notified once, no matter how many runs re-fetch it.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use jobscout::filter::FilterPolicy;
use jobscout::notify::DeliveryChannel;
use jobscout::source::SourceAdapter;
use jobscout::store::RecordStore;
use jobscout::{run_once, Posting, RawPosting, WindowPolicy};

struct StaticAdapter {
    name: &'static str,
    postings: Vec<RawPosting>,
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch_postings(&self) -> Result<Vec<RawPosting>> {
        Ok(self.postings.clone())
    }
    fn name(&self) -> &str {
        self.name
    }
}

#[derive(Default)]
struct CapturingChannel {
    batches: Mutex<Vec<Vec<(String, String)>>>,
}

#[async_trait]
impl DeliveryChannel for CapturingChannel {
    async fn deliver(&self, batch: &[Posting]) -> Result<()> {
        let keys = batch
            .iter()
            .map(|p| (p.source.clone(), p.external_id.clone()))
            .collect();
        self.batches.lock().unwrap().push(keys);
        Ok(())
    }
    fn name(&self) -> &'static str {
        "capturing"
    }
}

#[tokio::test]
async fn posting_is_stored_once_and_notified_once_across_runs() {
    let store = RecordStore::in_memory().await.unwrap();
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(StaticAdapter {
        name: "acme",
        postings: vec![RawPosting {
            external_id: "123".to_string(),
            title: "Backend Engineer".to_string(),
            location: Some("Remote".to_string()),
            description: None,
            posted_at: None,
            url: Some("https://careers.acme.test/123".to_string()),
        }],
    })];
    let policy = FilterPolicy::keywords_only(vec![]);
    let channel = CapturingChannel::default();

    // Run 1: discovered, stored, notified.
    let run1 = run_once(&store, &adapters, &policy, WindowPolicy::RunStart, &channel)
        .await
        .unwrap();
    assert_eq!(run1.per_source["acme"].added, 1);
    assert_eq!(run1.notified, 1);

    // Run 2: same fetch again. Already present, nothing to notify.
    let run2 = run_once(&store, &adapters, &policy, WindowPolicy::RunStart, &channel)
        .await
        .unwrap();
    assert_eq!(run2.per_source["acme"].added, 0);
    assert_eq!(run2.per_source["acme"].skipped, 1);
    assert_eq!(run2.notified, 0);

    let batches = channel.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec![("acme".to_string(), "123".to_string())]);
}
