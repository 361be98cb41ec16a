//! Load orchestrator behaviour against a scripted backend
//!
//! Every request parks until the test answers it, so completion order is
//! under the test's control.

use async_trait::async_trait;
use mortality_stats::{
    Fetch, FilterParams, LoadError, LoadPhase, OverlapPolicy, ResourceClient, ResourceKind,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type Reply = Result<String, LoadError>;

#[derive(Default)]
struct ScriptedFetch {
    calls: Mutex<Vec<(String, Option<oneshot::Sender<Reply>>)>>,
}

impl ScriptedFetch {
    /// Wait until `n` requests have been issued
    async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn url(&self, call: usize) -> String {
        self.calls.lock().unwrap()[call].0.clone()
    }

    fn respond(&self, call: usize, reply: Reply) {
        let sender = self.calls.lock().unwrap()[call]
            .1
            .take()
            .expect("call already answered");
        if sender.send(reply).is_err() {
            panic!("load dropped before its reply");
        }
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn get(&self, url: &str) -> Result<String, LoadError> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push((url.to_string(), Some(tx)));
        rx.await.expect("scripted reply dropped")
    }
}

fn client(
    kind: ResourceKind,
    policy: OverlapPolicy,
    fetch: &Arc<ScriptedFetch>,
) -> Arc<ResourceClient> {
    let fetch: Arc<dyn Fetch> = fetch.clone();
    Arc::new(
        ResourceClient::new(kind, "http://stats.test", fetch)
            .unwrap()
            .with_policy(policy),
    )
}

fn spawn_load(client: &Arc<ResourceClient>, params: FilterParams) -> JoinHandle<()> {
    let client = Arc::clone(client);
    tokio::spawn(async move { client.load(&params).await })
}

fn body(year: i32) -> Reply {
    Ok(format!(r#"[{{"year": {}, "deaths": 100}}]"#, year))
}

fn result_year(client: &ResourceClient) -> Option<i64> {
    client
        .result()
        .get()
        .and_then(|records| records.first().and_then(|r| r["year"].as_i64()))
}

#[tokio::test]
async fn success_publishes_result_and_clears_loading() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::TotalDeaths, OverlapPolicy::LastSettled, &fetch);
    assert_eq!(client.state().phase(), LoadPhase::Idle);

    let load = spawn_load(&client, FilterParams::new().from_year(2000));
    fetch.wait_for_calls(1).await;

    assert!(client.loading().get());
    assert_eq!(client.state().phase(), LoadPhase::Loading);
    assert_eq!(fetch.url(0), "http://stats.test/total-deaths?from=2005");

    fetch.respond(0, body(2005));
    load.await.unwrap();

    let snapshot = client.state().snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.phase(), LoadPhase::Succeeded);
    assert_eq!(result_year(&client), Some(2005));
}

#[tokio::test]
async fn failure_keeps_stale_result() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::ExcessMortality, OverlapPolicy::LastSettled, &fetch);

    let load = spawn_load(&client, FilterParams::new());
    fetch.wait_for_calls(1).await;
    fetch.respond(0, body(2019));
    load.await.unwrap();

    let load = spawn_load(&client, FilterParams::new().to_year(2021));
    fetch.wait_for_calls(2).await;
    // Previous result stays visible while the new load is in flight
    assert!(client.loading().get());
    assert_eq!(result_year(&client), Some(2019));

    fetch.respond(1, Err(LoadError::Status { status: 503 }));
    load.await.unwrap();

    let snapshot = client.state().snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.phase(), LoadPhase::Failed);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Failed to load excess mortalities: Request failed with status code 503")
    );
    assert_eq!(result_year(&client), Some(2019));
}

#[tokio::test]
async fn new_load_clears_previous_error() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::PcrPlusDeaths, OverlapPolicy::LastSettled, &fetch);

    let load = spawn_load(&client, FilterParams::new());
    fetch.wait_for_calls(1).await;
    fetch.respond(0, Ok("<html>".to_string()));
    load.await.unwrap();
    assert!(client
        .error()
        .get()
        .unwrap()
        .starts_with("Failed to load pcr plus deaths: "));

    let load = spawn_load(&client, FilterParams::new());
    fetch.wait_for_calls(2).await;
    assert!(client.error().get().is_none());
    assert!(client.loading().get());

    fetch.respond(1, body(2022));
    load.await.unwrap();
    assert!(client.error().get().is_none());
    assert_eq!(result_year(&client), Some(2022));
}

#[tokio::test]
async fn last_settled_lets_the_late_response_win() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::TotalDeaths, OverlapPolicy::LastSettled, &fetch);

    let older = spawn_load(&client, FilterParams::new().from_year(2010));
    fetch.wait_for_calls(1).await;
    let newer = spawn_load(&client, FilterParams::new().from_year(2020));
    fetch.wait_for_calls(2).await;

    fetch.respond(1, body(2020));
    newer.await.unwrap();
    assert_eq!(result_year(&client), Some(2020));
    // The older request is still outstanding but nothing tracks it
    assert!(!client.loading().get());

    fetch.respond(0, body(2010));
    older.await.unwrap();
    assert_eq!(result_year(&client), Some(2010));
    assert!(!client.loading().get());
}

#[tokio::test]
async fn latest_issued_discards_superseded_responses() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::TotalDeaths, OverlapPolicy::LatestIssued, &fetch);

    let older = spawn_load(&client, FilterParams::new().from_year(2010));
    fetch.wait_for_calls(1).await;
    let newer = spawn_load(&client, FilterParams::new().from_year(2020));
    fetch.wait_for_calls(2).await;

    // Superseded load settles first: cells untouched, still loading
    fetch.respond(0, Err(LoadError::Status { status: 500 }));
    older.await.unwrap();
    assert!(client.loading().get());
    assert!(client.error().get().is_none());
    assert!(client.result().get().is_none());

    fetch.respond(1, body(2020));
    newer.await.unwrap();
    assert!(!client.loading().get());
    assert_eq!(result_year(&client), Some(2020));
}

#[tokio::test]
async fn latest_issued_ignores_late_superseded_response() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::Icd10Cases, OverlapPolicy::LatestIssued, &fetch);

    let older = spawn_load(&client, FilterParams::icd10("A00"));
    fetch.wait_for_calls(1).await;
    let newer = spawn_load(&client, FilterParams::icd10("B01"));
    fetch.wait_for_calls(2).await;

    fetch.respond(1, body(2020));
    newer.await.unwrap();
    fetch.respond(0, body(2016));
    older.await.unwrap();

    assert!(!client.loading().get());
    assert_eq!(result_year(&client), Some(2020));
}

#[tokio::test]
async fn abandoned_load_lowers_loading() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::TotalDeaths, OverlapPolicy::LastSettled, &fetch);

    // The backend never answers; the caller gives up
    let outcome =
        tokio::time::timeout(Duration::from_millis(20), client.load(&FilterParams::new())).await;
    assert!(outcome.is_err());
    fetch.wait_for_calls(1).await;

    assert!(!client.loading().get());
    assert!(client.error().get().is_none());
    assert_eq!(client.state().phase(), LoadPhase::Idle);
}

#[tokio::test]
async fn latest_issued_abandoned_newest_load_lowers_loading() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::ExcessMortality, OverlapPolicy::LatestIssued, &fetch);

    let older = spawn_load(&client, FilterParams::new().from_year(2010));
    fetch.wait_for_calls(1).await;

    let params = FilterParams::new().from_year(2020);
    let newest = client.load(&params);
    assert!(tokio::time::timeout(Duration::from_millis(20), newest)
        .await
        .is_err());
    assert!(!client.loading().get());

    // The older load is still superseded and leaves the cells alone
    fetch.respond(0, body(2010));
    older.await.unwrap();
    assert!(!client.loading().get());
    assert!(client.result().get().is_none());
}

#[tokio::test]
async fn identical_loads_yield_identical_results() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::TotalDeaths, OverlapPolicy::LastSettled, &fetch);
    let params = FilterParams::new().from_year(2015).age_groups(["0-4", "5-9"]);

    let load = spawn_load(&client, params.clone());
    fetch.wait_for_calls(1).await;
    fetch.respond(0, body(2015));
    load.await.unwrap();
    let first = client.result().get().unwrap();

    let load = spawn_load(&client, params);
    fetch.wait_for_calls(2).await;
    fetch.respond(1, body(2015));
    load.await.unwrap();
    let second = client.result().get().unwrap();

    assert_eq!(fetch.url(0), fetch.url(1));
    assert_eq!(first, second);
}

#[tokio::test]
async fn subscribers_observe_loading_transitions() {
    let fetch = Arc::new(ScriptedFetch::default());
    let client = client(ResourceKind::PcrPlusDeaths, OverlapPolicy::LastSettled, &fetch);
    let mut loading = client.loading().subscribe();
    let mut result = client.result().subscribe();

    let load = spawn_load(&client, FilterParams::new());
    loading.changed().await.unwrap();
    assert!(*loading.borrow_and_update());

    fetch.wait_for_calls(1).await;
    fetch.respond(0, body(2021));
    load.await.unwrap();

    loading.changed().await.unwrap();
    assert!(!*loading.borrow_and_update());
    assert!(result.has_changed().unwrap());
    assert_eq!(result.borrow_and_update().as_ref().map(|r| r.len()), Some(1));
}
