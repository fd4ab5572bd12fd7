use activity_core::{
    ActivityId, ActivityRepository, ActivityType, EmailActivityRequest, EmailDirection, Latency,
    LatencyProfile, NewActivity, Operation, SeedSnapshot, SimulatedLatency,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Default)]
struct RecordingLatency {
    calls: Arc<Mutex<Vec<Operation>>>,
}

impl RecordingLatency {
    fn calls(&self) -> Vec<Operation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Latency for RecordingLatency {
    async fn pause(&self, op: Operation) {
        self.calls.lock().unwrap().push(op);
    }
}

// The paused clock may land on the next millisecond tick.
fn assert_waited(started: Instant, millis: u64) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(millis) && elapsed <= Duration::from_millis(millis + 5),
        "expected ~{millis}ms, waited {elapsed:?}"
    );
}

fn seed() -> SeedSnapshot {
    SeedSnapshot::from_json_str(r#"[{"Id": 1, "type": "call", "date": "2024-01-01"}]"#).unwrap()
}

#[tokio::test]
async fn every_operation_pauses_once_with_its_own_key() {
    let latency = RecordingLatency::default();
    let repo = ActivityRepository::new(&seed()).with_latency(latency.clone());
    let first = ActivityId::new(1).unwrap();

    repo.list_all().await;
    repo.get_by_id(first).await.unwrap();
    repo.list_types().await;
    repo.list_recent(None).await;
    repo.update(first, Default::default()).await.unwrap();
    repo.delete(first).await.unwrap();

    assert_eq!(
        latency.calls(),
        vec![
            Operation::ListAll,
            Operation::GetById,
            Operation::ListTypes,
            Operation::ListRecent,
            Operation::Update,
            Operation::Delete,
        ]
    );
}

#[tokio::test]
async fn email_creation_pauses_for_email_then_create() {
    let latency = RecordingLatency::default();
    let repo = ActivityRepository::new(&seed()).with_latency(latency.clone());

    repo.create_email_activity(EmailActivityRequest {
        subject: Some("Hi".to_string()),
        body: Some("hello".to_string()),
        contact_id: None,
        deal_id: None,
        direction: EmailDirection::Received,
        sender: Some("a".to_string()),
        recipient: Some("b".to_string()),
        date: None,
    })
    .await;

    assert_eq!(
        latency.calls(),
        vec![Operation::CreateEmail, Operation::Create]
    );
}

#[tokio::test]
async fn failed_lookup_still_pauses_before_failing() {
    let latency = RecordingLatency::default();
    let repo = ActivityRepository::new(&seed()).with_latency(latency.clone());

    assert!(repo.delete(ActivityId::new(42).unwrap()).await.is_err());
    assert_eq!(latency.calls(), vec![Operation::Delete]);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn simulated_latency_waits_profile_delay() {
    let repo = ActivityRepository::new(&seed())
        .with_latency(SimulatedLatency::new(LatencyProfile::default()));

    let started = Instant::now();
    repo.list_types().await;
    assert_waited(started, 100);

    let started = Instant::now();
    repo.create(NewActivity::of_type(ActivityType::Note)).await;
    assert_waited(started, 400);
}

#[tokio::test(start_paused = true)]
async fn zero_profile_does_not_advance_time() {
    let repo = ActivityRepository::new(&seed())
        .with_latency(SimulatedLatency::new(LatencyProfile::zero()));

    let started = Instant::now();
    repo.list_all().await;
    repo.list_recent(Some(5)).await;
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn mutation_is_invisible_until_its_pause_completes() {
    let repo = Arc::new(
        ActivityRepository::new(&seed()).with_latency(SimulatedLatency::new(
            LatencyProfile::zero()
                .with_delay(Operation::Delete, Duration::from_millis(250))
                .with_delay(Operation::GetById, Duration::from_millis(10)),
        )),
    );
    let first = ActivityId::new(1).unwrap();

    let deleter = {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move { repo.delete(first).await })
    };

    // Resolves well before the delete's pause ends.
    assert!(repo.get_by_id(first).await.is_ok());

    deleter.await.unwrap().unwrap();
    assert!(repo.get_by_id(first).await.is_err());
}
