use chrono::Duration;
use pecs_core::model::{ActionDraft, ActionKind, PhaseId, PracticeSettings};
use pecs_core::time::fixed_clock;
use services::AppServices;

const DB_URL: &str = "sqlite:file:memdb_services_persist?mode=memory&cache=shared";

#[tokio::test]
async fn progress_and_history_survive_a_restart() {
    let first = AppServices::new_sqlite(DB_URL, fixed_clock(), PracticeSettings::default())
        .await
        .expect("open first");
    let recorder = first.recorder();
    let mut session = recorder.begin(PhaseId::FIRST);
    for correct in [true, true, true] {
        let draft = ActionDraft::new(ActionKind::ImageExchange, correct, Duration::seconds(2))
            .with_image(pecs_core::model::ImageId::new("food_apple"));
        recorder.record(&mut session, draft).unwrap();
    }
    let (closed, _) = recorder.complete(session, true).await.unwrap();

    let second = AppServices::new_sqlite(DB_URL, fixed_clock(), PracticeSettings::default())
        .await
        .expect("open second");
    let progress = second.progress().load().await;
    assert_eq!(progress.current_phase(), PhaseId::new(2).unwrap());
    assert_eq!(progress.success_rate(), 100.0);

    let history = second.recorder().history().await;
    assert_eq!(history, vec![closed]);
    let action = &history[0].actions()[0];
    assert_eq!(action.response_time(), Duration::seconds(2));
    assert_eq!(action.image_id().map(|id| id.as_str()), Some("food_apple"));

    drop(first);
}
