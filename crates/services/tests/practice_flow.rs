use pecs_core::model::{Difficulty, PhaseId, PhraseElement, PracticeSettings};
use pecs_core::time::fixed_clock;
use services::exercise::Prompt;
use services::{
    AppServices, Answer, PracticeError, PracticeOutcome, PracticeService, PracticeSession,
    PracticeTick,
};

fn app(settings: PracticeSettings) -> AppServices {
    AppServices::in_memory(fixed_clock(), settings)
}

/// The right answer for whatever round is on screen.
fn correct_answer(practice: &PracticeSession) -> Answer {
    let round = practice.engine().round();
    match &round.prompt {
        Prompt::Exchange { target } | Prompt::Select { target } => Answer::Image(target.clone()),
        Prompt::Request { target, .. } => Answer::Phrase(vec![
            PhraseElement::text("I want"),
            PhraseElement::Image(target.clone()),
        ]),
        Prompt::Question { kind, target, .. } => {
            let starter = practice
                .engine()
                .catalog()
                .starter(kind.starter_id())
                .unwrap()
                .text
                .clone();
            Answer::Phrase(vec![
                PhraseElement::Text(starter),
                PhraseElement::Image(target.clone()),
            ])
        }
        Prompt::Comment { function, .. } => Answer::Phrase(vec![
            PhraseElement::text(function.starter),
            PhraseElement::Image(round.choices[0].clone()),
        ]),
    }
}

/// Answers correctly until the phase is mastered, firing every timer at once.
async fn master(service: &PracticeService, phase: PhaseId) -> PracticeOutcome {
    let mut practice = service.start(phase).await.unwrap();
    loop {
        let answer = correct_answer(&practice);
        let feedback = service.submit(&mut practice, &answer).unwrap();
        assert!(feedback.correct, "phase {phase} rejected {answer:?}");
        let mut ticket = feedback.ticket;
        loop {
            match service.tick(&mut practice, ticket).await.unwrap() {
                PracticeTick::Waiting(next) => ticket = next,
                PracticeTick::NextRound => break,
                PracticeTick::Completed(outcome) => return outcome,
                PracticeTick::Stale => panic!("fresh ticket went stale"),
            }
        }
    }
}

#[tokio::test]
async fn learner_walks_through_all_six_phases() {
    let services = app(PracticeSettings::default().with_difficulty(Difficulty::Hard));
    let practice = services.practice();

    for n in 1..=6 {
        let phase = PhaseId::new(n).unwrap();
        let outcome = master(&practice, phase).await;
        assert!(outcome.session.success());
        assert_eq!(outcome.session.actions().len(), 3);
        assert!(outcome.progress.is_completed(phase));
    }

    let progress = services.progress().load().await;
    assert_eq!(progress.current_phase(), PhaseId::LAST);
    assert_eq!(progress.phases_completed().len(), 6);
    assert_eq!(progress.total_sessions(), 6);
    assert_eq!(progress.success_rate(), 100.0);

    let history = services.recorder().history().await;
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].phase(), PhaseId::LAST);
}

#[tokio::test]
async fn mistakes_lower_the_session_rate() {
    let services = app(PracticeSettings::default());
    let practice = services.practice();
    let mut session = practice.start(PhaseId::FIRST).await.unwrap();

    let round = session.engine().round().clone();
    let target = round.prompt.target().unwrap().clone();
    let wrong = round.choices.iter().find(|id| **id != target).unwrap().clone();

    let feedback = practice.submit(&mut session, &Answer::Image(wrong)).unwrap();
    assert!(!feedback.correct);
    let mut ticket = feedback.ticket;
    while let PracticeTick::Waiting(next) = practice.tick(&mut session, ticket).await.unwrap() {
        ticket = next;
    }
    let feedback = practice
        .submit(&mut session, &Answer::Image(target))
        .unwrap();
    assert!(feedback.correct);

    let outcome = practice.finish(&mut session).await.unwrap();
    assert!(!outcome.mastered);
    assert_eq!(outcome.progress.success_rate(), 50.0);
    assert_eq!(outcome.progress.current_phase(), PhaseId::FIRST);
}

#[tokio::test]
async fn free_mode_accepts_other_starters() {
    let services = app(PracticeSettings::default().with_free_mode(true));
    for n in 1..=5 {
        master(&services.practice(), PhaseId::new(n).unwrap()).await;
    }

    let practice = services.practice();
    let mut session = practice.start(PhaseId::LAST).await.unwrap();
    let picture = session.engine().round().choices[0].clone();
    let answer = Answer::Phrase(vec![
        PhraseElement::text("I want"),
        PhraseElement::Image(picture),
    ]);
    assert!(practice.submit(&mut session, &answer).unwrap().correct);
}

#[tokio::test]
async fn locked_phases_are_refused() {
    let services = app(PracticeSettings::default());
    let err = services
        .practice()
        .start(PhaseId::new(4).unwrap())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PracticeError::PhaseLocked(_)));
}
