//! Integration test: paid quiz loop against SQLite.
//!
//! Walks one asker through a session against one target:
//! 1. Pay the entry cost to open a session
//! 2. Guess right and wrong, checking affinity and currency deltas
//! 3. Climb past T1 and watch every approved photo unlock
//! 4. Close the session and audit the asker's ledger

use veil_integration_tests::Harness;
use veil_quiz::QuizError;
use veil_store::{LedgerRepo, SkillRepo};
use veil_types::{Choice, PhotoStatus, Reason, Tier};

const ASKER: i64 = 1;
const TARGET: i64 = 2;
const QUESTION: i64 = 7;

fn harness(balance: u64) -> Harness {
    let mut h = Harness::new().expect("open harness");
    if balance > 0 {
        h.grant(ASKER, balance).expect("grant");
    }
    h.declare(TARGET, QUESTION, Choice::Left).expect("declare");
    h
}

#[test]
fn start_charges_entry_cost() {
    let mut h = harness(100);

    let start = h.start(ASKER, TARGET).expect("start");
    assert_eq!(start.remaining_balance, 99);
    assert_eq!(start.session.entry_cost, 1);
    assert_eq!(h.balance(ASKER).expect("balance"), 99);

    let entries = h.reader().entries(ASKER).expect("entries");
    let charge = entries.last().expect("entry");
    assert_eq!(charge.reason, Reason::QuizEnter);
    assert_eq!(charge.delta, -1);
    assert_eq!(
        charge.ref_id.as_deref(),
        Some(format!("session:{}", start.session.id).as_str())
    );
}

#[test]
fn correct_guess_adds_alpha() {
    let mut h = harness(100);
    let session = h.start(ASKER, TARGET).expect("start").session;

    let outcome = h.answer(session.id, QUESTION, Choice::Left).expect("answer");
    assert!(outcome.correct);
    assert_eq!(outcome.delta_affinity, 3);
    assert_eq!(outcome.delta_currency, 0);
    assert_eq!(outcome.score, 3);
    assert_eq!(h.balance(ASKER).expect("balance"), 99);
}

#[test]
fn wrong_guess_costs_beta_and_penalty() {
    let mut h = harness(100);
    let session = h.start(ASKER, TARGET).expect("start").session;
    h.answer(session.id, QUESTION, Choice::Left).expect("answer");

    let outcome = h.answer(session.id, QUESTION, Choice::Right).expect("answer");
    assert!(!outcome.correct);
    assert_eq!(outcome.target_choice, Choice::Left);
    assert_eq!(outcome.delta_affinity, -1);
    assert_eq!(outcome.delta_currency, -1);
    assert_eq!(outcome.score, 2);
    assert_eq!(h.balance(ASKER).expect("balance"), 98);

    let penalty = h.reader().entries(ASKER).expect("entries");
    assert_eq!(penalty.last().map(|e| e.reason), Some(Reason::QuizWrong));
}

#[test]
fn wrong_guess_floors_score_and_balance() {
    // Exactly enough for the entry cost.
    let mut h = harness(1);
    let session = h.start(ASKER, TARGET).expect("start").session;
    let entries_before = h.reader().entries(ASKER).expect("entries").len();

    let outcome = h.answer(session.id, QUESTION, Choice::Right).expect("answer");
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.delta_currency, 0);
    assert_eq!(h.balance(ASKER).expect("balance"), 0);
    assert_eq!(
        h.reader().entries(ASKER).expect("entries").len(),
        entries_before
    );
}

#[test]
fn crossing_t1_unlocks_every_approved_photo() {
    let mut h = harness(100);
    h.add_photo(TARGET, 10, PhotoStatus::Approved).expect("photo");
    h.add_photo(TARGET, 11, PhotoStatus::Approved).expect("photo");
    h.add_photo(TARGET, 12, PhotoStatus::Pending).expect("photo");
    let session = h.start(ASKER, TARGET).expect("start").session;

    for _ in 0..6 {
        let outcome = h.answer(session.id, QUESTION, Choice::Left).expect("answer");
        assert!(outcome.crossed_tiers.is_empty());
    }
    assert_eq!(h.score(ASKER, TARGET).expect("score"), 18);
    assert_eq!(h.tier(ASKER, 10).expect("tier"), Tier::Locked);

    let outcome = h.answer(session.id, QUESTION, Choice::Left).expect("answer");
    assert_eq!(outcome.score, 21);
    assert!(outcome.crossed_tiers.contains(&Tier::T1));
    assert_eq!(outcome.upgrades.len(), 2);

    for photo_id in h.approved_photo_ids(TARGET).expect("photos") {
        assert_eq!(h.tier(ASKER, photo_id).expect("tier"), Tier::T1);
    }
    assert_eq!(h.tier(ASKER, 12).expect("tier"), Tier::Locked);

    let gallery = h
        .disclosure
        .gate()
        .gallery(&h.reader(), ASKER, TARGET)
        .expect("gallery");
    assert_eq!(gallery.len(), 2);
    assert!(gallery.iter().all(|p| p.variants.len() == 2));
}

#[test]
fn full_session_audits_clean() {
    let mut h = harness(50);
    let session = h.start(ASKER, TARGET).expect("start").session;

    for guess in [Choice::Left, Choice::Right, Choice::Left, Choice::Right] {
        h.answer(session.id, QUESTION, guess).expect("answer");
    }
    h.advance(30);
    let now = h.now();
    let ended = h.quiz.end(&mut h.db, session.id, now).expect("end");
    assert!(ended.is_ended());

    // 50 - 1 entry - 2 wrong penalties.
    assert_eq!(h.balance(ASKER).expect("balance"), 47);
    assert_eq!(h.score(ASKER, TARGET).expect("score"), 4);

    let report = h.ledger.audit(&h.reader(), ASKER).expect("audit");
    assert!(report.consistent);
    assert_eq!(report.entry_count, 4);

    let answers = h.disclosure.answers(&h.reader(), session.id).expect("answers");
    assert_eq!(answers.len(), 4);
    assert_eq!(
        answers.iter().map(|a| a.delta_affinity).sum::<i64>(),
        3 - 1 + 3 - 1
    );

    let skill = h.reader().skill(ASKER).expect("skill").expect("stat");
    assert_eq!(skill.correct_count, 2);
    assert_eq!(skill.total_attempts, 4);
}

#[test]
fn answers_after_end_are_rejected() {
    let mut h = harness(10);
    let session = h.start(ASKER, TARGET).expect("start").session;
    let now = h.now();
    h.quiz.end(&mut h.db, session.id, now).expect("end");

    let err = h
        .answer(session.id, QUESTION, Choice::Left)
        .expect_err("ended session");
    assert_eq!(veil_types::ErrorCode::code(&err), veil_types::codes::VALIDATION_ERROR);
    assert_eq!(h.score(ASKER, TARGET).expect("score"), 0);
}

#[test]
fn start_limit_is_per_pair_and_rolls_over() {
    let mut h = harness(100);

    for _ in 0..10 {
        h.start(ASKER, TARGET).expect("start");
    }
    assert!(matches!(
        h.start(ASKER, TARGET),
        Err(QuizError::RateLimited { .. })
    ));
    // A different target is counted separately.
    h.start(ASKER, 3).expect("other target");

    h.advance(3600);
    h.start(ASKER, TARGET).expect("window rolled over");
    assert_eq!(h.balance(ASKER).expect("balance"), 88);
}
