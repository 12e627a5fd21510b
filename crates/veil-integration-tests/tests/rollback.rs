//! Integration test: failed writes leave no trace.
//!
//! Every rejected call must roll back the whole unit of work: balance,
//! ledger, sessions, answers, affinity and visibility rows all stay exactly
//! as they were.

use rusqlite::Connection;
use veil_disclosure::DisclosureError;
use veil_integration_tests::Harness;
use veil_ledger::{LedgerError, MAX_ACCOUNT_VALUE};
use veil_quiz::QuizError;
use veil_types::{Choice, PhotoStatus, Tier};

const ASKER: i64 = 1;
const TARGET: i64 = 2;

/// Row counts of every mutable table plus the asker's balance and score.
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    balance: u64,
    score: u64,
    ledger_entries: i64,
    sessions: i64,
    answers: i64,
    visibility: i64,
    skills: i64,
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

fn snapshot(h: &Harness) -> Snapshot {
    let conn = h.db.conn();
    Snapshot {
        balance: h.balance(ASKER).expect("balance"),
        score: h.score(ASKER, TARGET).expect("score"),
        ledger_entries: count(conn, "ledger_entries"),
        sessions: count(conn, "quiz_sessions"),
        answers: count(conn, "answer_records"),
        visibility: count(conn, "visibility_states"),
        skills: count(conn, "skill_stats"),
    }
}

#[test]
fn missing_target_choice_rolls_back_everything() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, 100).expect("grant");
    h.declare(TARGET, 1, Choice::Left).expect("declare");
    h.add_photo(TARGET, 10, PhotoStatus::Approved).expect("photo");
    let session = h.start(ASKER, TARGET).expect("start").session;
    for _ in 0..7 {
        h.answer(session.id, 1, Choice::Left).expect("answer");
    }
    let before = snapshot(&h);
    assert_eq!(h.tier(ASKER, 10).expect("tier"), Tier::T1);

    // Question 2 was never declared; a wrong guess would also have charged.
    let err = h
        .answer(session.id, 2, Choice::Right)
        .expect_err("no target choice");
    assert!(matches!(
        err,
        DisclosureError::TargetHasNoAnswer { target_id: TARGET, question_id: 2 }
    ));

    assert_eq!(snapshot(&h), before);
    assert_eq!(h.tier(ASKER, 10).expect("tier"), Tier::T1);
}

#[test]
fn unaffordable_start_creates_no_session() {
    let mut h = Harness::new().expect("harness");
    let before = snapshot(&h);

    let err = h.start(ASKER, TARGET).expect_err("no funds");
    assert!(matches!(
        err,
        QuizError::Ledger(LedgerError::InsufficientFunds {
            available: 0,
            required: 1
        })
    ));
    assert_eq!(snapshot(&h), before);
}

#[test]
fn unknown_session_rolls_back() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, 5).expect("grant");
    let before = snapshot(&h);

    let err = h.answer(999, 1, Choice::Left).expect_err("unknown session");
    assert!(matches!(err, DisclosureError::SessionNotFound(999)));
    assert_eq!(snapshot(&h), before);
}

#[test]
fn ledger_history_is_append_only() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, 5).expect("grant");

    let conn = h.db.conn();
    assert!(conn
        .execute("UPDATE ledger_entries SET delta = 500", [])
        .is_err());
    assert!(conn.execute("DELETE FROM ledger_entries", []).is_err());
    assert_eq!(h.balance(ASKER).expect("balance"), 5);
}

#[test]
fn answer_history_is_append_only() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, 5).expect("grant");
    h.declare(TARGET, 1, Choice::Left).expect("declare");
    let session = h.start(ASKER, TARGET).expect("start").session;
    h.answer(session.id, 1, Choice::Right).expect("answer");

    let conn = h.db.conn();
    assert!(conn
        .execute("UPDATE answer_records SET correct = 1", [])
        .is_err());
    assert!(conn.execute("DELETE FROM answer_records", []).is_err());
    assert_eq!(count(conn, "answer_records"), 1);
}

#[test]
fn credit_past_account_cap_is_a_validation_error() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, MAX_ACCOUNT_VALUE).expect("grant up to cap");
    let before = snapshot(&h);

    let err = h.grant(ASKER, 1).expect_err("past cap");
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(snapshot(&h), before);
    assert_eq!(h.balance(ASKER).expect("balance"), MAX_ACCOUNT_VALUE);
}

#[test]
fn stored_photo_tier_never_regresses() {
    let mut h = Harness::new().expect("harness");
    h.grant(ASKER, 100).expect("grant");
    h.declare(TARGET, 1, Choice::Left).expect("declare");
    h.add_photo(TARGET, 10, PhotoStatus::Approved).expect("photo");
    let session = h.start(ASKER, TARGET).expect("start").session;
    for _ in 0..7 {
        h.answer(session.id, 1, Choice::Left).expect("answer");
    }

    // Wrong answers take the score back under T1.
    for _ in 0..5 {
        h.answer(session.id, 1, Choice::Right).expect("answer");
    }
    assert_eq!(h.score(ASKER, TARGET).expect("score"), 16);
    assert_eq!(h.tier(ASKER, 10).expect("tier"), Tier::T1);

    // The schema refuses a direct downgrade too.
    let downgrade = h.db.conn().execute(
        "UPDATE visibility_states SET tier = 'LOCKED' WHERE viewer_id = ?1 AND photo_id = 10",
        [ASKER],
    );
    assert!(downgrade.is_err());
    assert_eq!(h.tier(ASKER, 10).expect("tier"), Tier::T1);
}
