//! Lifecycle state machine tests: creation, binding, suspension, extension,
//! expiry, and the concurrent-activation race.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;

#[test]
fn test_create_derives_plan_from_duration() {
    let state = create_test_app_state();

    for (days, plan) in [
        (3, Plan::Trial),
        (7, Plan::Trial),
        (8, Plan::Monthly),
        (30, Plan::Monthly),
        (90, Plan::Quarterly),
        (365, Plan::Yearly),
        (3650, Plan::Lifetime),
    ] {
        let license = lifecycle::create(&state, days, None, None).expect("Create failed");
        assert_eq!(license.plan, plan, "{} days should map to {:?}", days, plan);
        assert_eq!(license.expires_at, license.created_at + days * SECONDS_PER_DAY);
        assert!(license.active);
        assert!(!license.used);
    }
}

#[test]
fn test_create_persists_record() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, Some("Customer"), Some("ops")).unwrap();

    let conn = state.db.get().unwrap();
    let stored = queries::get_license(&conn, &license.key)
        .unwrap()
        .expect("Created license should be stored");
    assert_eq!(stored.owner_label.as_deref(), Some("Customer"));
    assert_eq!(stored.created_by.as_deref(), Some("ops"));
}

#[test]
fn test_create_batch_produces_unique_keys() {
    let state = create_test_app_state();

    let licenses = lifecycle::create_batch(&state, 100, 30, Some("Reseller"), None)
        .expect("Batch creation failed");
    assert_eq!(licenses.len(), 100);

    let keys: std::collections::HashSet<&str> =
        licenses.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(keys.len(), 100, "batch must contain no duplicate keys");

    let conn = state.db.get().unwrap();
    let counts = queries::count_licenses(&conn, queries::now()).unwrap();
    assert_eq!(counts.total, 100, "every batch key must be persisted");
}

#[test]
fn test_activate_verify_suspend_resume_flow() {
    let state = create_test_app_state();

    let license = lifecycle::create(&state, 30, Some("Customer"), None).unwrap();
    assert_eq!(license.plan, Plan::Monthly);

    let activated = lifecycle::activate(&state, &license.key, "device-a", None).unwrap();
    assert_eq!(activated.device_id.as_deref(), Some("device-a"));
    assert!(activated.used);
    assert!(activated.activated_at.is_some());

    lifecycle::verify(&state, &license.key, "device-a", None).expect("Verify should succeed");

    let err = lifecycle::verify(&state, &license.key, "device-b", None).unwrap_err();
    assert!(matches!(err, AppError::DeviceMismatch), "got {:?}", err);

    lifecycle::set_active(&state, &license.key, false).unwrap();
    let err = lifecycle::verify(&state, &license.key, "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::Suspended), "got {:?}", err);

    lifecycle::set_active(&state, &license.key, true).unwrap();
    lifecycle::verify(&state, &license.key, "device-a", None)
        .expect("Verify should succeed again after resume");
}

#[test]
fn test_activate_unknown_key() {
    let state = create_test_app_state();
    let err = lifecycle::activate(&state, "GNP-ZZZZ-ZZZZ-ZZZZ", "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[test]
fn test_activate_is_idempotent_for_bound_device() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    let first = lifecycle::activate(&state, &license.key, "device-a", None).unwrap();
    let second = lifecycle::activate(&state, &license.key, "device-a", None).unwrap();

    assert_eq!(second.device_id.as_deref(), Some("device-a"));
    assert_eq!(
        second.activated_at, first.activated_at,
        "re-activation must keep the original activation timestamp"
    );
}

#[test]
fn test_activate_suspended_key_fails() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();
    lifecycle::set_active(&state, &license.key, false).unwrap();

    let err = lifecycle::activate(&state, &license.key, "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::Suspended), "got {:?}", err);
}

#[test]
fn test_activate_expired_key_fails() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        insert_test_license(&conn, &test_license("GNP-EXPD-AAAA-BBBB", past_timestamp(1)));
    }

    let err = lifecycle::activate(&state, "GNP-EXPD-AAAA-BBBB", "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::Expired), "got {:?}", err);
}

#[test]
fn test_verify_never_activates() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    // Verify against an unbound key fails instead of binding it
    let err = lifecycle::verify(&state, &license.key, "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::DeviceMismatch), "got {:?}", err);

    let conn = state.db.get().unwrap();
    let stored = queries::get_license(&conn, &license.key).unwrap().unwrap();
    assert!(!stored.used, "verify must not bind a device");
    assert!(stored.device_id.is_none());
}

#[test]
fn test_verify_is_pure() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, Some("Customer"), None).unwrap();
    lifecycle::activate(&state, &license.key, "device-a", None).unwrap();

    let before = {
        let conn = state.db.get().unwrap();
        queries::get_license(&conn, &license.key).unwrap().unwrap()
    };

    lifecycle::verify(&state, &license.key, "device-a", None).unwrap();
    lifecycle::verify(&state, &license.key, "device-b", None).unwrap_err();
    lifecycle::verify(&state, &license.key, "device-a", None).unwrap();

    let after = {
        let conn = state.db.get().unwrap();
        queries::get_license(&conn, &license.key).unwrap().unwrap()
    };

    assert_eq!(after.active, before.active);
    assert_eq!(after.used, before.used);
    assert_eq!(after.device_id, before.device_id);
    assert_eq!(after.activated_at, before.activated_at);
    assert_eq!(after.expires_at, before.expires_at);
}

#[test]
fn test_deactivate_then_rebind_elsewhere() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    lifecycle::activate(&state, &license.key, "device-a", None).unwrap();
    lifecycle::deactivate(&state, &license.key, "device-a", None).unwrap();

    {
        let conn = state.db.get().unwrap();
        let stored = queries::get_license(&conn, &license.key).unwrap().unwrap();
        assert!(!stored.used, "deactivation must clear the used flag");
        assert!(stored.device_id.is_none());
    }

    let rebound = lifecycle::activate(&state, &license.key, "device-b", None)
        .expect("Rebinding after deactivation should succeed");
    assert_eq!(rebound.device_id.as_deref(), Some("device-b"));
}

#[test]
fn test_deactivate_from_wrong_device_is_a_noop() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();
    lifecycle::activate(&state, &license.key, "device-a", None).unwrap();

    // No error, no change
    lifecycle::deactivate(&state, &license.key, "device-b", None).unwrap();

    let conn = state.db.get().unwrap();
    let stored = queries::get_license(&conn, &license.key).unwrap().unwrap();
    assert!(stored.used);
    assert_eq!(stored.device_id.as_deref(), Some("device-a"));
}

#[test]
fn test_extend_is_monotonic_for_current_key() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    let extended = lifecycle::extend(&state, &license.key, 10).unwrap();
    assert_eq!(
        extended.expires_at,
        license.expires_at + 10 * SECONDS_PER_DAY,
        "a non-expired key extends from its current expiry"
    );
}

#[test]
fn test_extend_expired_key_counts_from_now() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let mut license = test_license("GNP-EXPD-CCCC-DDDD", past_timestamp(20));
        license.device_id = Some("device-a".to_string());
        license.used = true;
        license.activated_at = Some(past_timestamp(25));
        insert_test_license(&conn, &license);
    }

    let err = lifecycle::verify(&state, "GNP-EXPD-CCCC-DDDD", "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::Expired), "got {:?}", err);

    let before = queries::now();
    let extended = lifecycle::extend(&state, "GNP-EXPD-CCCC-DDDD", 10).unwrap();
    assert!(
        extended.expires_at >= before + 10 * SECONDS_PER_DAY,
        "extension of an expired key must count from now, not the stale expiry"
    );

    lifecycle::verify(&state, "GNP-EXPD-CCCC-DDDD", "device-a", None)
        .expect("Verify should succeed after extension");
}

#[test]
fn test_resume_does_not_unexpire() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let mut license = test_license("GNP-EXPD-EEEE-FFFF", past_timestamp(1));
        license.device_id = Some("device-a".to_string());
        license.used = true;
        license.active = false;
        insert_test_license(&conn, &license);
    }

    let resumed = lifecycle::set_active(&state, "GNP-EXPD-EEEE-FFFF", true).unwrap();
    assert!(resumed.active);

    // Re-enabled but still expired
    let err = lifecycle::verify(&state, "GNP-EXPD-EEEE-FFFF", "device-a", None).unwrap_err();
    assert!(matches!(err, AppError::Expired), "got {:?}", err);
}

#[test]
fn test_set_active_unknown_key() {
    let state = create_test_app_state();
    let err = lifecycle::set_active(&state, "GNP-ZZZZ-ZZZZ-ZZZZ", false).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let err = lifecycle::extend(&state, "GNP-ZZZZ-ZZZZ-ZZZZ", 10).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[test]
fn test_client_actions_are_logged() {
    let state = create_test_app_state();
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    lifecycle::activate(&state, &license.key, "device-a", Some("203.0.113.7")).unwrap();
    lifecycle::verify(&state, &license.key, "device-a", None).unwrap();
    lifecycle::deactivate(&state, &license.key, "device-a", None).unwrap();

    let log_conn = state.logs.get().unwrap();
    let logs = queries::recent_logs(&log_conn, &license.key, 10).unwrap();
    assert_eq!(logs.len(), 3);

    let actions: Vec<LogAction> = logs.iter().map(|l| l.action).collect();
    assert!(actions.contains(&LogAction::Activate));
    assert!(actions.contains(&LogAction::Verify));
    assert!(actions.contains(&LogAction::Deactivate));
    assert!(
        logs.iter()
            .any(|l| l.source_addr.as_deref() == Some("203.0.113.7"))
    );
}

#[test]
fn test_concurrent_activation_single_winner() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = create_file_app_state(dir.path());
    let license = lifecycle::create(&state, 30, None, None).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for device in ["device-a", "device-b"] {
        let state = state.clone();
        let key = license.key.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            lifecycle::activate(&state, &key, device, None)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<&License> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one activation must win: {:?}", results);

    let loser = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one activation must lose");
    assert!(
        matches!(loser, AppError::DeviceMismatch),
        "loser must observe the winner's binding, got {:?}",
        loser
    );

    // The stored record carries the winner's binding, fully applied
    let conn = state.db.get().unwrap();
    let stored = queries::get_license(&conn, &license.key).unwrap().unwrap();
    assert!(stored.used);
    assert_eq!(stored.device_id, winners[0].device_id);
}
