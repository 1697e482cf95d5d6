mod common;

use common::{FlakyAccounts, Harness};
use social_service::domain::models::NotificationType;
use social_service::repository::MemoryStore;
use social_service::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_alice_follows_bob() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;

    let outcome = h.relationships.toggle_follow(alice, bob).await.unwrap();
    assert!(outcome.following);

    assert_eq!(h.load(bob).await.followers, vec![alice]);
    assert_eq!(h.load(alice).await.following, vec![bob]);

    let notifications = h.notifications_for(bob).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationType::Follow);
    assert_eq!(notifications[0].from, alice);
    assert!(!notifications[0].read);
}

#[tokio::test]
async fn test_follow_twice_restores_relation_sets() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let before_alice = h.load(alice).await;
    let before_bob = h.load(bob).await;

    assert!(h.relationships.toggle_follow(alice, bob).await.unwrap().following);
    assert!(!h.relationships.toggle_follow(alice, bob).await.unwrap().following);

    let after_alice = h.load(alice).await;
    let after_bob = h.load(bob).await;
    assert_eq!(after_alice.following, before_alice.following);
    assert_eq!(after_alice.followers, before_alice.followers);
    assert_eq!(after_bob.following, before_bob.following);
    assert_eq!(after_bob.followers, before_bob.followers);
}

#[tokio::test]
async fn test_unfollow_keeps_follow_notification_and_refollow_does_not_duplicate() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;

    h.relationships.toggle_follow(alice, bob).await.unwrap();
    h.relationships.toggle_follow(alice, bob).await.unwrap();
    assert_eq!(h.count_of(bob, NotificationType::Follow).await, 1);

    h.relationships.toggle_follow(alice, bob).await.unwrap();
    assert_eq!(h.count_of(bob, NotificationType::Follow).await, 1);
}

#[tokio::test]
async fn test_self_follow_is_invalid_even_for_unknown_account() {
    let h = Harness::new();
    let alice = h.account("alice").await;

    let err = h.relationships.toggle_follow(alice, alice).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperation(_)));
    assert_eq!(err.to_string(), "Cannot follow yourself");

    let ghost = Uuid::new_v4();
    let err = h.relationships.toggle_follow(ghost, ghost).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperation(_)));

    assert!(h.load(alice).await.following.is_empty());
}

#[tokio::test]
async fn test_missing_account_is_not_found() {
    let h = Harness::new();
    let alice = h.account("alice").await;

    let err = h
        .relationships
        .toggle_follow(alice, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .relationships
        .toggle_follow(Uuid::new_v4(), alice)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.load(alice).await.followers.is_empty());
}

#[tokio::test]
async fn test_transient_store_failures_are_retried() {
    let memory = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyAccounts::new(memory.clone()));
    let h = Harness::with_accounts(flaky.clone(), memory);
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;

    flaky.transient_failures.store(2, Ordering::SeqCst);
    let outcome = h.relationships.toggle_follow(alice, bob).await.unwrap();

    assert!(outcome.following);
    assert_eq!(h.load(bob).await.followers, vec![alice]);
    assert_eq!(h.load(alice).await.following, vec![bob]);
    // two set writes plus the two injected failures
    assert_eq!(flaky.set_write_attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_partial_failure_is_reported_and_retry_converges() {
    let memory = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyAccounts::new(memory.clone()));
    let h = Harness::with_accounts(flaky.clone(), memory);
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;

    flaky.following_down.store(true, Ordering::SeqCst);
    let err = h.relationships.toggle_follow(alice, bob).await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    // One-sided edge: bob lists alice, alice does not list bob, nobody is notified
    assert_eq!(h.load(bob).await.followers, vec![alice]);
    assert!(h.load(alice).await.following.is_empty());
    assert_eq!(h.count_of(bob, NotificationType::Follow).await, 0);

    // The deciding set was not written, so repeating the request follows again
    flaky.following_down.store(false, Ordering::SeqCst);
    let outcome = h.relationships.toggle_follow(alice, bob).await.unwrap();
    assert!(outcome.following);
    assert_eq!(h.load(bob).await.followers, vec![alice]);
    assert_eq!(h.load(alice).await.following, vec![bob]);
    assert_eq!(h.count_of(bob, NotificationType::Follow).await, 1);
}

#[tokio::test]
async fn test_concurrent_followers_all_land_once() {
    let h = Arc::new(Harness::new());
    let bob = h.account("bob").await;
    let mut fans = Vec::new();
    for i in 0..16 {
        fans.push(h.account(&format!("fan{}", i)).await);
    }

    let tasks: Vec<_> = fans
        .iter()
        .map(|&fan| {
            let h = h.clone();
            tokio::spawn(async move { h.relationships.toggle_follow(fan, bob).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap().following);
    }

    let followers = h.load(bob).await.followers;
    assert_eq!(followers.len(), fans.len());
    for fan in &fans {
        assert_eq!(followers.iter().filter(|f| *f == fan).count(), 1);
    }
    assert_eq!(h.count_of(bob, NotificationType::Follow).await, fans.len());
}
