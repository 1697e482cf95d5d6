mod common;

use common::Harness;
use social_service::domain::models::NotificationType;
use social_service::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_like_then_unlike_removes_exactly_that_notification() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let post = h.post(bob, "sunset").await;
    let other = h.post(bob, "sunrise").await;

    h.engagement.toggle_like(alice, other).await.unwrap();
    h.relationships.toggle_follow(alice, bob).await.unwrap();

    let liked = h.engagement.toggle_like(alice, post).await.unwrap();
    assert!(liked.liked);
    assert_eq!(h.count_of(bob, NotificationType::Like).await, 2);
    assert_eq!(h.load(alice).await.liked_posts, vec![other, post]);

    let unliked = h.engagement.toggle_like(alice, post).await.unwrap();
    assert!(!unliked.liked);

    let stored = h.stores.posts.find(post).await.unwrap().unwrap();
    assert!(stored.likes.is_empty());
    assert_eq!(h.load(alice).await.liked_posts, vec![other]);

    let remaining = h.notifications_for(bob).await;
    assert_eq!(remaining.len(), 2);
    assert!(remaining
        .iter()
        .any(|n| n.kind == NotificationType::Like && n.post == Some(other)));
    assert!(remaining.iter().any(|n| n.kind == NotificationType::Follow));
}

#[tokio::test]
async fn test_liking_own_post_creates_no_notification() {
    let h = Harness::new();
    let bob = h.account("bob").await;
    let post = h.post(bob, "selfie").await;

    assert!(h.engagement.toggle_like(bob, post).await.unwrap().liked);
    assert!(h.notifications_for(bob).await.is_empty());
    assert_eq!(h.stores.posts.find(post).await.unwrap().unwrap().likes, vec![bob]);
}

#[tokio::test]
async fn test_like_missing_post_is_not_found() {
    let h = Harness::new();
    let alice = h.account("alice").await;

    let err = h.engagement.toggle_like(alice, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.load(alice).await.liked_posts.is_empty());
}

#[tokio::test]
async fn test_concurrent_likes_never_duplicate() {
    let h = Arc::new(Harness::new());
    let bob = h.account("bob").await;
    let post = h.post(bob, "popular").await;
    let mut fans = Vec::new();
    for i in 0..20 {
        fans.push(h.account(&format!("fan{}", i)).await);
    }

    let tasks: Vec<_> = fans
        .iter()
        .map(|&fan| {
            let h = h.clone();
            tokio::spawn(async move { h.engagement.toggle_like(fan, post).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap().liked);
    }

    let likes = h.stores.posts.find(post).await.unwrap().unwrap().likes;
    assert_eq!(likes.len(), fans.len());
    for fan in &fans {
        assert_eq!(likes.iter().filter(|l| *l == fan).count(), 1);
    }
    assert_eq!(h.count_of(bob, NotificationType::Like).await, fans.len());
}

#[tokio::test]
async fn test_whitespace_comment_is_rejected_without_side_effects() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let post = h.post(bob, "hello").await;

    let err = h.engagement.add_comment(alice, post, "  \n\t ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "Comment cannot be empty");

    assert!(h.stores.posts.find(post).await.unwrap().unwrap().comments.is_empty());
    assert!(h.notifications_for(bob).await.is_empty());
}

#[tokio::test]
async fn test_comments_keep_insertion_order_and_notify_owner() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let post = h.post(bob, "hello").await;

    let first = h.engagement.add_comment(alice, post, "  first ").await.unwrap();
    let second = h.engagement.add_comment(bob, post, "second").await.unwrap();
    let third = h.engagement.add_comment(alice, post, "third").await.unwrap();
    assert_eq!(first.text, "first");

    let stored = h.stores.posts.find(post).await.unwrap().unwrap();
    let ids: Vec<Uuid> = stored.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);

    // bob commenting on his own post is not notified; alice's two comments share one tuple
    assert_eq!(h.count_of(bob, NotificationType::Comment).await, 1);
}

#[tokio::test]
async fn test_edit_comment_is_owner_only() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let post = h.post(bob, "hello").await;
    let comment = h.engagement.add_comment(alice, post, "nice").await.unwrap();

    let err = h
        .engagement
        .edit_comment(bob, post, comment.id, "edited by bob")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let edited = h
        .engagement
        .edit_comment(alice, post, comment.id, " very nice ")
        .await
        .unwrap();
    assert_eq!(edited.text, "very nice");
    assert_eq!(edited.created_at, comment.created_at);

    let stored = h.stores.posts.find(post).await.unwrap().unwrap();
    assert_eq!(stored.comment(comment.id).unwrap().text, "very nice");
    assert_eq!(h.count_of(bob, NotificationType::Comment).await, 1);

    let err = h
        .engagement
        .edit_comment(alice, post, Uuid::new_v4(), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_comment_by_third_party_is_unauthorized() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let carol = h.account("carol").await;
    let post = h.post(bob, "hello").await;
    let comment = h.engagement.add_comment(alice, post, "nice").await.unwrap();

    let err = h
        .engagement
        .delete_comment(carol, post, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(h.stores.posts.find(post).await.unwrap().unwrap().comments.len(), 1);
}

#[tokio::test]
async fn test_post_owner_can_delete_any_comment_and_notification_stays() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let post = h.post(bob, "hello").await;
    let comment = h.engagement.add_comment(alice, post, "spam").await.unwrap();
    let own = h.engagement.add_comment(alice, post, "keep").await.unwrap();

    h.engagement.delete_comment(bob, post, comment.id).await.unwrap();
    h.engagement.delete_comment(alice, post, own.id).await.unwrap();

    assert!(h.stores.posts.find(post).await.unwrap().unwrap().comments.is_empty());
    assert_eq!(h.count_of(bob, NotificationType::Comment).await, 1);
}

#[tokio::test]
async fn test_reshare_twice_creates_two_posts_and_two_notifications() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let original = h
        .posts
        .create(bob, Some("the view".into()), Some("data:image/png;base64,AAAA".into()))
        .await
        .unwrap();

    let first = h.engagement.reshare(alice, original.id).await.unwrap();
    let second = h.engagement.reshare(alice, original.id).await.unwrap();

    assert_ne!(first.id, second.id);
    for reshare in [&first, &second] {
        assert!(reshare.is_reshare);
        assert_eq!(reshare.author_id, alice);
        assert_eq!(reshare.original_post, Some(original.id));
        assert_eq!(reshare.text.as_deref(), Some("Reposted by @alice: the view"));
        assert_eq!(reshare.img, original.img);
        assert!(reshare.likes.is_empty());
    }
    assert_eq!(h.count_of(bob, NotificationType::Reshare).await, 2);
    // the image was uploaded once, for the original
    assert_eq!(h.images.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reshare_missing_original_is_not_found() {
    let h = Harness::new();
    let alice = h.account("alice").await;

    let err = h.engagement.reshare(alice, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Original post not found");
}

#[tokio::test]
async fn test_reshare_likes_are_independent_of_original() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let original = h.post(bob, "original").await;
    let reshare = h.engagement.reshare(alice, original).await.unwrap();

    h.engagement.toggle_like(bob, reshare.id).await.unwrap();

    assert!(h.stores.posts.find(original).await.unwrap().unwrap().likes.is_empty());
    assert_eq!(
        h.stores.posts.find(reshare.id).await.unwrap().unwrap().likes,
        vec![bob]
    );
}

#[tokio::test]
async fn test_reshare_releases_only_images_it_was_given() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let original = h
        .posts
        .create(bob, Some("sunset".into()), Some("data:image/png;base64,AAAA".into()))
        .await
        .unwrap();
    let reshare = h.engagement.reshare(alice, original.id).await.unwrap();

    // Replacing the inherited image leaves the original's image alone
    h.posts
        .edit(alice, reshare.id, None, Some("data:image/png;base64,BBBB".into()))
        .await
        .unwrap();
    assert!(h.images.destroyed.lock().unwrap().is_empty());

    // The replacement belongs to the reshare
    h.posts
        .edit(alice, reshare.id, None, Some("data:image/png;base64,CCCC".into()))
        .await
        .unwrap();
    assert_eq!(*h.images.destroyed.lock().unwrap(), vec!["img2".to_string()]);

    h.posts.delete(alice, reshare.id).await.unwrap();
    assert_eq!(
        *h.images.destroyed.lock().unwrap(),
        vec!["img2".to_string(), "img3".to_string()]
    );
    assert_eq!(
        h.stores.posts.find(original.id).await.unwrap().unwrap().img,
        original.img
    );
}

#[tokio::test]
async fn test_deleting_untouched_reshare_keeps_original_image() {
    let h = Harness::new();
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let original = h
        .posts
        .create(bob, None, Some("data:image/png;base64,AAAA".into()))
        .await
        .unwrap();
    let reshare = h.engagement.reshare(alice, original.id).await.unwrap();

    h.posts.delete(alice, reshare.id).await.unwrap();
    assert!(h.images.destroyed.lock().unwrap().is_empty());

    h.posts.delete(bob, original.id).await.unwrap();
    assert_eq!(*h.images.destroyed.lock().unwrap(), vec!["img1".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_actor_concurrent_like_toggles_keep_set_semantics() {
    let h = Arc::new(Harness::new());
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;

    for round in 0..20 {
        let post = h.post(bob, &format!("round {}", round)).await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let h = h.clone();
                tokio::spawn(async move { h.engagement.toggle_like(alice, post).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let likes = h.stores.posts.find(post).await.unwrap().unwrap().likes;
        let indexed = h.load(alice).await.liked_posts;
        assert!(likes.iter().filter(|l| **l == alice).count() <= 1);
        assert!(indexed.iter().filter(|p| **p == post).count() <= 1);
        assert!(h.count_of(bob, NotificationType::Like).await <= 1);

        // One more toggle settles any interleaving of the burst
        h.engagement.toggle_like(alice, post).await.unwrap();
        let liked = h
            .stores
            .posts
            .find(post)
            .await
            .unwrap()
            .unwrap()
            .is_liked_by(alice);
        let indexed = h.load(alice).await.liked_posts.contains(&post);
        assert_eq!(liked, indexed);
        let notes = h
            .notifications_for(bob)
            .await
            .iter()
            .filter(|n| n.kind == NotificationType::Like && n.post == Some(post))
            .count();
        assert_eq!(notes, usize::from(liked));
    }
}
