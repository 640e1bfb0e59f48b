mod support;

use quire_common::{
    model::{Id, ModelValidationError, post::AttachmentRef},
    pagination::PageNumber,
};
use quire_core::{
    CoreError, NotFoundError, PermissionDenied, ValidationError,
    authoring::{PostDraft, PostEdit},
    graph::{FollowOutcome, UnfollowOutcome},
};
use std::sync::Arc;
use support::{group, publish, services, user, username};
use tokio::task::JoinSet;

#[tokio::test]
async fn following_twice_creates_one_edge() {
    let services = services();
    let reader = user(&services, "reader").await;
    let author = user(&services, "author").await;
    let graph = services.graph();

    assert_eq!(
        graph.follow(reader.id, &author.username).await.unwrap(),
        FollowOutcome::Followed
    );
    assert_eq!(
        graph.follow(reader.id, &author.username).await.unwrap(),
        FollowOutcome::AlreadyFollowing
    );

    assert_eq!(graph.follower_count(author.id).await.unwrap(), 1);
    assert_eq!(graph.following_count(reader.id).await.unwrap(), 1);
    assert!(graph.is_following(reader.id, author.id).await.unwrap());
    assert!(!graph.is_following(author.id, reader.id).await.unwrap());
    assert_eq!(graph.followed_by(reader.id).await.unwrap(), [author.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_follows_create_one_edge() {
    let services = Arc::new(services());
    let reader = user(&services, "reader").await;
    let author = user(&services, "author").await;

    let mut follows = JoinSet::new();
    for _ in 0..16 {
        let services = Arc::clone(&services);
        let target = author.username.clone();
        follows.spawn(async move { services.graph().follow(reader.id, &target).await });
    }
    let outcomes = follows.join_all().await;

    let followed = outcomes
        .into_iter()
        .map(Result::unwrap)
        .filter(|outcome| *outcome == FollowOutcome::Followed)
        .count();
    assert_eq!(followed, 1);
    assert_eq!(services.graph().follower_count(author.id).await.unwrap(), 1);
}

#[tokio::test]
async fn unfollowing_without_edge_is_a_no_op() {
    let services = services();
    let reader = user(&services, "reader").await;
    let author = user(&services, "author").await;
    let other = user(&services, "other").await;
    let graph = services.graph();
    graph.follow(other.id, &author.username).await.unwrap();

    assert_eq!(
        graph.unfollow(reader.id, &author.username).await.unwrap(),
        UnfollowOutcome::NotFollowing
    );
    assert_eq!(graph.follower_count(author.id).await.unwrap(), 1);

    assert_eq!(
        graph.unfollow(other.id, &author.username).await.unwrap(),
        UnfollowOutcome::Unfollowed
    );
    assert_eq!(graph.follower_count(author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn self_follow_is_silently_ignored() {
    let services = services();
    let narcissus = user(&services, "narcissus").await;
    let graph = services.graph();

    assert_eq!(
        graph.follow(narcissus.id, &narcissus.username).await.unwrap(),
        FollowOutcome::SelfFollowIgnored
    );
    assert_eq!(
        graph.unfollow(narcissus.id, &narcissus.username).await.unwrap(),
        UnfollowOutcome::SelfUnfollowIgnored
    );
    assert_eq!(graph.follower_count(narcissus.id).await.unwrap(), 0);
    assert!(!graph.is_following(narcissus.id, narcissus.id).await.unwrap());
}

#[tokio::test]
async fn following_an_unknown_user_is_not_found() {
    let services = services();
    let reader = user(&services, "reader").await;

    let outcome = services.graph().follow(reader.id, &username("ghost")).await;
    assert!(matches!(
        outcome,
        Err(CoreError::NotFound(NotFoundError::UserByUsername(_)))
    ));
}

#[tokio::test]
async fn blank_post_is_rejected() {
    let services = services();
    let leo = user(&services, "leo").await;

    let draft = PostDraft {
        text: "   \n".to_owned(),
        ..PostDraft::default()
    };
    let result = services.authoring().create_post(leo.id, draft).await;

    assert!(matches!(
        result,
        Err(CoreError::Validation(ValidationError::Model(
            ModelValidationError::Text(_)
        )))
    ));
    assert!(services.store().posts_by_author(leo.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_group_is_invalid_input() {
    let services = services();
    let leo = user(&services, "leo").await;

    let draft = PostDraft {
        text: "hello".to_owned(),
        group: Some("nowhere".to_owned()),
        attachment: None,
    };
    let result = services.authoring().create_post(leo.id, draft).await;

    assert!(matches!(
        result,
        Err(CoreError::Validation(ValidationError::UnknownGroup(_)))
    ));
}

#[tokio::test]
async fn non_author_cannot_edit() {
    let services = services();
    let author = user(&services, "author").await;
    let intruder = user(&services, "intruder").await;
    let post = publish(&services, &author, "original").await;

    let edit = PostEdit {
        text: "defaced".to_owned(),
        ..PostEdit::default()
    };
    let result = services.authoring().edit_post(intruder.id, post.id, edit).await;

    assert!(matches!(
        result,
        Err(CoreError::PermissionDenied(PermissionDenied { actor, .. })) if actor == intruder.id
    ));
    let unchanged = services.find_post(&author.username, post.id).await.unwrap();
    assert_eq!(unchanged.text.get(), "original");
}

#[tokio::test]
async fn author_edit_keeps_identity_and_timestamp() {
    let services = services();
    let author = user(&services, "author").await;
    let cats = group(&services, "cats").await;
    let post = services
        .authoring()
        .create_post(
            author.id,
            PostDraft {
                text: "first draft".to_owned(),
                group: None,
                attachment: Some("posts/cat.gif".to_owned()),
            },
        )
        .await
        .unwrap();

    let edited = services
        .authoring()
        .edit_post(
            author.id,
            post.id,
            PostEdit {
                text: "final".to_owned(),
                group: Some("cats".to_owned()),
                ..PostEdit::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.id, post.id);
    assert_eq!(edited.author, post.author);
    assert_eq!(edited.created_at, post.created_at);
    assert_eq!(edited.text.get(), "final");
    assert_eq!(edited.group, Some(cats));
    assert_eq!(
        edited.attachment,
        Some(AttachmentRef::new("posts/cat.gif".to_owned()).unwrap())
    );

    let cleared = services
        .authoring()
        .edit_post(
            author.id,
            post.id,
            PostEdit {
                text: "final".to_owned(),
                clear_attachment: true,
                ..PostEdit::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.attachment, None);
    assert_eq!(cleared.group, None);
}

#[tokio::test]
async fn editing_a_missing_post_is_not_found() {
    let services = services();
    let author = user(&services, "author").await;

    let result = services
        .authoring()
        .edit_post(
            author.id,
            Id::from(42),
            PostEdit {
                text: "text".to_owned(),
                ..PostEdit::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(CoreError::NotFound(NotFoundError::PostById(_)))
    ));
}

#[tokio::test]
async fn empty_comment_leaves_count_unchanged() {
    let services = services();
    let author = user(&services, "author").await;
    let post = publish(&services, &author, "discuss").await;
    let comments = services.comments();

    comments
        .add_comment(post.id, author.id, "first!".to_owned())
        .await
        .unwrap();
    let rejected = comments
        .add_comment(post.id, author.id, String::new())
        .await;

    assert!(matches!(rejected, Err(CoreError::Validation(_))));
    assert_eq!(comments.comment_count(post.id).await.unwrap(), 1);
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let services = services();
    let author = user(&services, "author").await;

    let result = services
        .comments()
        .add_comment(Id::from(42), author.id, "hello".to_owned())
        .await;
    assert!(matches!(
        result,
        Err(CoreError::NotFound(NotFoundError::PostById(_)))
    ));
}

#[tokio::test]
async fn post_view_collects_author_stats_and_comments() {
    let services = services();
    let author = user(&services, "author").await;
    let reader = user(&services, "reader").await;
    let post = publish(&services, &author, "look at this").await;
    publish(&services, &author, "and this").await;
    services
        .graph()
        .follow(reader.id, &author.username)
        .await
        .unwrap();
    services
        .comments()
        .add_comment(post.id, reader.id, "nice".to_owned())
        .await
        .unwrap();

    let view = services
        .post_view(&author.username, post.id, Some(reader.id))
        .await
        .unwrap();
    assert_eq!(view.post, post);
    assert_eq!(view.author_posts, 2);
    assert_eq!(view.followers, 1);
    assert_eq!(view.following, 0);
    assert_eq!(view.follows, Some(true));
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].author, reader);

    let wrong_author = services.post_view(&reader.username, post.id, None).await;
    assert!(matches!(
        wrong_author,
        Err(CoreError::NotFound(NotFoundError::PostById(_)))
    ));

    let profile = services
        .profile(&author.username, Some(author.id), PageNumber::FIRST)
        .await
        .unwrap();
    assert_eq!(profile.follows, Some(false));
    assert_eq!(profile.feed.total_count, 2);
}
