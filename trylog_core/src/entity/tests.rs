#[cfg(test)]
mod entity_tests {
    use crate::entity::prelude::*;
    use crate::ids::*;
    use crate::models::test_db;

    async fn insert_user(db: &DatabaseConnection, username: &str) -> UserId {
        let user_id = UserId::new();
        let user = UserActiveModel {
            id: Set(user_id),
            username: Set(username.to_string()),
            image_url: Set(None),
            bio: Set(None),
        };
        User::insert(user).exec(db).await.unwrap();
        user_id
    }

    async fn insert_post(db: &DatabaseConnection, user_id: UserId, content: &str) -> PostId {
        let post_id = PostId::new();
        let post = PostActiveModel {
            id: Set(post_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            image_url: Set(None),
            created_at: Set(crate::now_rfc3339()),
        };
        Post::insert(post).exec(db).await.unwrap();
        post_id
    }

    fn reaction(post_id: PostId, user_id: UserId, kind: &str) -> ReactionActiveModel {
        ReactionActiveModel {
            id: Set(ReactionId::new()),
            post_id: Set(post_id),
            user_id: Set(user_id),
            kind: Set(kind.to_string()),
            created_at: Set(crate::now_rfc3339()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = test_db().await;

        let user_id = UserId::new();
        let user = UserActiveModel {
            id: Set(user_id),
            username: Set("hanako".to_string()),
            image_url: Set(Some("http://localhost/a.png".to_string())),
            bio: Set(Some("tries everything once".to_string())),
        };
        User::insert(user).exec(&db).await.unwrap();

        let found = User::find_by_id(user_id).one(&db).await.unwrap().unwrap();
        assert_eq!(found.username, "hanako");
        assert_eq!(found.bio.as_deref(), Some("tries everything once"));
    }

    #[tokio::test]
    async fn test_post_requires_existing_user() {
        let db = test_db().await;

        let post = PostActiveModel {
            id: Set(PostId::new()),
            user_id: Set(UserId::new()),
            content: Set("orphan".to_string()),
            image_url: Set(None),
            created_at: Set(crate::now_rfc3339()),
        };

        let result = Post::insert(post).exec(&db).await;
        assert!(result.is_err(), "Should fail due to foreign key");
    }

    #[tokio::test]
    async fn test_reaction_unique_per_post_user_kind() {
        let db = test_db().await;
        let author = insert_user(&db, "author").await;
        let reader = insert_user(&db, "reader").await;
        let post_id = insert_post(&db, author, "baked bread").await;

        Reaction::insert(reaction(post_id, reader, "LIKE"))
            .exec(&db)
            .await
            .unwrap();
        Reaction::insert(reaction(post_id, reader, "WILL_TRY"))
            .exec(&db)
            .await
            .unwrap();

        // Same tuple again
        let result = Reaction::insert(reaction(post_id, reader, "LIKE"))
            .exec(&db)
            .await;
        assert!(result.is_err(), "Should fail due to unique constraint");
    }

    #[tokio::test]
    async fn test_cascade_delete_post() {
        let db = test_db().await;
        let author = insert_user(&db, "author").await;
        let reader = insert_user(&db, "reader").await;
        let post_id = insert_post(&db, author, "went camping").await;

        Reaction::insert(reaction(post_id, reader, "HAVE_TRIED"))
            .exec(&db)
            .await
            .unwrap();

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            user_id: Set(reader),
            content: Set("where?".to_string()),
            created_at: Set(crate::now_rfc3339()),
        };
        Comment::insert(comment).exec(&db).await.unwrap();

        Post::delete_by_id(post_id).exec(&db).await.unwrap();

        let reactions = Reaction::find()
            .filter(ReactionColumn::PostId.eq(post_id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(reactions, 0, "Reactions should be cascade deleted");

        let comments = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(comments, 0, "Comments should be cascade deleted");
    }

    #[tokio::test]
    async fn test_find_post_with_related_reactions() {
        let db = test_db().await;
        let author = insert_user(&db, "author").await;
        let post_id = insert_post(&db, author, "tried natto").await;
        let quiet_post = insert_post(&db, author, "nothing yet").await;

        for i in 0..3 {
            let reader = insert_user(&db, &format!("reader {i}")).await;
            Reaction::insert(reaction(post_id, reader, "LIKE"))
                .exec(&db)
                .await
                .unwrap();
        }

        let posts = Post::find()
            .filter(PostColumn::Id.is_in([post_id, quiet_post]))
            .find_with_related(Reaction)
            .all(&db)
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        for (post, reactions) in &posts {
            if post.id == post_id {
                assert_eq!(reactions.len(), 3);
            } else {
                assert!(reactions.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_find_comment_with_author() {
        let db = test_db().await;
        let author = insert_user(&db, "author").await;
        let post_id = insert_post(&db, author, "made ramen").await;

        let comment_id = CommentId::new();
        let comment = CommentActiveModel {
            id: Set(comment_id),
            post_id: Set(post_id),
            user_id: Set(author),
            content: Set("recipe in bio".to_string()),
            created_at: Set(crate::now_rfc3339()),
        };
        Comment::insert(comment).exec(&db).await.unwrap();

        let (comment, user) = Comment::find_by_id(comment_id)
            .find_also_related(User)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(comment.content, "recipe in bio");
        assert_eq!(user.map(|u| u.username), Some("author".to_string()));
    }

    #[tokio::test]
    async fn test_cascade_delete_account_sessions() {
        let db = test_db().await;

        let account_id = UserId::new();
        let account = AccountActiveModel {
            id: Set(account_id),
            email: Set("taro@example.com".to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            created_at: Set(crate::now_rfc3339()),
        };
        Account::insert(account).exec(&db).await.unwrap();

        for token in ["first", "second"] {
            let session = SessionActiveModel {
                token: Set(token.to_string()),
                account_id: Set(account_id),
                created_at: Set(crate::now_rfc3339()),
            };
            Session::insert(session).exec(&db).await.unwrap();
        }

        Account::delete_by_id(account_id).exec(&db).await.unwrap();

        let sessions = Session::find().count(&db).await.unwrap();
        assert_eq!(sessions, 0, "Sessions should be cascade deleted");
    }
}
