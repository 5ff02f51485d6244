use crate::{
    error::ClientError,
    feed::{PostView, ReactionType},
    ids::{PostId, ReactionId, UserId},
    remote::NewReaction,
};

/// The single write a reaction toggle performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    Add(NewReaction),
    Remove {
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    },
}

/// Decides the toggle write from the aggregated view the viewer is looking at.
pub fn plan_toggle(
    post: &PostView,
    reaction_type: ReactionType,
    viewer: Option<UserId>,
) -> Result<ToggleAction, ClientError> {
    let Some(user_id) = viewer else {
        return Err(ClientError::Auth("sign in to react to posts".to_string()));
    };

    if post.is_authored_by(viewer) {
        return Err(ClientError::validation("you cannot react to your own post"));
    }

    if post.reaction(reaction_type).reacted_by_user {
        Ok(ToggleAction::Remove {
            post_id: post.id,
            user_id,
            reaction_type,
        })
    } else {
        Ok(ToggleAction::Add(NewReaction {
            id: ReactionId::new(),
            post_id: post.id,
            user_id,
            reaction_type,
            created_at: crate::now_rfc3339(),
        }))
    }
}
