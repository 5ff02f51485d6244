use std::collections::HashMap;

use crate::{
    feed::{PostView, ReactionSummary, REACTION_TYPES},
    ids::{PostId, UserId},
    remote::{CommentCount, RawPost, RawReaction},
};

/// Builds view records for `raw_posts`, keeping their order.
///
/// Posts missing from `comment_counts` get a count of 0. Without a viewer
/// every `reacted_by_user` flag is false.
pub fn aggregate_posts(
    raw_posts: &[RawPost],
    comment_counts: &HashMap<PostId, u64>,
    viewer: Option<UserId>,
) -> Vec<PostView> {
    raw_posts
        .iter()
        .map(|raw| aggregate_post(raw, comment_counts, viewer))
        .collect()
}

pub fn aggregate_post(
    raw: &RawPost,
    comment_counts: &HashMap<PostId, u64>,
    viewer: Option<UserId>,
) -> PostView {
    let post = &raw.post;
    PostView {
        id: post.id,
        user_id: post.user_id,
        content: post.content.clone(),
        image_url: post.image_url.clone(),
        created_at: post.created_at.clone(),
        author: raw.author.clone(),
        comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
        reactions: summarize_reactions(&raw.reactions, viewer),
    }
}

/// One summary per reaction type, in declaration order. Reactions whose kind
/// is not a known type land in no bucket.
pub fn summarize_reactions(
    reactions: &[RawReaction],
    viewer: Option<UserId>,
) -> [ReactionSummary; 3] {
    REACTION_TYPES.map(|reaction_type| {
        let mut count = 0;
        let mut reacted_by_user = false;
        for reaction in reactions
            .iter()
            .filter(|reaction| reaction.kind == reaction_type.as_str())
        {
            count += 1;
            reacted_by_user |= viewer == Some(reaction.user_id);
        }

        ReactionSummary {
            reaction_type,
            count,
            reacted_by_user,
        }
    })
}

/// Folds count rows into a lookup map. Repeated post ids are summed.
pub fn comment_count_map(counts: impl IntoIterator<Item = CommentCount>) -> HashMap<PostId, u64> {
    let mut map = HashMap::new();
    for CommentCount { post_id, count } in counts {
        *map.entry(post_id).or_insert(0) += count;
    }
    map
}
