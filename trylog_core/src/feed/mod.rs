//! Client-side feed logic: turning raw store rows into view records, the
//! display window over them, and the reaction toggle decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{PostId, UserId};
use crate::remote::AuthorSummary;

pub mod aggregate;
pub mod pager;
pub mod toggle;

pub use aggregate::{aggregate_post, aggregate_posts, comment_count_map, summarize_reactions};
pub use pager::{FeedPager, PAGE_SIZE};
pub use toggle::{plan_toggle, ToggleAction};

/// The fixed set of reactions a user can attach to a post. A user may hold
/// any combination of them on the same post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionType {
    Like,
    WillTry,
    HaveTried,
}

/// Every reaction type, in declaration order.
pub const REACTION_TYPES: [ReactionType; 3] =
    [ReactionType::Like, ReactionType::WillTry, ReactionType::HaveTried];

impl ReactionType {
    /// Name stored in the `reaction.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "LIKE",
            ReactionType::WillTry => "WILL_TRY",
            ReactionType::HaveTried => "HAVE_TRIED",
        }
    }

    /// Position in [`REACTION_TYPES`].
    pub fn index(self) -> usize {
        match self {
            ReactionType::Like => 0,
            ReactionType::WillTry => 1,
            ReactionType::HaveTried => 2,
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reaction type `{0}`")]
pub struct UnknownReactionType(pub String);

impl FromStr for ReactionType {
    type Err = UnknownReactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REACTION_TYPES
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownReactionType(s.to_string()))
    }
}

/// Count and viewer flag for one reaction type on one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub reaction_type: ReactionType,
    pub count: u64,
    pub reacted_by_user: bool,
}

/// Aggregated post view: a post with its author and derived statistics.
/// Rebuilt on every fetch, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    /// `None` when the author row is missing; shown as a placeholder.
    pub author: Option<AuthorSummary>,
    pub comment_count: u64,
    pub reactions: [ReactionSummary; 3],
}

impl PostView {
    pub fn reaction(&self, reaction_type: ReactionType) -> &ReactionSummary {
        &self.reactions[reaction_type.index()]
    }

    pub fn is_authored_by(&self, user_id: Option<UserId>) -> bool {
        user_id == Some(self.user_id)
    }

    /// Reactions can be toggled only by a signed-in viewer on someone else's post.
    pub fn can_react(&self, viewer: Option<UserId>) -> bool {
        viewer.is_some() && !self.is_authored_by(viewer)
    }
}
