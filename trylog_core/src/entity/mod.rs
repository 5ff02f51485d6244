// SeaORM entities for every table the store owns.

pub mod account;
pub mod comment;
pub mod post;
pub mod reaction;
pub mod session;
pub mod user;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use super::account::{
        ActiveModel as AccountActiveModel, Column as AccountColumn, Entity as Account,
        Model as AccountModel,
    };
    pub use super::comment::{
        ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comment,
        Model as CommentModel,
    };
    pub use super::post::{
        ActiveModel as PostActiveModel, Column as PostColumn, Entity as Post, Model as PostModel,
    };
    pub use super::reaction::{
        ActiveModel as ReactionActiveModel, Column as ReactionColumn, Entity as Reaction,
        Model as ReactionModel,
    };
    pub use super::session::{
        ActiveModel as SessionActiveModel, Column as SessionColumn, Entity as Session,
        Model as SessionModel,
    };
    pub use super::user::{
        ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
        TransactionTrait,
    };
}
