//! Translation of post filters into SQL conditions.
//!
//! The resulting condition refers to `categories` columns, so every query it
//! is applied to must join the post's category.

use sea_orm::{ColumnTrait, Condition};

use blogicum_core::visibility::{PostFilter, PostPredicate};

use super::entity::{category, post};

pub(crate) fn condition(filter: &PostFilter) -> Condition {
    filter
        .predicates()
        .iter()
        .fold(Condition::all(), |cond, predicate| {
            cond.add(predicate_condition(predicate))
        })
}

fn predicate_condition(predicate: &PostPredicate) -> Condition {
    match predicate {
        PostPredicate::Published => Condition::all().add(post::Column::IsPublished.eq(true)),
        PostPredicate::CategoryPublished => {
            Condition::all().add(category::Column::IsPublished.eq(true))
        }
        PostPredicate::PublishedBy(now) => Condition::all().add(post::Column::PublishAt.lte(*now)),
        PostPredicate::AuthoredBy(user_id) => {
            Condition::all().add(post::Column::AuthorId.eq(*user_id))
        }
        PostPredicate::InCategory(category_id) => {
            Condition::all().add(post::Column::CategoryId.eq(*category_id))
        }
        PostPredicate::AnyOf(filters) => filters
            .iter()
            .fold(Condition::any(), |cond, f| cond.add(condition(f))),
    }
}
