//! # Blogicum Core
//!
//! The domain layer of the blog.
//! Entities, visibility and ownership rules, pagination, form cleaning and the
//! request-level operations of [`BlogService`]. No infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod forms;
pub mod ownership;
pub mod pagination;
pub mod ports;
pub mod services;
pub mod visibility;

pub use error::DomainError;
pub use services::{BlogService, Destination, Outcome, Repositories};
