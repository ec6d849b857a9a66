//! # Blogicum Shared
//!
//! Wire types shared by the server and its clients: auth DTOs, query
//! parameters, the page envelope handed to the renderer and problem details.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, PageResponse};
