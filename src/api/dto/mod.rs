//! Data Transfer Objects for REST request/response serialization.
//!
//! Request bodies reuse the domain input types (`NewEventType`,
//! `NewTrigger`, ...). This module holds the response envelope, paging
//! parameters and the few shapes that exist only on the wire.

pub mod common_dto;
pub mod resource_dto;

pub use common_dto::*;
pub use resource_dto::*;
