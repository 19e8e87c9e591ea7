//! # Yatube Core
//!
//! The domain layer of the Yatube blogging platform.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, repository ports, the paginator and the listing/follow services.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use pagination::{Page, PageSlot, Paginator};
