//! # Postboard Core
//!
//! The domain layer of Postboard: posts, groups, feeds and the rules for writing them.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

pub use error::{DomainError, FormErrors, RepoError};
pub use pagination::{PAGE_SIZE, Page, PageRequest};
