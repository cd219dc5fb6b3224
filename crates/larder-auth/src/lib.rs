//! # Larder Auth
//!
//! Authorization resolution for the Larder sharing engine.
//!
//! ## Overview
//!
//! Given a subject and a resource, [`resolve`] computes the effective
//! permission as the join (maximum) over every path that reaches the
//! resource:
//!
//! - **Ownership**: owners always hold `admin`
//! - **Targeted grant**: an active grant naming the subject
//! - **Presented share code**: a link grant, or a targeted grant's code
//!   presented by its named target
//! - **Binder inheritance** (recipes only): access to a containing
//!   binder extends, at the same level, to its member recipes
//!
//! "No access" is the normal `None` result, never an error; only store
//! failures and unknown resource ids propagate as errors.
//!
//! The module also provides the share-code generator used when grants
//! are created.

pub mod code;
pub mod error;
pub mod resolver;

pub use code::{generate_share_code, CODE_ENTROPY_BYTES};
pub use error::{AuthError, Result};
pub use resolver::resolve;
