//! Core types and operations for the Siren dispatch service.
//!
//! This crate has no HTTP or database dependencies. The operations here
//! (dispatch, lifecycle transitions, the message thread) are generic over
//! [`store::DispatchStore`] and take the acting identity as an explicit
//! [`account::Actor`] parameter.

// Store impls use native `async fn` in traits.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod alert;
pub mod directory;
pub mod dispatch;
pub mod emergency;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod report;
pub mod responder;
pub mod store;
pub mod thread;

pub use error::{Error, Result, StoreError};
