//! HTTP handlers of the registry API.

pub mod application;
pub mod auth;
pub mod klink;
pub mod permission;
pub mod registrant;
pub mod v1;
