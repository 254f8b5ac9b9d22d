#![deny(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::must_use_candidate)]
//! # disqus-export
//!
//! disqus-export downloads every thread of a Disqus forum together with all
//! of its comments and stores one JSON document per thread.
//!
//! The export walks two paginated endpoints:
//! - `forums.listThreads` for the threads of the forum
//! - `posts.list` for the posts of each thread
//!
//! While respecting:
//! - the API's request quota, by sleeping a fixed time whenever it is exceeded
//!   and retrying the same request.
//! - an optional minimum interval between requests.
//!
//! Each thread ends up in `<thread-id>.json` as `{"thread": {...}, "posts": [...]}`.
//!
//! ## Example: exporting a forum.
//!
//! ```rust,no_run
//! # type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
//! use disqus_export::{export_forum, Client, Config, Credentials, Interfaces};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let credentials = Credentials {
//!         api_key: "public key".to_string(),
//!         api_secret: "secret key".to_string(),
//!     };
//!     let interfaces = Interfaces::load("interfaces.json").await?;
//!     let client = Client::new(credentials, interfaces, None);
//!
//!     let config = Config::new("myforum", "./export");
//!     export_forum(&client, &config).await?;
//!     Ok(())
//! }
//! ```

/// Client module contains [`Client`] and the [`Api`] capability it implements.
///
/// [`Api`]: crate::client::Api
pub mod client;

/// Settings of an export run.
pub mod config;

/// Contains [`Error`]s that can be thrown by the library.
///
/// [`Error`]: crate::error::Error
pub mod error;

/// The two level thread and post export.
pub mod export;

/// Rate limit aware request execution.
pub mod fetcher;

pub mod interfaces;

/// Cursor driven pagination.
pub mod walker;

pub(crate) mod models;

pub(crate) mod result;

pub use client::{Api, Client, Credentials};
pub use config::Config;
pub use export::export_forum;
pub use fetcher::{Fetcher, RetryPolicy};
pub use interfaces::Interfaces;
pub use models::*;
pub use result::Result;
pub use walker::Walker;
