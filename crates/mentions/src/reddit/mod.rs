//! Reddit source: OAuth, keyword search and comment threads.

mod auth;
mod client;
mod types;

pub use auth::AccessToken;
pub use client::{RedditClient, RedditEndpoints};
pub use types::{CommentData, LinkData, Listing, Thing};
