pub mod client;
pub mod error;
pub mod favorite;
pub mod host;
pub mod popup;
pub mod types;

#[cfg(test)]
pub(crate) mod testkit;
