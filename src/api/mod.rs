pub(crate) mod categories;
pub(crate) mod common;
pub mod cors;
pub(crate) mod posts;
pub(crate) mod products;
pub mod sticky;
