pub mod articles;
pub mod digest;
pub mod fetching;
pub mod summary;
