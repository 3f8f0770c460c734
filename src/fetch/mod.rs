// src/fetch/mod.rs
//! Plain HTTP retrieval of listing pages

pub mod page_fetcher;

pub use page_fetcher::{FetchRequest, PageFetcher};
