mod fetch;
mod http;

pub use fetch::{Error, Fetch, HttpFetch, load_buildings, load_buildings_in_tiles};
pub use http::{HeaderValue, HttpOptions, MaxParallelDownloads};
