mod caching;
mod errors;
mod facets;
mod listing;
mod paging;
mod search;
