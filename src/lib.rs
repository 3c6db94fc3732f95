//! Table pipeline for JSON-like rows: search, sort, paginate and select, plus
//! the pieces of the `dtv` terminal viewer built on top of it.

pub mod column;
pub mod debounce;
pub mod domain;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod pagination;
pub mod search;
pub mod selection;
pub mod sort;
pub mod table;
pub mod value;
