//! Client-side synchronization core for a remotely stored todo list.
//!
//! [`TodoController`] owns the state and applies optimistic edits;
//! [`RecordGateway`] talks to the store; [`view`] derives what is shown.

pub mod controller;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod query;
pub mod reducer;
pub mod view;

pub use controller::TodoController;
pub use debounce::{Debouncer, QueryDebouncer, QUERY_DEBOUNCE};
pub use error::SyncError;
pub use gateway::{table_url, HttpRecordGateway, RecordGateway, DEFAULT_API_ROOT};
pub use query::{encode, ListQuery};
pub use reducer::{reduce, Action, SyncState};
pub use view::{ListView, PageRoute, Pager, ITEMS_PER_PAGE};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
