//! Form widgets
//!
//! Each widget owns its state outright: user actions mutate it, queries
//! read it back directly, and there is no second copy anywhere that
//! could drift. Handlers are registered one at a time — registering a
//! new one replaces the old.

pub mod checkbox_list;
pub mod string_list;
pub mod table_map;

pub use checkbox_list::{CheckItem, DropDownCheckboxList};
pub use string_list::{StringList, StringListOptions};
pub use table_map::TableMap;
