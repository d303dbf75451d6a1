pub mod connection;
pub mod list;
pub mod selection;
pub mod sync;
