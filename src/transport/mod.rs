//! Transport layers carrying bridge commands and events

pub mod unix_socket;
