//! Clients for services outside our own database.

pub mod thirdparty;
