//! Admin console for scheduled batch job records kept by a remote API.

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod form;
pub mod gate;
pub mod html;
pub mod model;
pub mod schema;
pub mod store;
pub mod table;
pub mod web;
