#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod api;
pub mod app;
pub mod classify;
pub mod clients;
pub mod config;
pub mod ensemble;
pub mod errors;
pub mod memo;
pub mod observability;
pub mod render;
pub mod service;
pub mod taggers;
