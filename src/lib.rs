//! Natural-language query assistant for the demo e-commerce store.

pub mod config;
pub mod db;
pub mod llm;
pub mod nlq;
pub mod util;
pub mod web;
