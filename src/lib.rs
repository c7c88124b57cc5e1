//! Multi-tenant personal training studio backend.
//!
//! Studios (organizations) manage trainers, clients, prepaid session
//! packages, session logging, payments and tiered trainer commission.

pub mod commission;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod text_enum;
