//! API route modules

pub mod auth;
pub mod companies;
pub mod customers;
pub mod health;
pub mod invoice_items;
pub mod invoices;
pub mod users;
