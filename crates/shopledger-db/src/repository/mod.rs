//! # Repository Implementations
//!
//! One repository per aggregate. Each owns a pool clone and exposes async
//! operations; every query filters by the caller's organization id so no
//! operation can read or write across tenants.
//!
//! - [`organization`] - tenant lookup (supplies the tax jurisdiction)
//! - [`location`] - sale points
//! - [`customer`] - customers and their geography
//! - [`product`] - catalog plus the per-location stock ledger
//! - [`tax_rule`] - time-bounded tax rules and active-rate resolution
//! - [`sale`] - the sale transaction engine
//! - [`expense`] - operating expenses
//! - [`analytics`] - the aggregation engine

pub mod analytics;
pub mod customer;
pub mod expense;
pub mod location;
pub mod organization;
pub mod product;
pub mod sale;
pub mod tax_rule;
