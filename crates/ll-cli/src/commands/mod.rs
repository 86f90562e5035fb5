//! CLI command implementations

pub(crate) mod common;
pub(crate) mod ledger;
pub(crate) mod migrate;
pub(crate) mod status;
