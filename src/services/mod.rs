pub mod catalog;
pub mod classifier;
pub mod ledger;
pub mod sales;
pub mod transfers;
