pub mod part;
pub mod sale;
pub mod sale_item;
pub mod stock_location;
pub mod transfer;
pub mod transfer_event;
