pub mod catalog;
pub mod edit;
pub mod images;
pub mod listing;
pub mod procedures;
pub mod shipment;
pub mod stock;
