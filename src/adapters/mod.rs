pub mod api;
pub mod db;
pub mod reading_csv;
