pub mod archival;
