pub mod descriptions;
pub mod items;
pub mod purchases;
pub mod synergy;
pub mod timeline;
