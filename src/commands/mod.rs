pub mod align;
pub mod build;
pub mod inventory;
pub mod link;
pub mod narrators;
pub mod status;
