pub mod accessor;
pub mod modal;

pub use accessor::{Accessor, Column};
pub use modal::{SelectModal, SelectModalConfig, SelectRow, SelectView};
