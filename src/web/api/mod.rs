pub mod error;
pub mod fixes;
pub mod track;
