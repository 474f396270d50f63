pub mod markup;
pub mod panels;
pub mod plot;
pub mod table;
