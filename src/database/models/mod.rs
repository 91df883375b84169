pub mod budget;
pub mod category;
pub mod transaction;

pub use budget::Budget;
pub use category::Category;
pub use transaction::{TransactionKind, TransactionRecord};
