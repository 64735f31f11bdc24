pub use books::Book;
pub use categories::Category;
pub use commands::{NewBookCmd, NewFineCmd};
pub use error::EngineError;
pub use fines::Fine;
pub use ops::{Engine, EngineBuilder, LOAN_PERIOD_DAYS, LedgerListFilter};
pub use requests::{BookRequest, RequestStatus};
pub use transactions::{Transaction, TransactionKind};
pub use users::Role;

mod books;
mod categories;
mod commands;
mod error;
mod fines;
mod ops;
mod requests;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
