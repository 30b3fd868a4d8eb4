mod user_row;

pub use user_row::UserRow;
