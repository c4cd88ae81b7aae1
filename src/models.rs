pub mod achievements;
pub mod budgets;
pub mod categories;
pub mod transactions;
pub mod users;
pub mod wallets;
