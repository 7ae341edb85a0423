//! Budgets that withdrawals can be assigned to.

mod core;
mod endpoints;
mod factory;

pub use core::{
    Budget, create_budget, create_budget_table, find_budget, find_budget_by_name, get_all_budgets,
};
pub use endpoints::{BudgetState, create_budget_endpoint, get_budget_endpoint, get_budgets_endpoint};
pub use factory::BudgetFactory;
