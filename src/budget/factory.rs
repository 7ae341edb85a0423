//! Resolves the budget a journal should be assigned to.

use rusqlite::Connection;

use crate::{
    Error, UserID,
    budget::{Budget, find_budget, find_budget_by_name},
    database_id::BudgetId,
};

/// Finds a user's budget from an optional ID and an optional name.
#[derive(Debug, Clone, Copy)]
pub struct BudgetFactory<'a> {
    connection: &'a Connection,
    user_id: UserID,
}

impl<'a> BudgetFactory<'a> {
    /// Look up the budgets of `user_id`.
    pub fn new(connection: &'a Connection, user_id: UserID) -> Self {
        Self {
            connection,
            user_id,
        }
    }

    /// Find a budget by `id` first and by `name` second.
    ///
    /// A positive `id` of one of the user's budgets wins. Otherwise a
    /// non-empty `name` is looked up. Returns `None` if neither matches, a
    /// budget is never created.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    pub fn find(&self, id: Option<BudgetId>, name: Option<&str>) -> Result<Option<Budget>, Error> {
        if let Some(id) = id.filter(|&id| id > 0)
            && let Some(budget) = find_budget(self.user_id, id, self.connection)?
        {
            return Ok(Some(budget));
        }

        match name.filter(|name| !name.is_empty()) {
            Some(name) => find_budget_by_name(self.user_id, name, self.connection),
            None => Ok(None),
        }
    }
}
