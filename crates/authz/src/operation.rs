use std::fmt;

use crate::{
    error::AuthError,
    role::{Identity, Role},
};

const LIBRARIAN_ONLY: &[Role] = &[Role::Librarian];
const MEMBER_ONLY: &[Role] = &[Role::Member];
const EVERYONE: &[Role] = &[Role::Librarian, Role::Member];

/// Every role-gated operation the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddBook,
    ListBooks,
    GetBook,
    UpdateBook,
    DeleteBook,
    AddUser,
    ListUsers,
    GetUser,
    UpdateUser,
    DeleteUser,
    DeleteOwnAccount,
    Borrow,
    Return,
    ListBorrowed,
    History,
}

impl Operation {
    /// Roles permitted to perform this operation.
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::AddBook
            | Operation::UpdateBook
            | Operation::DeleteBook
            | Operation::AddUser
            | Operation::ListUsers
            | Operation::UpdateUser
            | Operation::DeleteUser => LIBRARIAN_ONLY,
            Operation::ListBooks | Operation::GetBook | Operation::GetUser => EVERYONE,
            Operation::DeleteOwnAccount
            | Operation::Borrow
            | Operation::Return
            | Operation::ListBorrowed
            | Operation::History => MEMBER_ONLY,
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Operation::AddBook => "add books",
            Operation::ListBooks => "list books",
            Operation::GetBook => "view books",
            Operation::UpdateBook => "update books",
            Operation::DeleteBook => "delete books",
            Operation::AddUser => "add users",
            Operation::ListUsers => "list users",
            Operation::GetUser => "view users",
            Operation::UpdateUser => "update users",
            Operation::DeleteUser => "delete users",
            Operation::DeleteOwnAccount => "delete their own account",
            Operation::Borrow => "borrow books",
            Operation::Return => "return books",
            Operation::ListBorrowed => "list borrowed books",
            Operation::History => "view borrowing history",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Single authorization check used by every handler.
pub fn authorize(identity: &Identity, operation: Operation) -> Result<(), AuthError> {
    if operation.allowed_roles().contains(&identity.role) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %identity.id,
        role = %identity.role,
        ?operation,
        "operation denied for role"
    );
    Err(AuthError::Forbidden {
        role: identity.role,
        operation,
    })
}
