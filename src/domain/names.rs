//! Name validation shared by commands, arguments and groups.

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};

/// Trim `name` and reject names the token matcher could never produce.
pub fn sanitize_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
            reason: "name contains whitespace".to_string(),
        });
    }
    if trimmed.contains('=') {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
            reason: "name contains '='".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Sanitize `names` and append them to `existing`, rejecting repeats.
pub fn push_names<I, S>(existing: &mut Vec<String>, names: I, owner: &str) -> DomainResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for name in names {
        let name = sanitize_name(name.as_ref())?;
        if existing.contains(&name) {
            return Err(DomainError::DuplicateName {
                name,
                owner: owner.to_string(),
            });
        }
        existing.push(name);
    }
    Ok(())
}

/// First name present in both lists.
pub fn first_shared<'a>(left: &'a [String], right: &[String]) -> Option<&'a String> {
    left.iter().find(|n| right.contains(n))
}

/// First name that appears more than once.
pub fn first_duplicate(names: &[String]) -> Option<&String> {
    names.iter().duplicates().next()
}
