use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::ValidateEmail;

use crate::{CoreError, CoreResult};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const AGE_MIN: i64 = 1;
pub const AGE_MAX: i64 = 120;
pub const EMAIL_MAX_CHARS: usize = 255;

// dotted domain ending in an alphabetic TLD; no IP literals
static EMAIL_SHAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$").ok()
});

fn is_valid_email(email: &str) -> bool {
    email.validate_email()
        && !email.starts_with('.')
        && !email.contains("..")
        && EMAIL_SHAPE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Passenger details as submitted on the booking form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassengerInput {
    pub name: String,
    pub age: i64,
    pub email: String,
}

/// Passenger details that passed [`validate_passenger`], trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPassenger {
    name: String,
    age: i32,
    email: String,
}

impl ValidatedPassenger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Checks name, then age, then email, and reports only the first rule broken.
pub fn validate_passenger(input: &PassengerInput) -> CoreResult<ValidatedPassenger> {
    let name = input.name.trim();
    let email = input.email.trim();

    let name_len = name.chars().count();
    if name_len < NAME_MIN_CHARS {
        return Err(invalid(format!("Name must be at least {} characters", NAME_MIN_CHARS)));
    }
    if name_len > NAME_MAX_CHARS {
        return Err(invalid(format!("Name must be at most {} characters", NAME_MAX_CHARS)));
    }

    if input.age < AGE_MIN {
        return Err(invalid(format!("Age must be at least {}", AGE_MIN)));
    }
    if input.age > AGE_MAX {
        return Err(invalid(format!("Age must be at most {}", AGE_MAX)));
    }

    if !is_valid_email(email) {
        return Err(invalid("Invalid email address".to_string()));
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(invalid(format!("Email must be at most {} characters", EMAIL_MAX_CHARS)));
    }

    Ok(ValidatedPassenger {
        name: name.to_string(),
        // bounded by AGE_MAX above
        age: input.age as i32,
        email: email.to_string(),
    })
}

fn invalid(message: String) -> CoreError {
    CoreError::Validation(message)
}
