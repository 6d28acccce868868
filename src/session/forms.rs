use crate::api::validation::{validate_email, validate_new_password, validate_username};

/// Everything the registration screen collects.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
}

impl RegistrationForm {
    /// Check the form before anything is sent. Returns the first problem
    /// found, password problems first.
    pub fn validate(&self) -> Result<(), String> {
        validate_new_password(&self.password, &self.confirm_password)?;
        validate_email(&self.email)?;
        validate_username(&self.username)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            email: "jane@example.com".to_string(),
            username: "jane".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            full_name: String::new(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn test_first_problem_reported() {
        let mut form = filled();
        form.email = "not-an-email".to_string();
        form.confirm_password = "secret2".to_string();
        assert_eq!(form.validate().unwrap_err(), "Passwords do not match");

        form.password = "abc".to_string();
        form.confirm_password = "abc".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            "Password must be at least 6 characters"
        );

        form.password = "secret1".to_string();
        form.confirm_password = "secret1".to_string();
        assert_eq!(form.validate().unwrap_err(), "Invalid email address");
    }
}
