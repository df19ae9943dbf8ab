use validator::validate_email;

#[derive(Debug, Clone)]
pub struct AccountEmail(String);

impl AccountEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        match validate_email(&email) {
            true => Ok(Self(email)),
            false => Err(format!("{} is not a valid email address", email)),
        }
    }
}

impl AsRef<str> for AccountEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
