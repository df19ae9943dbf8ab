use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct Username(String);

impl Username {
    pub fn parse(name: String) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Username cannot be empty".into());
        }

        if !(3..=30).contains(&name.graphemes(true).count()) {
            return Err("Username must be between 3 and 30 characters".into());
        }

        const FORBIDDEN_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        if name.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
            return Err("Username contains forbidden characters".into());
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
