use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: String,
    pub image: String,
    pub back_image: String,
    pub letter_no: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of `POST /uploadLetter`. Missing fields default to empty strings.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsletterPayload {
    pub title: String,
    pub description: String,
    pub date: String,
    pub image: String,
    pub back_image: String,
    pub letter_no: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NewsletterPayload {
    pub fn into_newsletter(self, id: Uuid) -> Newsletter {
        Newsletter {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            image: self.image,
            back_image: self.back_image,
            letter_no: self.letter_no,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsletterFilter {
    pub letter_no: Option<String>,
    pub kind: Option<String>,
}

impl NewsletterFilter {
    pub fn accepts(&self, newsletter: &Newsletter) -> bool {
        self.letter_no
            .as_ref()
            .map_or(true, |letter_no| *letter_no == newsletter.letter_no)
            && self
                .kind
                .as_ref()
                .map_or(true, |kind| *kind == newsletter.kind)
    }
}
