//! The closed set of CSL item types.

use crate::error::{CslError, Result};
use crate::schema::{self, SchemaKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CSL item type.
///
/// There is no dedicated software type in CSL 1.0; package registries are
/// cited as [`CslType::Webpage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum CslType {
    Article,
    ArticleJournal,
    ArticleMagazine,
    ArticleNewspaper,
    Bill,
    Book,
    Broadcast,
    Chapter,
    Dataset,
    Entry,
    EntryDictionary,
    EntryEncyclopedia,
    Figure,
    Graphic,
    Interview,
    LegalCase,
    Legislation,
    Manuscript,
    Map,
    MotionPicture,
    MusicalScore,
    Pamphlet,
    PaperConference,
    Patent,
    PersonalCommunication,
    Post,
    PostWeblog,
    Report,
    Review,
    ReviewBook,
    Song,
    Speech,
    Thesis,
    Treaty,
    Webpage,
}

impl CslType {
    /// Every type, in schema order.
    pub const ALL: [CslType; 35] = [
        CslType::Article,
        CslType::ArticleJournal,
        CslType::ArticleMagazine,
        CslType::ArticleNewspaper,
        CslType::Bill,
        CslType::Book,
        CslType::Broadcast,
        CslType::Chapter,
        CslType::Dataset,
        CslType::Entry,
        CslType::EntryDictionary,
        CslType::EntryEncyclopedia,
        CslType::Figure,
        CslType::Graphic,
        CslType::Interview,
        CslType::LegalCase,
        CslType::Legislation,
        CslType::Manuscript,
        CslType::Map,
        CslType::MotionPicture,
        CslType::MusicalScore,
        CslType::Pamphlet,
        CslType::PaperConference,
        CslType::Patent,
        CslType::PersonalCommunication,
        CslType::Post,
        CslType::PostWeblog,
        CslType::Report,
        CslType::Review,
        CslType::ReviewBook,
        CslType::Song,
        CslType::Speech,
        CslType::Thesis,
        CslType::Treaty,
        CslType::Webpage,
    ];

    /// The external tag, as written in CSL-JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            CslType::Article => "article",
            CslType::ArticleJournal => "article-journal",
            CslType::ArticleMagazine => "article-magazine",
            CslType::ArticleNewspaper => "article-newspaper",
            CslType::Bill => "bill",
            CslType::Book => "book",
            CslType::Broadcast => "broadcast",
            CslType::Chapter => "chapter",
            CslType::Dataset => "dataset",
            CslType::Entry => "entry",
            CslType::EntryDictionary => "entry-dictionary",
            CslType::EntryEncyclopedia => "entry-encyclopedia",
            CslType::Figure => "figure",
            CslType::Graphic => "graphic",
            CslType::Interview => "interview",
            CslType::LegalCase => "legal_case",
            CslType::Legislation => "legislation",
            CslType::Manuscript => "manuscript",
            CslType::Map => "map",
            CslType::MotionPicture => "motion_picture",
            CslType::MusicalScore => "musical_score",
            CslType::Pamphlet => "pamphlet",
            CslType::PaperConference => "paper-conference",
            CslType::Patent => "patent",
            CslType::PersonalCommunication => "personal_communication",
            CslType::Post => "post",
            CslType::PostWeblog => "post-weblog",
            CslType::Report => "report",
            CslType::Review => "review",
            CslType::ReviewBook => "review-book",
            CslType::Song => "song",
            CslType::Speech => "speech",
            CslType::Thesis => "thesis",
            CslType::Treaty => "treaty",
            CslType::Webpage => "webpage",
        }
    }

    /// Serialize to the external tag, checked against the type schema.
    pub fn to_external(&self) -> Result<serde_json::Value> {
        let out = serde_json::Value::from(self.as_str());
        schema::validate(&out, SchemaKind::Type)?;
        Ok(out)
    }

    /// Parse a type from its external JSON form.
    pub fn from_external(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => s.parse(),
            other => Err(CslError::UnknownType(other.to_string())),
        }
    }
}

impl FromStr for CslType {
    type Err = CslError;

    /// Accepts the external tag, or the underscored spelling the field
    /// mapper produces for hyphenated tags.
    fn from_str(s: &str) -> Result<Self> {
        let external = crate::fields::value_to_external(s);
        CslType::ALL
            .iter()
            .find(|t| t.as_str() == external)
            .copied()
            .ok_or_else(|| CslError::UnknownType(s.to_string()))
    }
}

impl TryFrom<String> for CslType {
    type Error = CslError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CslType> for &'static str {
    fn from(value: CslType) -> Self {
        value.as_str()
    }
}

impl std::fmt::Display for CslType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
