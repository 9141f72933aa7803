use serde::Deserialize;

pub const NO_CONTENT: &str = "No content available";
pub const EXTRACTION_FAILED: &str = "AI extraction failed";

/// Output column order.
pub const COLUMNS: [&str; 7] = [
    "Website",
    "Mission Statement",
    "Products or Services",
    "Founded",
    "Headquarters",
    "Key Executives",
    "Notable Awards",
];

/// The six company facts, decoded strictly from the model's JSON reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyFacts {
    pub mission_statement: String,
    pub products_or_services: String,
    pub founded: String,
    pub headquarters: String,
    pub key_executives: String,
    pub notable_awards: String,
}

impl CompanyFacts {
    pub const KEYS: [&'static str; 6] = [
        "mission_statement",
        "products_or_services",
        "founded",
        "headquarters",
        "key_executives",
        "notable_awards",
    ];

    pub fn filled(value: &str) -> Self {
        CompanyFacts {
            mission_statement: value.to_string(),
            products_or_services: value.to_string(),
            founded: value.to_string(),
            headquarters: value.to_string(),
            key_executives: value.to_string(),
            notable_awards: value.to_string(),
        }
    }

    pub fn no_content() -> Self {
        Self::filled(NO_CONTENT)
    }

    pub fn failed() -> Self {
        Self::filled(EXTRACTION_FAILED)
    }

    pub fn fields(&self) -> [&str; 6] {
        [
            self.mission_statement.as_str(),
            self.products_or_services.as_str(),
            self.founded.as_str(),
            self.headquarters.as_str(),
            self.key_executives.as_str(),
            self.notable_awards.as_str(),
        ]
    }
}

/// One output row: the site plus its six facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    pub website: String,
    pub facts: CompanyFacts,
}

impl ExtractionRecord {
    pub fn new(website: &str, facts: CompanyFacts) -> Self {
        ExtractionRecord {
            website: website.to_string(),
            facts,
        }
    }

    pub fn to_row(&self) -> [&str; 7] {
        let f = self.facts.fields();
        [self.website.as_str(), f[0], f[1], f[2], f[3], f[4], f[5]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_records_fill_every_field() {
        assert!(CompanyFacts::no_content().fields().iter().all(|f| *f == NO_CONTENT));
        assert!(CompanyFacts::failed().fields().iter().all(|f| *f == EXTRACTION_FAILED));
    }

    #[test]
    fn row_follows_column_order() {
        let facts = CompanyFacts {
            mission_statement: "m".into(),
            products_or_services: "p".into(),
            founded: "f".into(),
            headquarters: "h".into(),
            key_executives: "k".into(),
            notable_awards: "n".into(),
        };
        let rec = ExtractionRecord::new("https://acme.com", facts);
        assert_eq!(rec.to_row(), ["https://acme.com", "m", "p", "f", "h", "k", "n"]);
        assert_eq!(rec.to_row().len(), COLUMNS.len());
    }
}
