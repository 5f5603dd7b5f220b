use serde::{Deserialize, Serialize};

/// Archive family of the handwriting collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    #[serde(rename = "1")]
    Etl1,
    #[serde(rename = "2")]
    Etl2,
    #[serde(rename = "3")]
    Etl3,
    #[serde(rename = "4")]
    Etl4,
    #[serde(rename = "5")]
    Etl5,
    #[serde(rename = "6")]
    Etl6,
    #[serde(rename = "7")]
    Etl7,
    #[serde(rename = "8b")]
    Etl8b,
    #[serde(rename = "8g")]
    Etl8g,
    #[serde(rename = "9b")]
    Etl9b,
    #[serde(rename = "9g")]
    Etl9g,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Etl1 => "1",
            FormatTag::Etl2 => "2",
            FormatTag::Etl3 => "3",
            FormatTag::Etl4 => "4",
            FormatTag::Etl5 => "5",
            FormatTag::Etl6 => "6",
            FormatTag::Etl7 => "7",
            FormatTag::Etl8b => "8b",
            FormatTag::Etl8g => "8g",
            FormatTag::Etl9b => "9b",
            FormatTag::Etl9g => "9g",
        }
    }

    /// File stem prefix used by the distributed archives, e.g. `ETL9G`
    pub fn file_prefix(&self) -> String {
        format!("ETL{}", self.as_str().to_uppercase())
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_prefix("etl").unwrap_or(&normalized);
        match normalized {
            "1" => Ok(FormatTag::Etl1),
            "2" => Ok(FormatTag::Etl2),
            "3" => Ok(FormatTag::Etl3),
            "4" => Ok(FormatTag::Etl4),
            "5" => Ok(FormatTag::Etl5),
            "6" => Ok(FormatTag::Etl6),
            "7" => Ok(FormatTag::Etl7),
            "8b" => Ok(FormatTag::Etl8b),
            "8g" => Ok(FormatTag::Etl8g),
            "9b" => Ok(FormatTag::Etl9b),
            "9g" => Ok(FormatTag::Etl9g),
            _ => Err(format!("Invalid archive format: {}", s)),
        }
    }
}
