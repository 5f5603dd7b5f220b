use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FormatTag, ImageName};

/// Metadata-only projection of a decoded record.
///
/// This is what gets staged and emitted in the manifest; it never carries
/// pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub format: FormatTag,
    pub character: String,
    pub image_name: ImageName,
    pub image_width: u32,
    pub image_height: u32,

    pub serial_sheet_number: u16,
    pub jis_character_code: u16,
    pub jis_typical_reading: String,
    pub serial_data_number: u32,
    pub quality_evaluation_of_individual_character_image: u8,
    pub quality_evaluation_of_character_group: u8,
    pub gender_of_writer: u8,
    pub age_of_writer: u8,
    pub industry_classification_code: u16,
    pub occupation_classification_code: u16,
    pub date_of_collection: u16,
    pub date_of_scan: u16,
    pub x_coordinate_of_sample_on_sheet: u8,
    pub y_coordinate_of_sample_on_sheet: u8,
}

/// Record entity - one decoded sample with its transient pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    metadata: RecordMetadata,
    pixels: Option<Vec<u8>>,
}

impl Record {
    pub fn new(metadata: RecordMetadata, pixels: Vec<u8>) -> Self {
        Self {
            metadata,
            pixels: Some(pixels),
        }
    }

    /// Drop the pixel buffer once the image is on disk
    pub fn release_pixels(&mut self) {
        self.pixels = None;
    }

    pub fn has_pixels(&self) -> bool {
        self.pixels.is_some()
    }

    // Getters
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn image_name(&self) -> &ImageName {
        &self.metadata.image_name
    }

    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.metadata.image_width
    }

    pub fn height(&self) -> u32 {
        self.metadata.image_height
    }

    pub fn into_metadata(self) -> RecordMetadata {
        self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ContentHash;

    fn create_test_record() -> Record {
        let pixels = vec![0u8, 16, 32, 48];
        let hash = ContentHash::of(&pixels);
        let metadata = RecordMetadata {
            format: FormatTag::Etl9g,
            character: "あ".to_string(),
            image_name: ImageName::new(FormatTag::Etl9g, 0x2422, &hash),
            image_width: 2,
            image_height: 2,
            serial_sheet_number: 1,
            jis_character_code: 0x2422,
            jis_typical_reading: "A".to_string(),
            serial_data_number: 7,
            quality_evaluation_of_individual_character_image: 0,
            quality_evaluation_of_character_group: 0,
            gender_of_writer: 1,
            age_of_writer: 20,
            industry_classification_code: 0,
            occupation_classification_code: 0,
            date_of_collection: 7707,
            date_of_scan: 7708,
            x_coordinate_of_sample_on_sheet: 3,
            y_coordinate_of_sample_on_sheet: 4,
        };
        Record::new(metadata, pixels)
    }

    #[test]
    fn test_release_pixels() {
        let mut record = create_test_record();
        assert!(record.has_pixels());
        record.release_pixels();
        assert!(!record.has_pixels());
        assert!(record.pixels().is_none());
    }

    #[test]
    fn test_metadata_serializes_without_pixels() {
        let record = create_test_record();
        let json = serde_json::to_value(record.metadata()).unwrap();
        assert_eq!(json["format"], "9g");
        assert_eq!(json["jis_character_code"], 0x2422);
        assert!(json.get("pixels").is_none());
        assert!(json["image_name"]
            .as_str()
            .unwrap()
            .starts_with("ETL9G_0x2422_"));
    }

    #[test]
    fn test_metadata_round_trip() {
        let record = create_test_record();
        let bytes = serde_json::to_vec(record.metadata()).unwrap();
        let back: RecordMetadata = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(&back, record.metadata());
    }
}
