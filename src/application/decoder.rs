use std::sync::Arc;

use crate::application::ports::LabelLookup;
use crate::domain::codec::{unpack_nibbles, ByteCursor};
use crate::domain::entities::{Record, RecordMetadata};
use crate::domain::errors::FormatError;
use crate::domain::layout::{Field, FieldKind, RecordLayout};
use crate::domain::value_objects::{ContentHash, ImageName};

/// Decodes fixed-width record windows according to a [`RecordLayout`].
///
/// Decoding is pure: the same window always yields the same record, and
/// any underflow fails the whole record.
pub struct RecordDecoder {
    layout: RecordLayout,
    labels: Arc<dyn LabelLookup>,
}

/// Field values gathered while walking the layout
#[derive(Default)]
struct RawFields {
    serial_sheet_number: u16,
    character_code: u16,
    typical_reading: String,
    serial_data_number: u32,
    quality_individual: u8,
    quality_group: u8,
    writer_gender: u8,
    writer_age: u8,
    industry_code: u16,
    occupation_code: u16,
    collection_date: u16,
    scan_date: u16,
    sheet_x: u8,
    sheet_y: u8,
}

impl RawFields {
    // Layout widths are validated to 1, 2 or 4 bytes; narrower targets keep the low bytes.
    fn set_unsigned(&mut self, field: Field, value: u32) {
        match field {
            Field::SerialSheetNumber => self.serial_sheet_number = value as u16,
            Field::CharacterCode => self.character_code = value as u16,
            Field::SerialDataNumber => self.serial_data_number = value,
            Field::QualityIndividual => self.quality_individual = value as u8,
            Field::QualityGroup => self.quality_group = value as u8,
            Field::WriterGender => self.writer_gender = value as u8,
            Field::WriterAge => self.writer_age = value as u8,
            Field::IndustryCode => self.industry_code = value as u16,
            Field::OccupationCode => self.occupation_code = value as u16,
            Field::CollectionDate => self.collection_date = value as u16,
            Field::ScanDate => self.scan_date = value as u16,
            Field::SheetX => self.sheet_x = value as u8,
            Field::SheetY => self.sheet_y = value as u8,
            Field::TypicalReading => {}
        }
    }
}

impl RecordDecoder {
    pub fn new(layout: RecordLayout, labels: Arc<dyn LabelLookup>) -> Self {
        Self { layout, labels }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Decode one record window
    pub fn decode(&self, window: &[u8]) -> Result<Record, FormatError> {
        let mut cursor = ByteCursor::new(window);
        let mut raw = RawFields::default();
        let mut packed: &[u8] = &[];

        for spec in self.layout.fields() {
            match spec.kind {
                FieldKind::Unsigned(field) => {
                    let value = cursor.read_uint_be(spec.name, spec.width)?;
                    raw.set_unsigned(field, value);
                }
                FieldKind::Text(_) => {
                    let bytes = cursor.take(spec.name, spec.width)?;
                    raw.typical_reading = String::from_utf8_lossy(bytes).trim().to_string();
                }
                FieldKind::Reserved => cursor.skip(spec.name, spec.width)?,
                FieldKind::Pixels => packed = cursor.take(spec.name, spec.width)?,
            }
        }

        let pixels = unpack_nibbles(packed, self.layout.sample_byte_count())?;
        let hash = ContentHash::of(&pixels);
        let format = self.layout.format();

        let metadata = RecordMetadata {
            format,
            character: self.labels.label(raw.character_code).unwrap_or_default(),
            image_name: ImageName::new(format, raw.character_code, &hash),
            image_width: self.layout.sample_width(),
            image_height: self.layout.sample_height(),
            serial_sheet_number: raw.serial_sheet_number,
            jis_character_code: raw.character_code,
            jis_typical_reading: raw.typical_reading,
            serial_data_number: raw.serial_data_number,
            quality_evaluation_of_individual_character_image: raw.quality_individual,
            quality_evaluation_of_character_group: raw.quality_group,
            gender_of_writer: raw.writer_gender,
            age_of_writer: raw.writer_age,
            industry_classification_code: raw.industry_code,
            occupation_classification_code: raw.occupation_code,
            date_of_collection: raw.collection_date,
            date_of_scan: raw.scan_date,
            x_coordinate_of_sample_on_sheet: raw.sheet_x,
            y_coordinate_of_sample_on_sheet: raw.sheet_y,
        };

        Ok(Record::new(metadata, pixels))
    }

    /// Decode `count` consecutive records from a whole archive buffer.
    ///
    /// Yields `(record_index, result)`; a buffer that ends early yields
    /// truncation errors for the missing records.
    pub fn records<'a>(
        &'a self,
        archive: &'a [u8],
        count: usize,
    ) -> impl Iterator<Item = (usize, Result<Record, FormatError>)> + 'a {
        let size = self.layout.record_size();
        (0..count).map(move |index| {
            let start = (index * size).min(archive.len());
            let end = (start + size).min(archive.len());
            (index, self.decode(&archive[start..end]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockLabelLookup, NoLabels};
    use crate::domain::value_objects::FormatTag;
    use mockall::predicate::eq;

    /// 4x2 sample layout: 30-byte header, 2 reserved, 4 packed, 1 trailing
    fn small_layout() -> RecordLayout {
        RecordLayout::builder(FormatTag::Etl9g, 4, 2)
            .unsigned(Field::SerialSheetNumber, 2)
            .unsigned(Field::CharacterCode, 2)
            .text(Field::TypicalReading, 8)
            .unsigned(Field::SerialDataNumber, 4)
            .unsigned(Field::QualityIndividual, 1)
            .unsigned(Field::QualityGroup, 1)
            .unsigned(Field::WriterGender, 1)
            .unsigned(Field::WriterAge, 1)
            .unsigned(Field::IndustryCode, 2)
            .unsigned(Field::OccupationCode, 2)
            .unsigned(Field::CollectionDate, 2)
            .unsigned(Field::ScanDate, 2)
            .unsigned(Field::SheetX, 1)
            .unsigned(Field::SheetY, 1)
            .reserved("undefined", 2)
            .pixels()
            .reserved("uncertain", 1)
            .build(37)
            .unwrap()
    }

    fn sample_window() -> Vec<u8> {
        let mut w = Vec::new();
        w.extend_from_slice(&0x0102u16.to_be_bytes());
        w.extend_from_slice(&0x2422u16.to_be_bytes());
        w.extend_from_slice(b" A.I    ");
        w.extend_from_slice(&0x0A0B0C0Du32.to_be_bytes());
        w.extend_from_slice(&[1, 2, 1, 25]);
        w.extend_from_slice(&11u16.to_be_bytes());
        w.extend_from_slice(&12u16.to_be_bytes());
        w.extend_from_slice(&7707u16.to_be_bytes());
        w.extend_from_slice(&7708u16.to_be_bytes());
        w.extend_from_slice(&[5, 6]);
        w.extend_from_slice(&[0xEE, 0xEE]);
        w.extend_from_slice(&[0x01, 0x23, 0x45, 0xF0]);
        w.push(0xEE);
        w
    }

    #[test]
    fn test_decode_all_fields() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let record = decoder.decode(&sample_window()).unwrap();
        let m = record.metadata();

        assert_eq!(m.serial_sheet_number, 0x0102);
        assert_eq!(m.jis_character_code, 0x2422);
        assert_eq!(m.jis_typical_reading, "A.I");
        assert_eq!(m.serial_data_number, 0x0A0B0C0D);
        assert_eq!(m.quality_evaluation_of_individual_character_image, 1);
        assert_eq!(m.quality_evaluation_of_character_group, 2);
        assert_eq!(m.gender_of_writer, 1);
        assert_eq!(m.age_of_writer, 25);
        assert_eq!(m.industry_classification_code, 11);
        assert_eq!(m.occupation_classification_code, 12);
        assert_eq!(m.date_of_collection, 7707);
        assert_eq!(m.date_of_scan, 7708);
        assert_eq!(m.x_coordinate_of_sample_on_sheet, 5);
        assert_eq!(m.y_coordinate_of_sample_on_sheet, 6);
        assert_eq!(m.image_width, 4);
        assert_eq!(m.image_height, 2);
        assert_eq!(m.character, "");

        assert_eq!(
            record.pixels().unwrap(),
            &[0, 16, 32, 48, 64, 80, 240, 0]
        );
    }

    #[test]
    fn test_image_name_uses_pixel_hash() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let record = decoder.decode(&sample_window()).unwrap();
        let hash = ContentHash::of(record.pixels().unwrap());
        assert_eq!(
            record.image_name().as_str(),
            format!("ETL9G_0x2422_{}.png", hash)
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let window = sample_window();
        assert_eq!(decoder.decode(&window).unwrap(), decoder.decode(&window).unwrap());
    }

    #[test]
    fn test_label_lookup_is_consulted() {
        let mut labels = MockLabelLookup::new();
        labels
            .expect_label()
            .with(eq(0x2422u16))
            .times(1)
            .returning(|_| Some("あ".to_string()));

        let decoder = RecordDecoder::new(small_layout(), Arc::new(labels));
        let record = decoder.decode(&sample_window()).unwrap();
        assert_eq!(record.metadata().character, "あ");
    }

    #[test]
    fn test_truncated_window_fails() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let window = sample_window();
        let err = decoder.decode(&window[..window.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                field: "uncertain",
                offset: 36,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_inside_pixel_run() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let window = sample_window();
        let err = decoder.decode(&window[..33]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { field: "sample", .. }));
    }

    #[test]
    fn test_records_reports_missing_tail() {
        let decoder = RecordDecoder::new(small_layout(), Arc::new(NoLabels));
        let mut archive = sample_window();
        archive.extend_from_slice(&sample_window());

        let results: Vec<_> = decoder.records(&archive, 3).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_ok());
        assert_eq!(results[2].0, 2);
        assert!(matches!(
            results[2].1,
            Err(FormatError::Truncated { offset: 0, .. })
        ));
    }
}
