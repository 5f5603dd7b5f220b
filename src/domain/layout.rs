//! Static record layout descriptors.
//!
//! A [`RecordLayout`] lists every byte run of one fixed-width record in
//! read order. The decoder is driven entirely by this descriptor, so the
//! two grayscale archive families share one decode path and differ only
//! in their reserved run widths.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::domain::errors::LayoutError;
use crate::domain::value_objects::FormatTag;

/// Semantic metadata fields carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SerialSheetNumber,
    CharacterCode,
    TypicalReading,
    SerialDataNumber,
    QualityIndividual,
    QualityGroup,
    WriterGender,
    WriterAge,
    IndustryCode,
    OccupationCode,
    CollectionDate,
    ScanDate,
    SheetX,
    SheetY,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::SerialSheetNumber => "serial_sheet_number",
            Field::CharacterCode => "jis_character_code",
            Field::TypicalReading => "jis_typical_reading",
            Field::SerialDataNumber => "serial_data_number",
            Field::QualityIndividual => "quality_evaluation_of_individual_character_image",
            Field::QualityGroup => "quality_evaluation_of_character_group",
            Field::WriterGender => "gender_of_writer",
            Field::WriterAge => "age_of_writer",
            Field::IndustryCode => "industry_classification_code",
            Field::OccupationCode => "occupation_classification_code",
            Field::CollectionDate => "date_of_collection",
            Field::ScanDate => "date_of_scan",
            Field::SheetX => "x_coordinate_of_sample_on_sheet",
            Field::SheetY => "y_coordinate_of_sample_on_sheet",
        }
    }
}

/// How the bytes of one run are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Big-endian unsigned integer of 1, 2 or 4 bytes
    Unsigned(Field),
    /// Fixed-width text, whitespace-trimmed after extraction
    Text(Field),
    /// Reserved or undefined bytes, consumed and discarded
    Reserved,
    /// Packed 4-bit sample
    Pixels,
}

/// One byte run of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
}

/// Immutable per-format record descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    format: FormatTag,
    record_size: usize,
    sample_width: u32,
    sample_height: u32,
    fields: Vec<FieldSpec>,
}

static ETL8G_LAYOUT: Lazy<Result<RecordLayout, LayoutError>> = Lazy::new(|| {
    grayscale_sheet_layout(FormatTag::Etl8g)
        .reserved("undefined", 30)
        .pixels()
        .reserved("uncertain", 11)
        .build(8199)
});

static ETL9G_LAYOUT: Lazy<Result<RecordLayout, LayoutError>> = Lazy::new(|| {
    grayscale_sheet_layout(FormatTag::Etl9g)
        .reserved("undefined", 34)
        .pixels()
        .reserved("uncertain", 7)
        .build(8199)
});

/// Common 30-byte header shared by the 128x127 grayscale families
fn grayscale_sheet_layout(format: FormatTag) -> LayoutBuilder {
    RecordLayout::builder(format, 128, 127)
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
}

impl RecordLayout {
    pub fn builder(format: FormatTag, sample_width: u32, sample_height: u32) -> LayoutBuilder {
        LayoutBuilder {
            format,
            sample_width,
            sample_height,
            runs: Vec::new(),
        }
    }

    /// Built-in layout for an archive family
    pub fn for_format(format: FormatTag) -> Result<&'static RecordLayout, LayoutError> {
        let layout = match format {
            FormatTag::Etl8g => &*ETL8G_LAYOUT,
            FormatTag::Etl9g => &*ETL9G_LAYOUT,
            other => return Err(LayoutError::UnsupportedFormat(other.to_string())),
        };
        layout.as_ref().map_err(Clone::clone)
    }

    pub fn format(&self) -> FormatTag {
        self.format
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn sample_width(&self) -> u32 {
        self.sample_width
    }

    pub fn sample_height(&self) -> u32 {
        self.sample_height
    }

    pub fn sample_pixel_count(&self) -> usize {
        self.sample_width as usize * self.sample_height as usize
    }

    /// Packed bytes of the sample: two pixels per byte
    pub fn sample_byte_count(&self) -> usize {
        self.sample_pixel_count() / 2
    }

    /// Byte runs in read order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Incremental construction of a [`RecordLayout`]; offsets are assigned
/// in the order runs are added.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    format: FormatTag,
    sample_width: u32,
    sample_height: u32,
    runs: Vec<(&'static str, usize, FieldKind)>,
}

impl LayoutBuilder {
    pub fn unsigned(mut self, field: Field, width: usize) -> Self {
        self.runs.push((field.name(), width, FieldKind::Unsigned(field)));
        self
    }

    pub fn text(mut self, field: Field, width: usize) -> Self {
        self.runs.push((field.name(), width, FieldKind::Text(field)));
        self
    }

    pub fn reserved(mut self, name: &'static str, width: usize) -> Self {
        self.runs.push((name, width, FieldKind::Reserved));
        self
    }

    pub fn pixels(mut self) -> Self {
        let width = (self.sample_width as usize * self.sample_height as usize) / 2;
        self.runs.push(("sample", width, FieldKind::Pixels));
        self
    }

    pub fn build(self, record_size: usize) -> Result<RecordLayout, LayoutError> {
        let pixel_count = self.sample_width as usize * self.sample_height as usize;
        if pixel_count % 2 != 0 {
            return Err(LayoutError::OddPixelCount(pixel_count));
        }

        let pixel_runs: Vec<usize> = self
            .runs
            .iter()
            .filter(|(_, _, kind)| *kind == FieldKind::Pixels)
            .map(|(_, width, _)| *width)
            .collect();
        if pixel_runs.len() != 1 {
            return Err(LayoutError::PixelRunCount(pixel_runs.len()));
        }
        if pixel_runs[0] != pixel_count / 2 {
            return Err(LayoutError::SampleRun {
                width: self.sample_width,
                height: self.sample_height,
                expected: pixel_count / 2,
                actual: pixel_runs[0],
            });
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.runs.len());
        let mut offset = 0usize;
        for (name, width, kind) in self.runs {
            match kind {
                FieldKind::Unsigned(field) => {
                    if !matches!(width, 1 | 2 | 4) {
                        return Err(LayoutError::IntegerWidth {
                            field: field.name(),
                            width,
                        });
                    }
                    if !seen.insert(field) {
                        return Err(LayoutError::DuplicateField {
                            field: field.name(),
                        });
                    }
                }
                FieldKind::Text(field) => {
                    if !seen.insert(field) {
                        return Err(LayoutError::DuplicateField {
                            field: field.name(),
                        });
                    }
                }
                FieldKind::Reserved | FieldKind::Pixels => {}
            }
            fields.push(FieldSpec {
                name,
                offset,
                width,
                kind,
            });
            offset += width;
        }

        if offset != record_size {
            return Err(LayoutError::SizeMismatch {
                declared: record_size,
                actual: offset,
            });
        }

        Ok(RecordLayout {
            format: self.format,
            record_size,
            sample_width: self.sample_width,
            sample_height: self.sample_height,
            fields,
        })
    }
}
