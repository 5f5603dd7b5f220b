use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::decoder::RecordDecoder;
use crate::application::errors::PipelineError;
use crate::application::materializer::ImageMaterializer;
use crate::application::pipeline::{ArchiveJob, RunSummary};
use crate::application::ports::{Dimensions, ImageEncoder, LabelLookup, NoLabels, StagingStore};
use crate::application::use_cases::BuildDatasetUseCase;
use crate::config::{Config, StagingBackend};
use crate::domain::{ArchiveSet, RecordLayout};
use crate::infrastructure::imaging::PngImageEncoder;
use crate::infrastructure::labels::TableLabelLookup;
use crate::infrastructure::staging::{MemoryStagingStore, DiskStagingStore};

/// Wires a dataset run from [`Config`]: layout, archive set, label table,
/// encoder and staging backend.
pub struct DatasetBuilder {
    config: Config,
    layout: Option<RecordLayout>,
    archive_set: Option<ArchiveSet>,
    labels: Option<Arc<dyn LabelLookup>>,
    encoder: Option<Arc<dyn ImageEncoder>>,
}

impl DatasetBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            layout: None,
            archive_set: None,
            labels: None,
            encoder: None,
        }
    }

    /// Use a non-standard layout instead of the format's built-in one
    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Use a custom file distribution instead of the format's built-in one
    pub fn with_archive_set(mut self, set: ArchiveSet) -> Self {
        self.archive_set = Some(set);
        self
    }

    pub fn with_labels(mut self, labels: Arc<dyn LabelLookup>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Resolve every collaborator; fails on unsupported formats or an
    /// unreadable label table.
    pub fn build(self) -> Result<DatasetRun, PipelineError> {
        let config = self.config;

        let layout = match self.layout {
            Some(layout) => layout,
            None => RecordLayout::for_format(config.format)?.clone(),
        };
        let archive_set = match self.archive_set {
            Some(set) => set,
            None => ArchiveSet::for_format(config.format)?,
        };

        let labels: Arc<dyn LabelLookup> = match (self.labels, &config.label_table) {
            (Some(labels), _) => labels,
            (None, Some(path)) => Arc::new(
                TableLabelLookup::load(path).map_err(|e| PipelineError::Config(e.to_string()))?,
            ),
            (None, None) => Arc::new(NoLabels),
        };
        let encoder: Arc<dyn ImageEncoder> = self
            .encoder
            .unwrap_or_else(|| Arc::new(PngImageEncoder::with_durability(config.durable_writes)));

        let native = Dimensions::new(layout.sample_width(), layout.sample_height());
        let output_size = config.output_size(native);
        let decoder = Arc::new(RecordDecoder::new(layout, labels));
        let materializer = Arc::new(ImageMaterializer::new(
            encoder,
            config.output_dir.clone(),
            output_size,
        ));

        let use_case = BuildDatasetUseCase::new(decoder, materializer, config.pipeline_config());
        let jobs = ArchiveJob::from_set(&archive_set, &config.input_dir);

        info!(
            "Dataset run prepared: format {}, {} archives, images {} -> {}",
            config.format,
            jobs.len(),
            native,
            output_size
        );

        Ok(DatasetRun {
            use_case,
            jobs,
            expected_total: archive_set.expected_total(),
            manifest_path: config.manifest_path(),
            staging_dir: config.staging_dir(),
            staging_backend: config.staging_backend,
            durable_writes: config.durable_writes,
        })
    }
}

/// A fully wired run, ready to execute
pub struct DatasetRun {
    use_case: BuildDatasetUseCase,
    jobs: Vec<ArchiveJob>,
    expected_total: usize,
    manifest_path: PathBuf,
    staging_dir: PathBuf,
    staging_backend: StagingBackend,
    durable_writes: bool,
}

impl DatasetRun {
    pub fn jobs(&self) -> &[ArchiveJob] {
        &self.jobs
    }

    pub fn expected_total(&self) -> usize {
        self.expected_total
    }

    pub fn manifest_path(&self) -> &std::path::Path {
        &self.manifest_path
    }

    pub fn staging_dir(&self) -> &std::path::Path {
        &self.staging_dir
    }

    fn open_staging(&self) -> Result<Box<dyn StagingStore>, PipelineError> {
        Ok(match self.staging_backend {
            StagingBackend::Memory => Box::new(MemoryStagingStore::new()),
            StagingBackend::Disk => Box::new(
                DiskStagingStore::create(&self.staging_dir)?
                    .with_durability(self.durable_writes),
            ),
        })
    }

    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let staging = self.open_staging()?;
        info!(
            "Staging backend {} for {} expected records",
            self.staging_backend, self.expected_total
        );
        self.use_case
            .execute(
                self.jobs,
                staging,
                &self.manifest_path,
                Some(self.expected_total),
            )
            .await
    }
}
