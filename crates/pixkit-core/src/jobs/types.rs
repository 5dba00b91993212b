use crate::gateway::{DatasetMeta, ImageMeta};

/// Job stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStage {
    Resolving,
    Planes,
    Linking,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolving => write!(f, "Resolving objects"),
            Self::Planes => write!(f, "Writing planes"),
            Self::Linking => write!(f, "Linking"),
        }
    }
}

/// Progress reporting for the jobs.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (e.g., plane count), if known.
    fn begin_stage(&self, _stage: JobStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Result of the channel-offsets job.
#[derive(Clone, Debug, Default)]
pub struct OffsetsOutcome {
    pub message: String,
    pub images: Vec<ImageMeta>,
    pub new_dataset: Option<DatasetMeta>,
}

impl OffsetsOutcome {
    /// The created image, reported only when exactly one was made.
    pub fn image(&self) -> Option<&ImageMeta> {
        match self.images.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }
}

/// Result of the images-from-ROIs job.
#[derive(Clone, Debug, Default)]
pub struct RoisOutcome {
    pub message: String,
    pub images: Vec<ImageMeta>,
    pub datasets: Vec<DatasetMeta>,
    pub links: usize,
    pub elapsed_secs: f64,
}

impl RoisOutcome {
    /// First created image.
    pub fn result(&self) -> Option<&ImageMeta> {
        self.images.first()
    }
}
