mod image;
pub use self::image::*;
pub mod classifier;
pub use classifier::{Classification, StatCache, StatClassifier};
pub mod guard;
pub use guard::{GuardMode, MenuGuard};
mod layout;
pub use layout::*;
mod ocr;
pub use ocr::{Ocr, TextLine, TextRecognizer, best_text};
pub mod pipeline;
pub use pipeline::{LookupPipeline, PipelineConfig, RecognitionResult};
mod sampler;
pub use sampler::*;
pub mod signature;
pub use signature::Signature;
