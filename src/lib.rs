mod batch;
mod error;
mod exporter;
mod midi_importer;
mod model;
mod util;

pub use batch::*;
pub use error::*;
pub use exporter::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::progression::*;
pub use util::*;
