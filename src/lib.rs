mod analysis;
mod midi_loader;
mod model;
mod util;

pub use analysis::*;
pub use midi_loader::*;
pub use model::config::*;
pub use model::note_name::*;
pub use model::song::*;
pub use util::*;
