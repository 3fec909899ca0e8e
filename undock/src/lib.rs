pub mod containers;
pub mod down;
pub mod error;
pub mod loader;
pub mod ordering;
pub mod progress;
pub mod reconstruct;

pub use containers::Containers;
pub use down::{TearDown, TearDownOptions};
pub use error::TearDownError;
pub use loader::{LoadProjectError, ProjectLoader, YamlProjectLoader};
pub use progress::{Event, EventSink, EventStatus, RecordingEventSink, TracingEventSink};
