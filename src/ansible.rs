/// Adapters around the `ansible-playbook` entry point.

/// Inventory files for boxes.
pub mod inventory;

/// Command line options record.
pub mod options;

/// Ad-hoc single play documents.
pub mod play;

/// Process spawning and result reporting.
pub mod runner;

pub use inventory::{generate_inventory, Inventory};
pub use options::PlaybookOptions;
pub use play::{playbook_tags, Play};
pub use runner::{Interrupted, PlaybookRunner};
