//! Task records and their external representations.
//!
//! - [`TaskCodec`] converts records to and from the engine's JSON export and
//!   builds `key:"value"` arguments for add/modify commands
//! - data-file lines (`[key:"value" ...]`) are handled in [`line`]
//! - [`LoadCommand`] names the record-loading modes

mod codec;
pub mod line;
mod load;
mod record;

pub use codec::{CORE_FIELDS, TaskCodec, core_codec};
pub use line::{escape_entities, unescape_entities};
pub use load::LoadCommand;
pub use record::{Status, TaskRecord};
