//! Id sequence model.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Sequence name for drone ids.
pub const DRONE_SEQUENCE: &str = "drone";
/// Sequence name for medication ids.
pub const MEDICATION_SEQUENCE: &str = "medication";

/// Last id handed out for one record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Primary key - sequence name.
    #[primary_key]
    pub name: String,
    /// Last assigned id; the first id is 1.
    pub last: u64,
}
