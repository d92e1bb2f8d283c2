// ── Wire-to-domain conversions ──
//
// Bulk-fetch records become replica entries verbatim: the property
// dictionary is the domain representation, only the identity is lifted
// into `ObjectPath`.

use connwatch_bus::ObjectRecord;

use crate::model::{ObjectPath, ServiceEntry, TechnologyEntry};

impl From<ObjectRecord> for ServiceEntry {
    fn from(record: ObjectRecord) -> Self {
        ServiceEntry::new(ObjectPath::new(record.path), record.properties)
    }
}

impl From<ObjectRecord> for TechnologyEntry {
    fn from(record: ObjectRecord) -> Self {
        TechnologyEntry::new(ObjectPath::new(record.path), record.properties)
    }
}
