//! Input data: loaded members, the user-editable identity model, and its
//! import/export document.

mod document;
mod identity;
mod member;

pub use document::{
    export_document, from_json_str, normalize, to_json, DocumentStatistics, MarkDocument,
    DOCUMENT_VERSION,
};
pub use identity::{Circle, CircleId, Group, GroupId, IdentityModel};
pub use member::{merge_profiles, Member, MemberId, MemberTable, MergeReport, ProfileRecord, RelationRef};
