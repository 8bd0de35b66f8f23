// ABOUTME: Entity rows with record numbers, archive operations, and child records
// ABOUTME: Creation allocates the display number inside the same insert transaction

pub mod storage;
pub mod types;

pub use storage::{
    archive_on, complete_cleanup_tasks_on, delete_children_on, get_record_on, hard_delete_on,
    insert_note_on, schedule_cleanup_on, EntityStore,
};
pub use types::{
    CrmTask, Document, DocumentCreateInput, EntityRecord, HiringManager,
    HiringManagerCreateInput, HistoryEntry, Job, JobCreateInput, JobSeeker, JobSeekerCreateInput,
    Lead, LeadCreateInput, Note, Organization, OrganizationCreateInput, Placement,
    PlacementCreateInput, TaskCreateInput,
};
