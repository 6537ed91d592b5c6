pub use super::action_items::Entity as ActionItems;
pub use super::meetings::Entity as Meetings;
pub use super::mind_maps::Entity as MindMaps;
pub use super::participants::Entity as Participants;
pub use super::recordings::Entity as Recordings;
pub use super::transcripts::Entity as Transcripts;
pub use super::users::Entity as Users;
