pub mod embedded;
pub mod post;
pub mod profile;
pub mod user;

pub use embedded::{EmbeddedList, Keyed};
pub use post::{Comment, Like, Post};
pub use profile::{EducationEntry, ExperienceEntry, Profile, ProfileView, Social};
pub use user::{User, UserSummary, UserView};
